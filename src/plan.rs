//! Version-specific migration data, persisted as YAML.
//!
//! A [`MigrationPlan`] describes one schema generation step: which fields mark
//! a key as migrated, the rows and vocabulary columns to add, the drop-down
//! bindings to wire, and the label and name corrections to apply. The plan for
//! key version 2 ships with the crate; later versions are new YAML files.

use std::{collections::HashSet, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow, ensure};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{data::Scalar, duplicates::RenameEntry, locator::MatchPolicy};

const BUILTIN_V2: &str = include_str!("../config/key_v2.yaml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabNames {
    pub location: String,
    pub profile: String,
    pub units: String,
}

impl Default for TabNames {
    fn default() -> Self {
        Self {
            location: "Location".to_string(),
            profile: "Profile".to_string(),
            units: "Units".to_string(),
        }
    }
}

/// A metadata row appended to the location tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewField {
    pub var: String,
    pub var_long: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Overwrite the column at this letter.
    At(String),
    /// Add after the current last column.
    Append,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyColumn {
    pub name: String,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub placement: Placement,
    pub values: Vec<String>,
}

/// Rows of a tab a validation applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowTarget {
    /// First through last row whose `Var_long` matches the regex.
    Pattern(String),
    /// The row whose `var` equals the name.
    Field(String),
}

impl RowTarget {
    pub fn describe(&self) -> String {
        match self {
            RowTarget::Pattern(pattern) => format!("rows matching '{pattern}'"),
            RowTarget::Field(field) => format!("field '{field}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationBinding {
    pub vocabulary: String,
    pub tab: String,
    pub column: String,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub rows: RowTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCorrection {
    pub tab: String,
    #[serde(default = "default_label_column")]
    pub column: String,
    pub legacy: String,
    pub corrected: String,
    /// Rows whose text matches this regex already say what they mean.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unless: Option<String>,
}

fn default_label_column() -> String {
    crate::workbook::VAR_LONG.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameTables {
    #[serde(default)]
    pub location: Vec<RenameEntry>,
    #[serde(default)]
    pub profile: Vec<RenameEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub font_name: String,
    pub font_size: f64,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            font_name: "Arial".to_string(),
            font_size: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationPlan {
    pub version: String,
    #[serde(default)]
    pub column_policy: MatchPolicy,
    #[serde(default)]
    pub tabs: TabNames,
    /// Location `var` names whose joint presence marks a migrated key.
    /// Defaults to the vars of `new_fields`.
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub new_fields: Vec<NewField>,
    #[serde(default)]
    pub vocabulary: Vec<VocabularyColumn>,
    #[serde(default)]
    pub validations: Vec<ValidationBinding>,
    #[serde(default)]
    pub label_corrections: Vec<LabelCorrection>,
    #[serde(default)]
    pub renames: RenameTables,
    #[serde(default)]
    pub date_fields: Vec<String>,
    #[serde(default)]
    pub presentation: Presentation,
}

impl MigrationPlan {
    /// The plan bundled for key version 2.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_V2).context("Parsing built-in key v2 plan")
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let plan: MigrationPlan = serde_yaml::from_str(raw).context("Parsing plan YAML")?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening plan file {path:?}"))?;
        let reader = BufReader::new(file);
        let plan: MigrationPlan = serde_yaml::from_reader(reader).context("Parsing plan YAML")?;
        plan.validate()
            .with_context(|| format!("Validating plan {path:?}"))?;
        Ok(plan)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating plan file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing plan YAML")
    }

    pub fn required_fields(&self) -> Vec<String> {
        if self.required_fields.is_empty() {
            self.new_fields.iter().map(|f| f.var.clone()).collect()
        } else {
            self.required_fields.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.version.trim().is_empty(), "Plan version cannot be empty");
        ensure!(
            !self.required_fields().is_empty(),
            "Plan must name at least one required field"
        );

        let mut vars = HashSet::new();
        for field in &self.new_fields {
            ensure!(!field.var.trim().is_empty(), "New field var cannot be empty");
            ensure!(
                vars.insert(field.var.as_str()),
                "New field '{}' is declared more than once",
                field.var
            );
        }

        let mut vocab = HashSet::new();
        for column in &self.vocabulary {
            ensure!(
                !column.name.trim().is_empty(),
                "Vocabulary column name cannot be empty"
            );
            ensure!(
                vocab.insert(column.name.as_str()),
                "Vocabulary column '{}' is declared more than once",
                column.name
            );
            ensure!(
                !column.values.is_empty(),
                "Vocabulary column '{}' has no values",
                column.name
            );
            if let Placement::At(letter) = &column.placement {
                crate::locator::column_index(letter).ok_or_else(|| {
                    anyhow!(
                        "Vocabulary column '{}' has invalid position '{letter}'",
                        column.name
                    )
                })?;
            }
        }

        for binding in &self.validations {
            ensure!(
                !binding.vocabulary.trim().is_empty(),
                "Validation on tab '{}' names no vocabulary column",
                binding.tab
            );
            ensure!(
                !binding.column.trim().is_empty(),
                "Validation for '{}' on tab '{}' names no target column",
                binding.vocabulary,
                binding.tab
            );
            if !vocab.contains(binding.vocabulary.as_str()) {
                debug!(
                    "Validation on tab '{}' uses vocabulary column '{}' from the key itself",
                    binding.tab, binding.vocabulary
                );
            }
            if let RowTarget::Pattern(pattern) = &binding.rows {
                regex::Regex::new(pattern)
                    .with_context(|| format!("Validation row pattern '{pattern}'"))?;
            }
        }

        for correction in &self.label_corrections {
            ensure!(
                !correction.legacy.is_empty(),
                "Label correction on tab '{}' has an empty legacy text",
                correction.tab
            );
            if let Some(unless) = &correction.unless {
                regex::Regex::new(unless)
                    .with_context(|| format!("Label correction pattern '{unless}'"))?;
            }
        }

        for entry in &self.renames.profile {
            ensure!(
                entry.level.is_some(),
                "Profile rename for '{}' must name a Level",
                entry.var_long
            );
        }
        for entry in self.renames.location.iter().chain(&self.renames.profile) {
            ensure!(
                !entry.var.trim().is_empty(),
                "Rename for '{}' has an empty target var",
                entry.var_long
            );
        }
        Ok(())
    }
}
