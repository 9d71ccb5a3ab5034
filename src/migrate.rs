//! Staged key-file schema migration.
//!
//! [`Migrator::migrate`] runs the stages in a fixed order over one workbook:
//!
//! 1. version guard (abort when the required fields already exist)
//! 2. archive snapshot of the location and profile tabs
//! 3. vocabulary columns on the units tab
//! 4. new metadata rows on the location tab
//! 5. drop-down validations bound to vocabulary columns
//! 6. label corrections
//! 7. duplicate-name resolution from the rename tables
//! 8. post-condition: `var` unique in location and profile
//! 9. serial-date normalization (failures are logged, not raised)
//! 10. fonts over the current extents of every key tab
//!
//! Every position is derived from the tab as it stands when the stage runs;
//! nothing is cached between stages. The caller persists the workbook only
//! after `migrate` returns `Ok`.

use log::{debug, info, warn};
use regex::Regex;
use serde::Serialize;

use crate::{
    archive::{Archive, TabRole},
    data::{Scalar, normalize_serial_date},
    duplicates::{self, AppliedRename, MatchKeys},
    error::MigrationError,
    locator::{self, column_letter, exact_pattern},
    plan::{MigrationPlan, Placement, RowTarget, ValidationBinding},
    workbook::{CellRange, CellStyle, LEVEL, Tab, UNIT, VALUE, VAR, VAR_LONG, Workbook},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VocabularyChange {
    pub name: String,
    pub letter: String,
    pub values: usize,
    pub appended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertedRows {
    pub tab: String,
    /// Spreadsheet row of the first inserted field.
    pub first_sheet_row: usize,
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundValidation {
    pub tab: String,
    pub target: String,
    pub range: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelChange {
    pub tab: String,
    pub sheet_row: usize,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateNormalization {
    pub field: String,
    pub sheet_row: usize,
    pub before: String,
    /// Converted value, or `None` when the original was kept.
    pub after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub version: String,
    pub archived: Vec<String>,
    pub vocabulary: Vec<VocabularyChange>,
    pub inserted: Option<InsertedRows>,
    pub validations: Vec<BoundValidation>,
    pub labels: Vec<LabelChange>,
    pub renames: Vec<AppliedRename>,
    pub dates: Vec<DateNormalization>,
}

pub struct Migrator<'a> {
    plan: &'a MigrationPlan,
}

impl<'a> Migrator<'a> {
    pub fn new(plan: &'a MigrationPlan) -> Self {
        Self { plan }
    }

    pub fn migrate(
        &self,
        workbook: &mut Workbook,
        archive: &dyn Archive,
    ) -> Result<MigrationReport, MigrationError> {
        let plan = self.plan;
        self.check_version(workbook)?;

        let mut report = MigrationReport {
            version: plan.version.clone(),
            ..Default::default()
        };
        report.archived = self.snapshot(workbook, archive)?;
        report.vocabulary = self.extend_vocabulary(workbook)?;
        report.inserted = self.insert_metadata(workbook)?;
        report.validations = self.wire_validations(workbook)?;
        report.labels = self.correct_labels(workbook)?;
        report.renames = self.resolve_duplicates(workbook)?;
        self.verify_unique_vars(workbook)?;
        report.dates = self.normalize_dates(workbook)?;
        self.normalize_presentation(workbook)?;

        info!(
            "✓ Key migrated to version {}: {} field(s), {} validation(s), {} rename(s)",
            plan.version,
            report.inserted.as_ref().map(|i| i.vars.len()).unwrap_or(0),
            report.validations.len(),
            report.renames.len()
        );
        Ok(report)
    }

    fn column(&self, tab: &Tab, name: &str) -> Result<usize, MigrationError> {
        locator::locate_index(&tab.headers(), &exact_pattern(name), self.plan.column_policy)
            .map_err(|err| MigrationError::from_locate(tab.name(), err))
    }

    /// Location vars of the required set that the key already holds.
    pub fn present_fields(&self, workbook: &Workbook) -> Result<Vec<String>, MigrationError> {
        let location = workbook.require_tab(&self.plan.tabs.location)?;
        self.column(location, VAR)?;
        Ok(self
            .plan
            .required_fields()
            .into_iter()
            .filter(|field| {
                !location
                    .find_rows(|record| record.get(VAR).matches_text(field))
                    .is_empty()
            })
            .collect())
    }

    pub fn check_version(&self, workbook: &Workbook) -> Result<(), MigrationError> {
        let required = self.plan.required_fields();
        let present = self.present_fields(workbook)?;
        if present.len() == required.len() {
            return Err(MigrationError::AlreadyMigrated {
                version: self.plan.version.clone(),
                tab: self.plan.tabs.location.clone(),
                fields: present,
            });
        }
        if !present.is_empty() {
            warn!(
                "Key already holds {} of {} version {} field(s): {}",
                present.len(),
                required.len(),
                self.plan.version,
                present.join(", ")
            );
        }
        Ok(())
    }

    fn snapshot(
        &self,
        workbook: &Workbook,
        archive: &dyn Archive,
    ) -> Result<Vec<String>, MigrationError> {
        let tabs = &self.plan.tabs;
        let mut archived = Vec::new();
        for (role, name) in [
            (TabRole::Location, &tabs.location),
            (TabRole::Profile, &tabs.profile),
        ] {
            let tab = workbook.require_tab(name)?;
            let path = archive.archive_tab(role, tab)?;
            if !path.as_os_str().is_empty() {
                archived.push(path.display().to_string());
            }
        }
        Ok(archived)
    }

    fn extend_vocabulary(
        &self,
        workbook: &mut Workbook,
    ) -> Result<Vec<VocabularyChange>, MigrationError> {
        let units = workbook.require_tab_mut(&self.plan.tabs.units)?;
        let mut changes = Vec::new();
        for column in &self.plan.vocabulary {
            let (col, appended) = match &column.placement {
                Placement::At(letter) => {
                    let col = locator::column_index(letter).ok_or_else(|| {
                        MigrationError::Vocabulary {
                            tab: units.name().to_string(),
                            column: column.name.clone(),
                            detail: format!("has invalid position '{letter}'"),
                        }
                    })?;
                    (col, false)
                }
                Placement::Append => {
                    if units.field_index(&column.name).is_some() {
                        return Err(MigrationError::Vocabulary {
                            tab: units.name().to_string(),
                            column: column.name.clone(),
                            detail: "already exists and cannot be appended".to_string(),
                        });
                    }
                    (units.column_count(), true)
                }
            };

            let mut block = Vec::with_capacity(column.values.len() + 1);
            block.push(vec![Scalar::text(column.name.as_str())]);
            block.extend(column.values.iter().map(|v| vec![Scalar::text(v.as_str())]));
            if !appended {
                units.clear_column_from(col, 0);
            }
            units.write_block(0, col, &block)?;

            let letter = column_letter(col);
            info!(
                "Units column {letter} '{}' holds {} value(s){}",
                column.name,
                column.values.len(),
                if appended { " (appended)" } else { "" }
            );
            changes.push(VocabularyChange {
                name: column.name.clone(),
                letter,
                values: column.values.len(),
                appended,
            });
        }
        Ok(changes)
    }

    fn insert_metadata(
        &self,
        workbook: &mut Workbook,
    ) -> Result<Option<InsertedRows>, MigrationError> {
        if self.plan.new_fields.is_empty() {
            return Ok(None);
        }
        let location = workbook.require_tab_mut(&self.plan.tabs.location)?;
        let columns = [
            self.column(location, VALUE)?,
            self.column(location, UNIT)?,
            self.column(location, VAR_LONG)?,
            self.column(location, VAR)?,
            self.column(location, LEVEL)?,
        ];

        // Header row, N data rows, one blank row, then the new fields.
        let first_grid_row = location.row_count() + 2;
        for (offset, field) in self.plan.new_fields.iter().enumerate() {
            let values = [
                field.value.clone().unwrap_or_default(),
                field.unit.as_deref().map(Scalar::from).unwrap_or_default(),
                Scalar::text(field.var_long.as_str()),
                Scalar::text(field.var.as_str()),
                field.level.as_deref().map(Scalar::from).unwrap_or_default(),
            ];
            for (col, value) in columns.iter().zip(values) {
                location.write_block(first_grid_row + offset, *col, &[vec![value]])?;
            }
        }

        let first_sheet_row = first_grid_row + 1;
        info!(
            "Inserted {} field(s) into '{}' from row {first_sheet_row}",
            self.plan.new_fields.len(),
            location.name()
        );
        Ok(Some(InsertedRows {
            tab: location.name().to_string(),
            first_sheet_row,
            vars: self.plan.new_fields.iter().map(|f| f.var.clone()).collect(),
        }))
    }

    /// Absolute `'Units'!$C$2:$C$n` reference to a vocabulary column's values.
    fn vocabulary_source(&self, units: &Tab, name: &str) -> Result<String, MigrationError> {
        let col = self.column(units, name)?;
        let last = units
            .column_values(col)
            .iter()
            .rposition(|value| !value.is_empty())
            .ok_or_else(|| MigrationError::Vocabulary {
                tab: units.name().to_string(),
                column: name.to_string(),
                detail: "holds no values".to_string(),
            })?;
        let letter = column_letter(col);
        Ok(format!(
            "'{}'!${letter}${}:${letter}${}",
            units.name().replace('\'', "''"),
            Tab::sheet_row(0),
            Tab::sheet_row(last)
        ))
    }

    fn target_rows(
        &self,
        tab: &Tab,
        binding: &ValidationBinding,
    ) -> Result<(usize, usize), MigrationError> {
        let degenerate = |detail: String| MigrationError::DegenerateRange {
            tab: tab.name().to_string(),
            target: binding.rows.describe(),
            detail,
        };
        match &binding.rows {
            RowTarget::Pattern(pattern) => {
                let regex = Regex::new(pattern).map_err(|err| MigrationError::InvalidPattern {
                    tab: tab.name().to_string(),
                    pattern: pattern.clone(),
                    message: err.to_string(),
                })?;
                self.column(tab, VAR_LONG)?;
                let rows = tab.find_rows(|record| regex.is_match(&record.text(VAR_LONG)));
                match (rows.iter().min(), rows.iter().max()) {
                    (Some(first), Some(last)) if first <= last => Ok((*first, *last)),
                    _ => Err(degenerate("matches no rows".to_string())),
                }
            }
            RowTarget::Field(field) => {
                self.column(tab, VAR)?;
                let rows = tab.find_rows(|record| record.get(VAR).matches_text(field));
                match rows.as_slice() {
                    [row] => Ok((*row, *row)),
                    [] => Err(degenerate("matches no rows".to_string())),
                    many => Err(degenerate(format!("matches {} rows", many.len()))),
                }
            }
        }
    }

    fn wire_validations(
        &self,
        workbook: &mut Workbook,
    ) -> Result<Vec<BoundValidation>, MigrationError> {
        let mut bound = Vec::with_capacity(self.plan.validations.len());
        for binding in &self.plan.validations {
            let source = {
                let units = workbook.require_tab(&self.plan.tabs.units)?;
                self.vocabulary_source(units, &binding.vocabulary)?
            };
            let tab = workbook.require_tab_mut(&binding.tab)?;
            let col = self.column(tab, &binding.column)?;
            let (first, last) = self.target_rows(tab, binding)?;
            // Data row i sits on grid row i + 1 below the header.
            let range = CellRange::column(col, first + 1, last + 1);
            tab.add_list_validation(range, source.as_str())?;
            debug!(
                "Bound {} on '{}' {} to {source}",
                binding.rows.describe(),
                tab.name(),
                range.to_a1()
            );
            bound.push(BoundValidation {
                tab: tab.name().to_string(),
                target: binding.rows.describe(),
                range: range.to_a1(),
                source,
            });
        }
        info!("Bound {} drop-down validation(s)", bound.len());
        Ok(bound)
    }

    fn correct_labels(&self, workbook: &mut Workbook) -> Result<Vec<LabelChange>, MigrationError> {
        let mut changes = Vec::new();
        let mut tabs: Vec<&str> = Vec::new();
        for correction in &self.plan.label_corrections {
            if !tabs.contains(&correction.tab.as_str()) {
                tabs.push(correction.tab.as_str());
            }
        }

        for tab_name in tabs {
            let tab = workbook.require_tab_mut(tab_name)?;
            let corrections = self
                .plan
                .label_corrections
                .iter()
                .filter(|c| c.tab == tab_name)
                .map(|c| {
                    let unless = c
                        .unless
                        .as_deref()
                        .map(Regex::new)
                        .transpose()
                        .map_err(|err| MigrationError::InvalidPattern {
                            tab: tab_name.to_string(),
                            pattern: c.unless.clone().unwrap_or_default(),
                            message: err.to_string(),
                        })?;
                    Ok((c, unless))
                })
                .collect::<Result<Vec<_>, MigrationError>>()?;
            for index in 0..tab.row_count() {
                for (correction, unless) in &corrections {
                    let Some(current) = tab.value(index, &correction.column) else {
                        return Err(MigrationError::ColumnNotFound {
                            tab: tab.name().to_string(),
                            pattern: exact_pattern(&correction.column),
                        });
                    };
                    let before = current.as_display();
                    if !before.contains(correction.legacy.as_str())
                        || before.contains(correction.corrected.as_str())
                    {
                        continue;
                    }
                    if unless.as_ref().is_some_and(|re| re.is_match(&before)) {
                        debug!(
                            "Tab '{}' row {}: '{before}' is already qualified",
                            tab.name(),
                            Tab::sheet_row(index)
                        );
                        continue;
                    }
                    tab.set_value(
                        index,
                        &correction.column,
                        Scalar::text(correction.corrected.as_str()),
                    )?;
                    info!(
                        "Tab '{}' row {}: '{}' -> '{}'",
                        tab.name(),
                        Tab::sheet_row(index),
                        before,
                        correction.corrected
                    );
                    changes.push(LabelChange {
                        tab: tab.name().to_string(),
                        sheet_row: Tab::sheet_row(index),
                        before,
                        after: correction.corrected.clone(),
                    });
                    break;
                }
            }
        }
        Ok(changes)
    }

    fn resolve_duplicates(
        &self,
        workbook: &mut Workbook,
    ) -> Result<Vec<AppliedRename>, MigrationError> {
        let tabs = &self.plan.tabs;
        let renames = &self.plan.renames;
        let mut applied = Vec::new();

        let location = workbook.require_tab_mut(&tabs.location)?;
        applied.extend(duplicates::resolve(
            location,
            &renames.location,
            MatchKeys::VarLong,
        )?);

        let profile = workbook.require_tab_mut(&tabs.profile)?;
        if !renames.profile.is_empty() {
            self.column(profile, LEVEL)?;
        }
        applied.extend(duplicates::resolve(
            profile,
            &renames.profile,
            MatchKeys::VarLongAndLevel,
        )?);
        Ok(applied)
    }

    pub fn verify_unique_vars(&self, workbook: &Workbook) -> Result<(), MigrationError> {
        let tabs = &self.plan.tabs;
        let mut found = Vec::new();
        for name in [&tabs.location, &tabs.profile] {
            let tab = workbook.require_tab(name)?;
            self.column(tab, VAR)?;
            found.extend(duplicates::find_duplicate_vars(tab));
        }
        if found.is_empty() {
            info!("✓ var names are unique in '{}' and '{}'", tabs.location, tabs.profile);
            Ok(())
        } else {
            Err(MigrationError::DuplicateVar { duplicates: found })
        }
    }

    fn normalize_dates(
        &self,
        workbook: &mut Workbook,
    ) -> Result<Vec<DateNormalization>, MigrationError> {
        let location = workbook.require_tab_mut(&self.plan.tabs.location)?;
        let mut outcomes = Vec::new();
        for field in &self.plan.date_fields {
            for index in location.find_rows(|record| record.get(VAR).matches_text(field)) {
                let current = location.value(index, VALUE).cloned().unwrap_or_default();
                let before = current.as_display();
                let sheet_row = Tab::sheet_row(index);
                match normalize_serial_date(&current) {
                    Ok(Some(converted)) => {
                        let after = converted.as_display();
                        location.set_value(index, VALUE, converted)?;
                        info!("'{field}' on row {sheet_row}: '{before}' -> '{after}'");
                        outcomes.push(DateNormalization {
                            field: field.clone(),
                            sheet_row,
                            before,
                            after: Some(after),
                            warning: None,
                        });
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!("Keeping '{field}' value '{before}' on row {sheet_row}: {err}");
                        outcomes.push(DateNormalization {
                            field: field.clone(),
                            sheet_row,
                            before,
                            after: None,
                            warning: Some(err.to_string()),
                        });
                    }
                }
            }
        }
        Ok(outcomes)
    }

    fn normalize_presentation(&self, workbook: &mut Workbook) -> Result<(), MigrationError> {
        let tabs = &self.plan.tabs;
        let presentation = &self.plan.presentation;
        let body = CellStyle {
            font_name: presentation.font_name.clone(),
            font_size: presentation.font_size,
            bold: false,
        };
        let header = CellStyle {
            bold: true,
            ..body.clone()
        };
        for name in [&tabs.location, &tabs.profile, &tabs.units] {
            let tab = workbook.require_tab_mut(name)?;
            let cols = tab.column_count();
            let rows = tab.row_count();
            if cols == 0 {
                continue;
            }
            if rows > 0 {
                tab.apply_style(CellRange::new(1, 0, rows, cols - 1), body.clone())?;
            }
            tab.apply_style(CellRange::new(0, 0, 0, cols - 1), header.clone())?;
            debug!("Styled '{}' over {} row(s) x {} column(s)", name, rows + 1, cols);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::NoArchive;
    use crate::plan::{LabelCorrection, NewField};

    fn long_tab(name: &str, rows: &[(&str, &str, &str, &str)]) -> Tab {
        let mut tab = Tab::new(name, &[VALUE, UNIT, VAR_LONG, VAR, LEVEL]).unwrap();
        let block = rows
            .iter()
            .map(|(value, long, var, level)| {
                vec![
                    Scalar::from(*value),
                    Scalar::Empty,
                    Scalar::text(*long),
                    Scalar::text(*var),
                    Scalar::text(*level),
                ]
            })
            .collect::<Vec<_>>();
        tab.write_block(1, 0, &block).unwrap();
        tab
    }

    fn workbook() -> Workbook {
        let mut workbook = Workbook::new();
        workbook
            .add_tab(long_tab(
                "Location",
                &[
                    ("Konza", "Site name", "site_code", "location"),
                    ("44197", "Modification date", "modification_date", "location"),
                ],
            ))
            .unwrap();
        workbook
            .add_tab(long_tab(
                "Profile",
                &[
                    ("", "Total carbon concentration", "c_tot", "layer"),
                    ("control", "Treatment_1", "tx_L1", "layer"),
                    ("N", "Treatment_2", "tx_L2", "layer"),
                ],
            ))
            .unwrap();
        let mut units = Tab::new("Units", &["unit_options", "logical_old"]).unwrap();
        units
            .write_block(1, 0, &[vec![Scalar::text("g/kg"), Scalar::text("YES")]])
            .unwrap();
        workbook.add_tab(units).unwrap();
        workbook
    }

    fn plan() -> MigrationPlan {
        let mut plan = MigrationPlan::builtin().unwrap();
        plan.new_fields = vec![
            NewField {
                var: "key_version".into(),
                var_long: "Key file version".into(),
                value: Some(Scalar::Number(2.0)),
                unit: None,
                level: None,
            },
            NewField {
                var: "time_series".into(),
                var_long: "Time series (YES/NO)".into(),
                value: None,
                unit: None,
                level: None,
            },
        ];
        plan.required_fields = Vec::new();
        plan.vocabulary.retain(|v| v.name == "logical");
        plan.validations.retain(|v| v.rows == RowTarget::Field("time_series".into()));
        plan.label_corrections = vec![LabelCorrection {
            tab: "Profile".into(),
            column: VAR_LONG.into(),
            legacy: "Total carbon concentration".into(),
            corrected: "Total carbon concentration (not acid treated)".into(),
            unless: Some("(?i)acid|inorganic".into()),
        }];
        plan
    }

    #[test]
    fn gate_refuses_migrated_keys_without_mutation() {
        let plan = plan();
        let mut workbook = workbook();
        Migrator::new(&plan).migrate(&mut workbook, &NoArchive).unwrap();
        let migrated = workbook.clone();
        let err = Migrator::new(&plan)
            .migrate(&mut workbook, &NoArchive)
            .unwrap_err();
        assert!(matches!(err, MigrationError::AlreadyMigrated { .. }));
        assert_eq!(workbook, migrated);
    }

    #[test]
    fn new_fields_follow_a_blank_row() {
        let plan = plan();
        let mut workbook = workbook();
        let report = Migrator::new(&plan).migrate(&mut workbook, &NoArchive).unwrap();
        let inserted = report.inserted.unwrap();
        assert_eq!(inserted.first_sheet_row, 2 + 3);
        let location = workbook.tab("Location").unwrap();
        assert_eq!(location.row_count(), 5);
        assert!(location.records().nth(2).unwrap().is_blank());
        assert_eq!(location.value(3, VAR), Some(&Scalar::text("key_version")));
        assert_eq!(location.value(3, VALUE), Some(&Scalar::Number(2.0)));
        assert_eq!(location.value(4, VALUE), Some(&Scalar::Empty));
    }

    #[test]
    fn validation_points_at_the_live_units_column() {
        let plan = plan();
        let mut workbook = workbook();
        let report = Migrator::new(&plan).migrate(&mut workbook, &NoArchive).unwrap();
        assert_eq!(report.vocabulary[0].letter, "C");
        assert_eq!(report.validations.len(), 1);
        assert_eq!(report.validations[0].range, "A6:A6");
        assert_eq!(report.validations[0].source, "'Units'!$C$2:$C$3");
    }

    #[test]
    fn legacy_labels_are_corrected_once() {
        let plan = plan();
        let mut workbook = workbook();
        let report = Migrator::new(&plan).migrate(&mut workbook, &NoArchive).unwrap();
        assert_eq!(report.labels.len(), 1);
        assert_eq!(report.labels[0].sheet_row, 2);
        assert_eq!(
            workbook.tab("Profile").unwrap().value(0, VAR_LONG),
            Some(&Scalar::text("Total carbon concentration (not acid treated)"))
        );
    }

    #[test]
    fn qualified_labels_are_left_alone() {
        let plan = plan();
        let mut workbook = workbook();
        workbook
            .tab_mut("Profile")
            .unwrap()
            .set_value(0, VAR_LONG, Scalar::text("Total carbon concentration (acid treated)"))
            .unwrap();
        let report = Migrator::new(&plan).migrate(&mut workbook, &NoArchive).unwrap();
        assert!(report.labels.is_empty());
        assert_eq!(
            workbook.tab("Profile").unwrap().value(0, VAR_LONG),
            Some(&Scalar::text("Total carbon concentration (acid treated)"))
        );
    }

    #[test]
    fn serial_modification_date_becomes_iso() {
        let plan = plan();
        let mut workbook = workbook();
        let report = Migrator::new(&plan).migrate(&mut workbook, &NoArchive).unwrap();
        assert_eq!(report.dates.len(), 1);
        assert_eq!(report.dates[0].after.as_deref(), Some("2021-01-01"));
        assert_eq!(
            workbook.tab("Location").unwrap().value(1, VALUE),
            Some(&Scalar::text("2021-01-01"))
        );
    }

    #[test]
    fn missing_pattern_rows_are_a_configuration_error() {
        let mut plan = plan();
        plan.validations = vec![ValidationBinding {
            vocabulary: "logical".into(),
            tab: "Profile".into(),
            column: VALUE.into(),
            rows: RowTarget::Pattern("^Fertilizer_".into()),
        }];
        let err = Migrator::new(&plan)
            .migrate(&mut workbook(), &NoArchive)
            .unwrap_err();
        assert!(matches!(err, MigrationError::DegenerateRange { .. }));
    }

    #[test]
    fn headers_are_bold_after_presentation() {
        let plan = plan();
        let mut workbook = workbook();
        Migrator::new(&plan).migrate(&mut workbook, &NoArchive).unwrap();
        for tab in workbook.tabs() {
            assert!(tab.style_at(0, 0).unwrap().bold);
            let last_row = tab.row_count();
            let last_col = tab.column_count() - 1;
            let body = tab.style_at(last_row, last_col).unwrap();
            assert!(!body.bold);
            assert_eq!(body.font_name, "Arial");
        }
    }
}
