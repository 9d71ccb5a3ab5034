//! Migration status of a key workbook.
//!
//! Reports which of the plan's required fields the location tab already holds
//! and lists every `var` name that occurs on more than one row of the location
//! or profile tab. Duplicates make the command fail so it can gate scripts.

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::{
    cli::CheckArgs,
    duplicates,
    error::{DuplicateVar, MigrationError},
    migrate::Migrator,
    plan::MigrationPlan,
    table,
    workbook::Workbook,
};

#[derive(Debug, Serialize)]
pub struct FieldStatus {
    pub field: String,
    pub present: bool,
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub version: String,
    pub migrated: bool,
    pub fields: Vec<FieldStatus>,
    pub duplicates: Vec<DuplicateVar>,
}

pub fn inspect(
    workbook: &Workbook,
    plan: &MigrationPlan,
) -> Result<CheckReport, MigrationError> {
    let present = Migrator::new(plan).present_fields(workbook)?;
    let fields = plan
        .required_fields()
        .into_iter()
        .map(|field| FieldStatus {
            present: present.contains(&field),
            field,
        })
        .collect::<Vec<_>>();
    let mut found = Vec::new();
    for name in [&plan.tabs.location, &plan.tabs.profile] {
        found.extend(duplicates::find_duplicate_vars(workbook.require_tab(name)?));
    }
    Ok(CheckReport {
        version: plan.version.clone(),
        migrated: fields.iter().all(|f| f.present),
        fields,
        duplicates: found,
    })
}

pub fn execute(args: &CheckArgs) -> Result<()> {
    let plan = match &args.plan {
        Some(path) => MigrationPlan::load(path)?,
        None => MigrationPlan::builtin()?,
    };
    let workbook = Workbook::load(&args.input)
        .with_context(|| format!("Loading workbook {:?}", args.input))?;
    let report =
        inspect(&workbook, &plan).with_context(|| format!("Checking {:?}", args.input))?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&report).context("Serializing check report")?;
        println!("{rendered}");
    } else {
        let rows = report
            .fields
            .iter()
            .map(|f| {
                vec![
                    f.field.clone(),
                    if f.present { "present" } else { "missing" }.to_string(),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(&["field".to_string(), "status".to_string()], &rows);
        for duplicate in &report.duplicates {
            println!("duplicate var {duplicate}");
        }
    }

    if report.migrated {
        info!("✓ {:?} is at key version {}", args.input, report.version);
    } else {
        info!(
            "{:?} is not yet at key version {}",
            args.input, report.version
        );
    }
    if !report.duplicates.is_empty() {
        return Err(MigrationError::DuplicateVar {
            duplicates: report.duplicates,
        })
        .with_context(|| format!("Checking {:?}", args.input));
    }
    info!("✓ No duplicate var names in {:?}", args.input);
    Ok(())
}
