use anyhow::{Context, Result};
use log::info;

use crate::{
    archive::NoArchive,
    cli::MigrateArgs,
    config::RunConfig,
    ledger::LedgerEntry,
    migrate::{MigrationReport, Migrator},
    table,
    transport::Transport,
    workbook::Workbook,
};

pub fn execute(args: &MigrateArgs) -> Result<()> {
    let config = RunConfig::from_args(args);
    let plan = config.load_plan().context("Loading migration plan")?;
    config.prepare()?;
    info!(
        "Migrating '{}' from {:?} to key version {}",
        config.key, config.store_root, plan.version
    );

    let transport = config.transport();
    let local = transport
        .fetch(&config.key, &config.download_dir)
        .with_context(|| format!("Fetching key '{}'", config.key))?;
    let mut workbook =
        Workbook::load(&local).with_context(|| format!("Loading workbook {local:?}"))?;
    let migrator = Migrator::new(&plan);

    if config.dry_run {
        let report = migrator
            .migrate(&mut workbook, &NoArchive)
            .with_context(|| format!("Migrating {local:?}"))?;
        print_report(&report, args.json)?;
        info!("Dry run complete; nothing was archived, uploaded, or recorded");
        return Ok(());
    }

    let archive = config.archive()?;
    let report = migrator
        .migrate(&mut workbook, &archive)
        .with_context(|| format!("Migrating {local:?}"))?;

    let artifact = config.artifact_path(&plan.version)?;
    workbook
        .save(&artifact)
        .with_context(|| format!("Writing migrated workbook {artifact:?}"))?;
    let destination = config.destination();
    let receipt = transport
        .store(&artifact, &destination)
        .with_context(|| format!("Uploading {artifact:?} to '{destination}'"))?;
    info!(
        "✓ Uploaded {} bytes (sha256 {})",
        receipt.bytes, receipt.sha256
    );

    if let Some(ledger) = config.ledger() {
        let entry = LedgerEntry::now(config.key_file_name()?, config.origin_directory());
        ledger
            .record(&entry)
            .with_context(|| format!("Updating ledger {:?}", ledger.path()))?;
    }

    print_report(&report, args.json)
}

pub fn print_report(report: &MigrationReport, json: bool) -> Result<()> {
    if json {
        let rendered =
            serde_json::to_string_pretty(report).context("Serializing migration report")?;
        println!("{rendered}");
        return Ok(());
    }

    println!("Key version {}", report.version);
    if let Some(inserted) = &report.inserted {
        println!(
            "Inserted {} field(s) into '{}' from row {}: {}",
            inserted.vars.len(),
            inserted.tab,
            inserted.first_sheet_row,
            inserted.vars.join(", ")
        );
    }
    for path in &report.archived {
        println!("Archived {path}");
    }

    if !report.vocabulary.is_empty() {
        let rows = report
            .vocabulary
            .iter()
            .map(|v| {
                vec![
                    v.letter.clone(),
                    v.name.clone(),
                    v.values.to_string(),
                    if v.appended { "appended" } else { "replaced" }.to_string(),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(&headers(&["letter", "vocabulary", "values", "action"]), &rows);
    }

    if !report.validations.is_empty() {
        let rows = report
            .validations
            .iter()
            .map(|v| vec![v.tab.clone(), v.range.clone(), v.source.clone(), v.target.clone()])
            .collect::<Vec<_>>();
        table::print_table(&headers(&["tab", "range", "source", "target"]), &rows);
    }

    if !report.labels.is_empty() {
        let rows = report
            .labels
            .iter()
            .map(|l| {
                vec![
                    l.tab.clone(),
                    l.sheet_row.to_string(),
                    l.before.clone(),
                    l.after.clone(),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(&headers(&["tab", "row", "label", "corrected"]), &rows);
    }

    if !report.renames.is_empty() {
        let rows = report
            .renames
            .iter()
            .map(|r| {
                vec![
                    r.tab.clone(),
                    r.sheet_row.to_string(),
                    r.var_long.clone(),
                    r.previous.clone(),
                    r.var.clone(),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(
            &headers(&["tab", "row", "Var_long", "previous", "var"]),
            &rows,
        );
    }

    if !report.dates.is_empty() {
        let rows = report
            .dates
            .iter()
            .map(|d| {
                vec![
                    d.field.clone(),
                    d.sheet_row.to_string(),
                    d.before.clone(),
                    d.after.clone().unwrap_or_else(|| "kept".to_string()),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(&headers(&["field", "row", "value", "normalized"]), &rows);
    }
    Ok(())
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}
