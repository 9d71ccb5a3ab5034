pub mod archive;
pub mod check;
pub mod cli;
pub mod columns;
pub mod config;
pub mod data;
pub mod duplicates;
pub mod error;
pub mod io_utils;
pub mod ledger;
pub mod locator;
pub mod migrate;
pub mod migrate_cmd;
pub mod plan;
pub mod preview;
pub mod table;
pub mod transport;
pub mod workbook;
pub mod xlsx_parts;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands},
    plan::MigrationPlan,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("somkey", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Migrate(args) => migrate_cmd::execute(&args),
        Commands::Check(args) => check::execute(&args),
        Commands::Columns(args) => columns::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Plan(args) => handle_plan(&args),
    }
}

fn handle_plan(args: &cli::PlanArgs) -> Result<()> {
    let plan = MigrationPlan::builtin()?;
    plan.save(&args.output)
        .with_context(|| format!("Writing plan to {:?}", args.output))?;
    info!(
        "✓ Key version {} plan with {} new field(s) written to {:?}",
        plan.version,
        plan.new_fields.len(),
        args.output
    );
    Ok(())
}
