use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::locator::MatchPolicy;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Migrate soil-organic-matter key workbooks between schema versions",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch a key file, migrate it, and store the new version next to it
    Migrate(MigrateArgs),
    /// Report migration status and duplicate var names of a key workbook
    Check(CheckArgs),
    /// List the columns of a tab with their spreadsheet letters
    Columns(ColumnsArgs),
    /// Preview the first rows of a tab in a formatted table
    Preview(PreviewArgs),
    /// Write the built-in migration plan to a YAML file for editing
    Plan(PlanArgs),
}

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Key file identifier relative to the store root
    #[arg(short, long)]
    pub key: String,
    /// Root directory of the shared key store
    #[arg(long)]
    pub store: PathBuf,
    /// Local staging directory for the downloaded key
    #[arg(long = "download-dir")]
    pub download_dir: PathBuf,
    /// Directory receiving CSV snapshots of the location and profile tabs
    #[arg(long = "archive-dir")]
    pub archive_dir: PathBuf,
    /// Local staging directory for the migrated workbook
    #[arg(long = "upload-dir")]
    pub upload_dir: PathBuf,
    /// CSV ledger of completed migrations
    #[arg(long)]
    pub ledger: Option<PathBuf>,
    /// Migration plan YAML (defaults to the built-in version 2 plan)
    #[arg(long)]
    pub plan: Option<PathBuf>,
    /// Store directory for the migrated key (defaults to the key's own directory)
    #[arg(long)]
    pub destination: Option<String>,
    /// Override the plan's header matching policy
    #[arg(long, value_enum)]
    pub policy: Option<MatchPolicy>,
    /// Run every stage and print the report without persisting anything
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    /// Print the migration report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Key workbook to inspect
    #[arg(short, long)]
    pub input: PathBuf,
    /// Migration plan YAML (defaults to the built-in version 2 plan)
    #[arg(long)]
    pub plan: Option<PathBuf>,
    /// Print the findings as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Workbook to inspect
    #[arg(short, long)]
    pub input: PathBuf,
    /// Tab whose headers should be listed
    #[arg(long, default_value = "Location")]
    pub tab: String,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Workbook to preview
    #[arg(short, long)]
    pub input: PathBuf,
    /// Tab to display
    #[arg(long, default_value = "Location")]
    pub tab: String,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Destination YAML file
    #[arg(short, long)]
    pub output: PathBuf,
}
