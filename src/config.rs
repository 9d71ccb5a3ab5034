//! Paths and artifact names for one `migrate` invocation.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use log::debug;

use crate::{
    archive::CsvArchive,
    cli::MigrateArgs,
    ledger::Ledger,
    locator::MatchPolicy,
    plan::MigrationPlan,
    transport::DirectoryTransport,
};

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub key: String,
    pub store_root: PathBuf,
    pub download_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub ledger: Option<PathBuf>,
    pub plan: Option<PathBuf>,
    pub destination: Option<String>,
    pub policy: Option<MatchPolicy>,
    pub dry_run: bool,
}

impl RunConfig {
    pub fn from_args(args: &MigrateArgs) -> Self {
        Self {
            key: args.key.trim_matches('/').to_string(),
            store_root: args.store.clone(),
            download_dir: args.download_dir.clone(),
            archive_dir: args.archive_dir.clone(),
            upload_dir: args.upload_dir.clone(),
            ledger: args.ledger.clone(),
            plan: args.plan.clone(),
            destination: args.destination.clone(),
            policy: args.policy,
            dry_run: args.dry_run,
        }
    }

    /// Creates the local staging directories. The archive and upload
    /// directories are left alone on dry runs.
    pub fn prepare(&self) -> Result<()> {
        let mut dirs = vec![&self.download_dir];
        if !self.dry_run {
            dirs.push(&self.archive_dir);
            dirs.push(&self.upload_dir);
        }
        for dir in dirs {
            fs::create_dir_all(dir).with_context(|| format!("Creating directory {dir:?}"))?;
            debug!("Prepared {dir:?}");
        }
        Ok(())
    }

    pub fn key_file_name(&self) -> Result<String> {
        Path::new(&self.key)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("Key identifier '{}' has no file name", self.key))
    }

    pub fn key_stem(&self) -> Result<String> {
        Path::new(&self.key)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("Key identifier '{}' has no file name", self.key))
    }

    /// Directory of the key relative to the store root; empty at the root.
    pub fn origin_directory(&self) -> String {
        Path::new(&self.key)
            .parent()
            .map(|parent| parent.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn destination(&self) -> String {
        self.destination
            .clone()
            .unwrap_or_else(|| self.origin_directory())
    }

    pub fn artifact_name(&self, version: &str) -> Result<String> {
        Ok(format!("{}_KEY_V{version}.xlsx", self.key_stem()?))
    }

    pub fn artifact_path(&self, version: &str) -> Result<PathBuf> {
        Ok(self.upload_dir.join(self.artifact_name(version)?))
    }

    pub fn load_plan(&self) -> Result<MigrationPlan> {
        let mut plan = match &self.plan {
            Some(path) => MigrationPlan::load(path)?,
            None => MigrationPlan::builtin()?,
        };
        if let Some(policy) = self.policy {
            plan.column_policy = policy;
        }
        Ok(plan)
    }

    pub fn archive(&self) -> Result<CsvArchive> {
        Ok(CsvArchive::new(&self.archive_dir, self.key_stem()?))
    }

    pub fn transport(&self) -> DirectoryTransport {
        DirectoryTransport::new(&self.store_root)
    }

    pub fn ledger(&self) -> Option<Ledger> {
        self.ledger.as_ref().map(Ledger::new)
    }
}
