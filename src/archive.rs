//! Pre-migration snapshots of key tabs as CSV files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::{
    data::Scalar,
    error::MigrationError,
    io_utils,
    workbook::Tab,
};

/// Which key tab a snapshot holds; determines the archive file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabRole {
    Location,
    Profile,
}

impl TabRole {
    pub fn suffix(&self) -> &'static str {
        match self {
            TabRole::Location => "location",
            TabRole::Profile => "profile",
        }
    }
}

/// Receives read-only copies of tabs before the migration mutates them.
pub trait Archive {
    fn archive_tab(&self, role: TabRole, tab: &Tab) -> Result<PathBuf, MigrationError>;
}

/// Writes `<stem>_<role>.csv` files into a directory.
#[derive(Debug, Clone)]
pub struct CsvArchive {
    dir: PathBuf,
    stem: String,
}

impl CsvArchive {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
        }
    }

    pub fn path_for(&self, role: TabRole) -> PathBuf {
        self.dir.join(format!("{}_{}.csv", self.stem, role.suffix()))
    }
}

impl Archive for CsvArchive {
    fn archive_tab(&self, role: TabRole, tab: &Tab) -> Result<PathBuf, MigrationError> {
        let path = self.path_for(role);
        write_tab(tab, &path).map_err(|err| MigrationError::Archive {
            tab: tab.name().to_string(),
            path: path.clone(),
            message: format!("{err:#}"),
        })?;
        info!("✓ Archived tab '{}' to {:?}", tab.name(), path);
        Ok(path)
    }
}

/// Skips snapshots, for dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArchive;

impl Archive for NoArchive {
    fn archive_tab(&self, _role: TabRole, tab: &Tab) -> Result<PathBuf, MigrationError> {
        info!("Dry run: tab '{}' not archived", tab.name());
        Ok(PathBuf::new())
    }
}

pub fn write_tab(tab: &Tab, path: &Path) -> Result<()> {
    let (headers, rows) = tab.display_rows();
    let mut writer = io_utils::open_csv_writer(path)?;
    writer
        .write_record(headers.iter())
        .with_context(|| format!("Writing headers to {path:?}"))?;
    for (idx, row) in rows.iter().enumerate() {
        writer
            .write_record(row.iter())
            .with_context(|| format!("Writing row {} to {path:?}", Tab::sheet_row(idx)))?;
    }
    writer.flush().with_context(|| format!("Flushing {path:?}"))?;
    Ok(())
}

/// Reloads an archived tab; every non-empty cell comes back as text.
pub fn read_tab(path: &Path, name: &str) -> Result<Tab> {
    let mut reader = io_utils::open_csv_reader_from_path(path, false)?;
    let mut grid = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading line {} of {path:?}", idx + 1))?;
        grid.push(record.iter().map(Scalar::from).collect::<Vec<_>>());
    }
    Tab::from_grid(name, grid).with_context(|| format!("Rebuilding tab '{name}' from {path:?}"))
}
