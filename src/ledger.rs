//! Append-only record of completed migrations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::io_utils;

pub const LEDGER_HEADERS: [&str; 3] = ["key_file", "origin_directory", "timestamp"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub key_file: String,
    pub origin_directory: String,
    pub timestamp: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn now(key_file: impl Into<String>, origin_directory: impl Into<String>) -> Self {
        Self {
            key_file: key_file.into(),
            origin_directory: origin_directory.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry. Existing lines are never read or rewritten.
    pub fn record(&self, entry: &LedgerEntry) -> Result<()> {
        let (mut writer, is_new) = io_utils::open_csv_appender(&self.path)?;
        if is_new {
            writer
                .write_record(LEDGER_HEADERS)
                .with_context(|| format!("Writing ledger header to {:?}", self.path))?;
        }
        writer
            .serialize(entry)
            .with_context(|| format!("Appending to ledger {:?}", self.path))?;
        writer
            .flush()
            .with_context(|| format!("Flushing ledger {:?}", self.path))?;
        info!(
            "✓ Recorded migration of '{}' in {:?}",
            entry.key_file, self.path
        );
        Ok(())
    }

    /// Entries in append order.
    ///
    /// Two runs creating the ledger at the same moment can both write the
    /// header line; repeated header rows are skipped.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
        let mut reader = io_utils::open_csv_reader_from_path(&self.path, true)?;
        let headers = csv::StringRecord::from(LEDGER_HEADERS.to_vec());
        let mut entries = Vec::new();
        for (idx, row) in reader.records().enumerate() {
            let line = idx + 2;
            let row = row
                .with_context(|| format!("Reading ledger line {line} of {:?}", self.path))?;
            if row == headers {
                continue;
            }
            let entry = row
                .deserialize(Some(&headers))
                .with_context(|| format!("Parsing ledger line {line} of {:?}", self.path))?;
            entries.push(entry);
        }
        Ok(entries)
    }
}
