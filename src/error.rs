//! Error taxonomy for workbook access and key-file migration.
//!
//! Command handlers wrap these in `anyhow` with context; the migration engine
//! and its collaborators return them directly so callers can match on the
//! failed invariant.

use std::{fmt, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("Failed to open workbook {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("Failed to read tab '{tab}': {source}")]
    ReadTab {
        tab: String,
        #[source]
        source: calamine::Error,
    },
    #[error("Failed to read package parts of {path:?}: {message}")]
    Parts { path: PathBuf, message: String },
    #[error("Failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    #[error("Workbook has no tab named '{0}'")]
    MissingTab(String),
    #[error("Workbook already has a tab named '{0}'")]
    DuplicateTab(String),
    #[error("Tab '{tab}' has duplicate header '{header}'")]
    DuplicateHeader { tab: String, header: String },
    #[error("Tab '{tab}' has no field named '{field}'")]
    UnknownField { tab: String, field: String },
    #[error("Tab '{tab}' cannot hold a {kind} over degenerate range {range}")]
    DegenerateRange {
        tab: String,
        kind: &'static str,
        range: String,
    },
    #[error("Tab '{tab}' exceeds the spreadsheet grid at row {row}, column {col}")]
    OutOfBounds { tab: String, row: usize, col: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocateError {
    #[error("no header matches pattern '{pattern}'")]
    NotFound { pattern: String },
    #[error("pattern '{pattern}' matches {} headers: {}", .matches.len(), .matches.join(", "))]
    Ambiguous {
        pattern: String,
        matches: Vec<String>,
    },
    #[error("invalid header pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// One `var` value shared by more than one row of a tab.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DuplicateVar {
    pub tab: String,
    pub var: String,
    /// Spreadsheet rows (1-based, header on row 1) holding the name.
    pub rows: Vec<usize>,
}

impl fmt::Display for DuplicateVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self
            .rows
            .iter()
            .map(|row| row.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}:{} (rows {rows})", self.tab, self.var)
    }
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(
        "Key file is already at version {version}: tab '{tab}' holds every required field ({})",
        .fields.join(", ")
    )]
    AlreadyMigrated {
        version: String,
        tab: String,
        fields: Vec<String>,
    },
    #[error(
        "Rename target '{var_long}'{} in tab '{tab}' is ambiguous: pattern lookup matched {pattern_matches} row(s), exact lookup matched {exact_matches} row(s)",
        .level.as_deref().map(|l| format!(" (Level '{l}')")).unwrap_or_default()
    )]
    AmbiguousRenameTarget {
        tab: String,
        var_long: String,
        level: Option<String>,
        pattern_matches: usize,
        exact_matches: usize,
    },
    #[error("Tab '{tab}': no column header matches '{pattern}'")]
    ColumnNotFound { tab: String, pattern: String },
    #[error("Tab '{tab}': column pattern '{pattern}' matches several headers ({})", .matches.join(", "))]
    AmbiguousColumn {
        tab: String,
        pattern: String,
        matches: Vec<String>,
    },
    #[error("Tab '{tab}': invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        tab: String,
        pattern: String,
        message: String,
    },
    #[error("Duplicate var names after migration: {}", format_duplicates(.duplicates))]
    DuplicateVar { duplicates: Vec<DuplicateVar> },
    #[error("Tab '{tab}': validation target {target} {detail}")]
    DegenerateRange {
        tab: String,
        target: String,
        detail: String,
    },
    #[error("Tab '{tab}': vocabulary column '{column}' {detail}")]
    Vocabulary {
        tab: String,
        column: String,
        detail: String,
    },
    #[error("Archiving tab '{tab}' to {path:?} failed: {message}")]
    Archive {
        tab: String,
        path: PathBuf,
        message: String,
    },
    #[error(transparent)]
    Workbook(#[from] WorkbookError),
}

impl MigrationError {
    /// Attaches the tab name to a column lookup failure.
    pub fn from_locate(tab: &str, err: LocateError) -> Self {
        match err {
            LocateError::NotFound { pattern } => MigrationError::ColumnNotFound {
                tab: tab.to_string(),
                pattern,
            },
            LocateError::Ambiguous { pattern, matches } => MigrationError::AmbiguousColumn {
                tab: tab.to_string(),
                pattern,
                matches,
            },
            LocateError::InvalidPattern { pattern, message } => MigrationError::InvalidPattern {
                tab: tab.to_string(),
                pattern,
                message,
            },
        }
    }
}

fn format_duplicates(duplicates: &[DuplicateVar]) -> String {
    duplicates
        .iter()
        .map(|dup| dup.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
