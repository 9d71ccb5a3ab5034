//! Rename colliding `var` names and scan tabs for duplicates.
//!
//! A rename entry names its target row by description (`Var_long`, plus
//! `Level` on the profile tab). Two lookups are tried in order: a literal
//! pattern match against the description and an exact comparison. The first
//! lookup that yields exactly one row wins.

use itertools::Itertools;
use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    data::Scalar,
    error::{DuplicateVar, MigrationError},
    workbook::{LEVEL, Record, Tab, VAR, VAR_LONG},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameEntry {
    pub var_long: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    pub var: String,
}

/// Fields that identify a rename target row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKeys {
    VarLong,
    VarLongAndLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRename {
    pub tab: String,
    pub sheet_row: usize,
    pub var_long: String,
    pub previous: String,
    pub var: String,
}

fn level_matches(record: &Record<'_>, entry: &RenameEntry, keys: MatchKeys) -> bool {
    match keys {
        MatchKeys::VarLong => true,
        MatchKeys::VarLongAndLevel => {
            record.get(LEVEL).matches_text(entry.level.as_deref().unwrap_or(""))
        }
    }
}

/// Rows whose description contains the entry's description literally.
pub fn pattern_lookup(
    tab: &Tab,
    entry: &RenameEntry,
    keys: MatchKeys,
) -> Result<Vec<usize>, MigrationError> {
    let pattern = regex::escape(entry.var_long.trim());
    let regex = Regex::new(&pattern).map_err(|err| MigrationError::InvalidPattern {
        tab: tab.name().to_string(),
        pattern: pattern.clone(),
        message: err.to_string(),
    })?;
    Ok(tab.find_rows(|record| {
        regex.is_match(&record.text(VAR_LONG)) && level_matches(record, entry, keys)
    }))
}

/// Rows whose description equals the entry's description.
pub fn exact_lookup(tab: &Tab, entry: &RenameEntry, keys: MatchKeys) -> Vec<usize> {
    tab.find_rows(|record| {
        record.get(VAR_LONG).matches_text(&entry.var_long) && level_matches(record, entry, keys)
    })
}

/// Resolves the single row an entry refers to.
pub fn target_row(
    tab: &Tab,
    entry: &RenameEntry,
    keys: MatchKeys,
) -> Result<usize, MigrationError> {
    let by_pattern = pattern_lookup(tab, entry, keys)?;
    if let [row] = by_pattern.as_slice() {
        return Ok(*row);
    }
    let by_exact = exact_lookup(tab, entry, keys);
    if let [row] = by_exact.as_slice() {
        debug!(
            "Tab '{}': '{}' resolved by exact lookup after pattern lookup found {} row(s)",
            tab.name(),
            entry.var_long,
            by_pattern.len()
        );
        return Ok(*row);
    }
    Err(MigrationError::AmbiguousRenameTarget {
        tab: tab.name().to_string(),
        var_long: entry.var_long.clone(),
        level: match keys {
            MatchKeys::VarLong => None,
            MatchKeys::VarLongAndLevel => entry.level.clone(),
        },
        pattern_matches: by_pattern.len(),
        exact_matches: by_exact.len(),
    })
}

/// Applies every entry to `tab`, overwriting the `var` of each target row.
pub fn resolve(
    tab: &mut Tab,
    entries: &[RenameEntry],
    keys: MatchKeys,
) -> Result<Vec<AppliedRename>, MigrationError> {
    let mut applied = Vec::with_capacity(entries.len());
    for entry in entries {
        let row = target_row(tab, entry, keys)?;
        let previous = tab
            .value(row, VAR)
            .map(Scalar::as_display)
            .unwrap_or_default();
        tab.set_value(row, VAR, Scalar::text(entry.var.as_str()))?;
        info!(
            "Tab '{}' row {}: var '{}' -> '{}'",
            tab.name(),
            Tab::sheet_row(row),
            previous,
            entry.var
        );
        applied.push(AppliedRename {
            tab: tab.name().to_string(),
            sheet_row: Tab::sheet_row(row),
            var_long: entry.var_long.clone(),
            previous,
            var: entry.var.clone(),
        });
    }
    Ok(applied)
}

/// Non-empty `var` names held by more than one row, sorted by name.
pub fn find_duplicate_vars(tab: &Tab) -> Vec<DuplicateVar> {
    tab.records()
        .filter(|record| !record.get(VAR).is_empty())
        .map(|record| (record.text(VAR).trim().to_string(), record.sheet_row()))
        .into_group_map()
        .into_iter()
        .filter(|(_, rows)| rows.len() > 1)
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|(var, rows)| DuplicateVar {
            tab: tab.name().to_string(),
            var,
            rows,
        })
        .collect()
}
