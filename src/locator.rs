//! Column letters and header lookup.
//!
//! Key tabs gain columns during a migration, so any reference to a column
//! (validation sources, target cells) is resolved against the live header row
//! at the moment it is needed.

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::LocateError;

/// What to do when more than one header matches a lookup pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Take the left-most matching header.
    First,
    /// Reject the lookup when several headers match.
    #[default]
    Unique,
}

/// Spreadsheet letter for a zero-based column index (`0` is `A`, `26` is `AA`).
pub fn column_letter(index: usize) -> String {
    // Bijective base-26: digits run 1..=26, so shift before each division.
    let mut remaining = index + 1;
    let mut letters = Vec::new();
    while remaining > 0 {
        remaining -= 1;
        letters.push(b'A' + (remaining % 26) as u8);
        remaining /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// The first `count` column letters in sheet order.
pub fn column_letters(count: usize) -> Vec<String> {
    (0..count).map(column_letter).collect()
}

/// Zero-based index for a column letter such as `E` or `AB`.
pub fn column_index(letter: &str) -> Option<usize> {
    let trimmed = letter.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut value = 0usize;
    for ch in trimmed.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A' + 1) as usize;
        value = value.checked_mul(26)?.checked_add(digit)?;
    }
    Some(value - 1)
}

/// Pattern matching exactly one header name.
pub fn exact_pattern(name: &str) -> String {
    format!("^{}$", regex::escape(name))
}

/// Index of the header matching `pattern` under `policy`.
pub fn locate_index(
    headers: &[String],
    pattern: &str,
    policy: MatchPolicy,
) -> Result<usize, LocateError> {
    let regex = Regex::new(pattern).map_err(|err| LocateError::InvalidPattern {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })?;
    let matches = headers
        .iter()
        .enumerate()
        .filter(|(_, header)| regex.is_match(header))
        .collect::<Vec<_>>();

    match matches.as_slice() {
        [] => Err(LocateError::NotFound {
            pattern: pattern.to_string(),
        }),
        [(idx, _)] => Ok(*idx),
        [(idx, first), rest @ ..] => match policy {
            MatchPolicy::First => {
                debug!(
                    "Pattern '{pattern}' matched '{first}' and {} other header(s); using the first",
                    rest.len()
                );
                Ok(*idx)
            }
            MatchPolicy::Unique => Err(LocateError::Ambiguous {
                pattern: pattern.to_string(),
                matches: matches.iter().map(|(_, h)| (*h).clone()).collect(),
            }),
        },
    }
}

/// Column letter of the header matching `pattern` under `policy`.
pub fn locate(
    headers: &[String],
    pattern: &str,
    policy: MatchPolicy,
) -> Result<String, LocateError> {
    locate_index(headers, pattern, policy).map(column_letter)
}
