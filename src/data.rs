use std::fmt;

use anyhow::{Result, anyhow, bail};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Largest serial day number a spreadsheet can represent (9999-12-31).
const MAX_SERIAL_DAY: f64 = 2_958_465.0;

/// Cell content of a workbook tab.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    #[default]
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
    #[serde(skip_deserializing)]
    Date(NaiveDate),
    #[serde(skip_deserializing)]
    DateTime(NaiveDateTime),
}

impl Scalar {
    pub fn text(value: impl Into<String>) -> Self {
        Scalar::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Scalar::Empty => true,
            Scalar::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Scalar::Empty => String::new(),
            Scalar::Text(s) => s.clone(),
            Scalar::Number(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Scalar::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Scalar::Date(d) => d.format("%Y-%m-%d").to_string(),
            Scalar::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Compares the trimmed display form against `other`.
    pub fn matches_text(&self, other: &str) -> bool {
        self.as_display().trim() == other.trim()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Scalar::Empty
        } else {
            Scalar::Text(value.to_string())
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Days from 0001-01-01 (day 1) to 1899-12-30, day 0 of the serial calendar.
const SERIAL_EPOCH_FROM_CE: i32 = 693_594;

pub fn serial_to_date(serial: f64) -> Result<NaiveDate> {
    if !serial.is_finite() {
        bail!("Serial date '{serial}' is not a finite number");
    }
    if serial.fract() != 0.0 {
        bail!("Serial date '{serial}' carries a time component");
    }
    if !(1.0..=MAX_SERIAL_DAY).contains(&serial) {
        bail!("Serial date '{serial}' is outside the spreadsheet calendar");
    }
    NaiveDate::from_num_days_from_ce_opt(SERIAL_EPOCH_FROM_CE + serial as i32)
        .ok_or_else(|| anyhow!("Serial date '{serial}' overflows the calendar"))
}

pub fn date_to_serial(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce() - SERIAL_EPOCH_FROM_CE)
}

/// Serial day with a time fraction, rounded to the nearest second.
pub fn serial_to_datetime(serial: f64) -> Result<NaiveDateTime> {
    if !serial.is_finite() {
        bail!("Serial date-time '{serial}' is not a finite number");
    }
    let mut days = serial.floor();
    let mut seconds = ((serial - days) * SECONDS_PER_DAY).round() as u32;
    if f64::from(seconds) >= SECONDS_PER_DAY {
        days += 1.0;
        seconds = 0;
    }
    let date = serial_to_date(days)?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
        .ok_or_else(|| anyhow!("Serial date-time '{serial}' has an invalid time"))?;
    Ok(date.and_time(time))
}

pub fn datetime_to_serial(datetime: NaiveDateTime) -> f64 {
    date_to_serial(datetime.date())
        + f64::from(datetime.time().num_seconds_from_midnight()) / SECONDS_PER_DAY
}

pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("Failed to parse '{value}' as an ISO date"))
}

/// Rewrites a serial-day value as an ISO calendar date.
///
/// Returns `Ok(None)` when the value is already a calendar string or empty,
/// and an error when the value looks like a date but cannot be converted.
pub fn normalize_serial_date(value: &Scalar) -> Result<Option<Scalar>> {
    match value {
        Scalar::Empty => Ok(None),
        Scalar::Number(serial) => {
            let date = serial_to_date(*serial)?;
            Ok(Some(Scalar::Text(date.format("%Y-%m-%d").to_string())))
        }
        Scalar::Date(date) => Ok(Some(Scalar::Text(date.format("%Y-%m-%d").to_string()))),
        Scalar::DateTime(datetime) => Ok(Some(Scalar::Text(
            datetime.format("%Y-%m-%dT%H:%M:%S").to_string(),
        ))),
        Scalar::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() || parse_iso_date(trimmed).is_ok() {
                return Ok(None);
            }
            match trimmed.parse::<f64>() {
                Ok(serial) => {
                    let date = serial_to_date(serial)?;
                    Ok(Some(Scalar::Text(date.format("%Y-%m-%d").to_string())))
                }
                Err(_) => Err(anyhow!("'{trimmed}' is neither a serial day nor an ISO date")),
            }
        }
        Scalar::Bool(_) => Err(anyhow!("Boolean value cannot hold a date")),
    }
}
