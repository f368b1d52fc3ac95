//! Observation date helpers (`YYYY-MM-DD` strings on the wire).

use chrono::NaiveDate;

use crate::error::{EpicError, Result};

const ISO_FORMAT: &str = "%Y-%m-%d";

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(date: &str) -> Result<NaiveDate> {
    if date.len() != 10 {
        return Err(EpicError::InvalidDate(date.to_string()));
    }
    NaiveDate::parse_from_str(date, ISO_FORMAT).map_err(|_| EpicError::InvalidDate(date.to_string()))
}

/// Normalize a backend date entry to `YYYY-MM-DD`.
///
/// Accepts plain dates as well as timestamps like `2015-06-13 00:31:45`
/// or `2015-06-13T00:31:45Z`. Returns None for anything unparsable.
pub fn normalize_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10)?;
    let date = NaiveDate::parse_from_str(head, ISO_FORMAT).ok()?;
    Some(date.format(ISO_FORMAT).to_string())
}

/// Compact `YYYYMMDD` key, as embedded in EPIC image names
/// (`epic_1b_20150613003633`).
pub fn date_key(date: &str) -> String {
    date.chars().filter(|c| *c != '-').collect()
}

/// Long display form: "Saturday, June 13, 2015". Falls back to the input.
pub fn format_display_date(date: &str) -> String {
    match parse_date(date) {
        Ok(d) => d.format("%A, %B %-d, %Y").to_string(),
        Err(_) => date.to_string(),
    }
}
