//! ISO-8601 timestamp conversions used by the report pipeline.
//!
//! Upstream timestamps look like `2025-02-24T00:00:00.000Z`. Both conversions
//! keep the wall-clock value as written and drop the offset and sub-seconds.

use chrono::{DateTime, NaiveDateTime};

use crate::core::error::{AppError, Result};

/// `2025-02-24T00:00:00.000Z` -> `2025-02-24`
pub fn iso_to_date(value: &str) -> Result<String> {
    Ok(parse_iso(value)?.format("%Y-%m-%d").to_string())
}

/// `2025-02-24T00:00:00.000Z` -> `2025-02-24 00:00:00`
pub fn iso_to_datetime(value: &str) -> Result<String> {
    Ok(parse_iso(value)?.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn parse_iso(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_local());
    }

    NaiveDateTime::parse_from_str(trimmed.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f").map_err(
        |e| AppError::InvalidDate {
            value: value.to_string(),
            reason: e.to_string(),
        },
    )
}
