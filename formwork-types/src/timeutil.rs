//! RFC3339 helpers.
//!
//! Dates are always handled in UTC. Formatting drops sub-second precision,
//! so a format/parse round trip is exact only to the second.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

const RFC3339_SECONDS: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parses an RFC3339 string into a UTC datetime.
///
/// Strings without an offset (`2024-05-01T12:30:00`) are assumed to be UTC.
pub fn parse_date(text: &str) -> Result<DateTime<Utc>> {
    let trimmed = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| Error::InvalidDate(text.to_string()))
}

/// Formats a datetime as an RFC3339 string with a `Z` suffix.
#[must_use]
pub fn format_date(value: &DateTime<Utc>) -> String {
    value.format(RFC3339_SECONDS).to_string()
}

/// Returns the current time in UTC.
#[must_use]
pub fn utc_now() -> DateTime<Utc> {
    Utc::now()
}
