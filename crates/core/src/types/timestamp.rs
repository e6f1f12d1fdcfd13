//! Timestamps as the backend reports them.
//!
//! The hosted functions are not consistent: some emit `isoformat()` strings
//! (`2024-10-30T12:00:00.123456`), others the `str()` form with a space
//! separator, and some include an offset. The raw string is kept and parsed
//! on demand so an unexpected format never fails a whole response.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Date format used for display (ru-RU short date).
const DISPLAY_FORMAT: &str = "%d.%m.%Y";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// A raw timestamp string from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendTimestamp(String);

impl BackendTimestamp {
    /// Wrap a raw backend timestamp.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw string as received.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The calendar date of the timestamp, if it can be parsed.
    ///
    /// Offsets are respected as given; no conversion to local time happens.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        let raw = self.0.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }

        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|dt| dt.date())
            .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
    }

    /// Render as `DD.MM.YYYY`, falling back to the raw string.
    #[must_use]
    pub fn display_date(&self) -> String {
        self.date().map_or_else(
            || self.0.clone(),
            |d| d.format(DISPLAY_FORMAT).to_string(),
        )
    }
}
