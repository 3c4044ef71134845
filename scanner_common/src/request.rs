//! Scan request payload and its validation.
//!
//! `ScanRequest` is the wire shape accepted by the API (camelCase, with snake_case
//! aliases). `ScanRequest::validate` turns it into `ScanParams`, whose fields are
//! guaranteed to be in range.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ScannerError;
use crate::result::Result;
use crate::scanner_type::ScannerType;

/// Smallest accepted row count.
pub const MIN_COUNT: i64 = 1;
/// Largest accepted row count.
pub const MAX_COUNT: i64 = 200;
/// Row count used when the request omits it.
pub const DEFAULT_COUNT: i64 = 100;
/// Scan budget handed to the brokerage, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Scan request as received over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// Scanner type name, e.g. `ChangePercentRank`.
    #[serde(alias = "scanner_type")]
    pub scanner_type: String,
    /// Trading date, `YYYY-MM-DD`.
    pub date: String,
    /// Number of rows, 1..=200.
    #[serde(default = "default_count")]
    pub count: i64,
    /// Sort ascending by the ranking value.
    #[serde(default)]
    pub ascending: bool,
    /// Use the paper-trading environment.
    #[serde(default = "default_simulation")]
    pub simulation: bool,
}

fn default_count() -> i64 {
    DEFAULT_COUNT
}

fn default_simulation() -> bool {
    true
}

/// Validated scan parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanParams {
    /// Ranking query.
    pub scanner_type: ScannerType,
    /// Trading date.
    pub date: NaiveDate,
    /// Number of rows.
    pub count: u16,
    /// Sort ascending by the ranking value.
    pub ascending: bool,
    /// Use the paper-trading environment.
    pub simulation: bool,
}

impl ScanRequest {
    /// Check every field and build `ScanParams`, or fail with `InvalidParameter`.
    pub fn validate(&self) -> Result<ScanParams> {
        let scanner_type = self.scanner_type.trim().parse::<ScannerType>().map_err(|_| {
            ScannerError::InvalidParameter(format!("unknown scanner type: {}", self.scanner_type))
        })?;
        let date = parse_date(&self.date)?;
        if !(MIN_COUNT..=MAX_COUNT).contains(&self.count) {
            return Err(ScannerError::InvalidParameter(format!(
                "count must be between {} and {}, got {}",
                MIN_COUNT, MAX_COUNT, self.count
            )));
        }

        Ok(ScanParams {
            scanner_type,
            date,
            count: self.count as u16,
            ascending: self.ascending,
            simulation: self.simulation,
        })
    }
}

impl ScanParams {
    /// Date in the wire format.
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let well_formed = raw.len() == 10
        && raw.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        });
    if !well_formed {
        return Err(ScannerError::InvalidParameter(format!(
            "date must be YYYY-MM-DD, got {:?}",
            raw
        )));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| ScannerError::InvalidParameter(format!("invalid date {}: {}", raw, e)))
}
