//! Scan progress reporting.
//!
//! The orchestrator and the session never log on their own. They report each step as
//! a `ScanEvent` to the `ScanObserver` they were handed, and the caller decides where
//! the events go. `LogObserver` forwards them to the `log` facade.
use std::time::Duration;

use chrono::NaiveDate;
use log::{debug, error, info, warn};

use crate::error::ScannerError;
use crate::scanner_type::ScannerType;
use crate::usage::{QuotaLevel, UsageSnapshot};

/// One step of a scan request.
#[derive(Debug)]
pub enum ScanEvent<'a> {
    /// A scan request was accepted.
    Started {
        /// Ranking query.
        scanner_type: ScannerType,
        /// Trading date.
        date: NaiveDate,
        /// Requested rows.
        count: u16,
        /// Sort direction.
        ascending: bool,
        /// Paper-trading environment.
        simulation: bool,
    },
    /// Login succeeded.
    LoggedIn {
        /// Accounts visible to the session.
        accounts: usize,
    },
    /// The signing certificate is active.
    CertificateActivated,
    /// Quota counters were read.
    UsageChecked(&'a UsageSnapshot),
    /// Quota counters could not be read; the scan proceeds without them.
    UsageUnavailable(&'a str),
    /// The scanner returned rows.
    Scanned {
        /// Rows returned.
        records: usize,
    },
    /// The session logged out.
    LoggedOut,
    /// Logout failed; the failure is not propagated.
    LogoutFailed(&'a str),
    /// The request completed.
    Finished {
        /// Rows returned.
        records: usize,
        /// Wall time of the whole request.
        elapsed: Duration,
    },
    /// The request failed at some step.
    Failed(&'a ScannerError),
}

/// Receiver of scan progress events.
pub trait ScanObserver: Send + Sync {
    /// Handle one event.
    fn notify(&self, event: &ScanEvent<'_>);
}

/// Observer that writes every event to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ScanObserver for LogObserver {
    fn notify(&self, event: &ScanEvent<'_>) {
        match event {
            ScanEvent::Started {
                scanner_type,
                date,
                count,
                ascending,
                simulation,
            } => info!(
                "Scan started: type={}, date={}, count={}, ascending={}, simulation={}",
                scanner_type, date, count, ascending, simulation
            ),
            ScanEvent::LoggedIn { accounts } => info!("Logged in, {} account(s)", accounts),
            ScanEvent::CertificateActivated => info!("Certificate activated"),
            ScanEvent::UsageChecked(usage) => match usage.level() {
                QuotaLevel::Exceeded => warn!(
                    "API quota exhausted: {}/{} bytes",
                    usage.bytes_used, usage.limit_bytes
                ),
                QuotaLevel::Low | QuotaLevel::Healthy => info!(
                    "API usage: {}/{} bytes ({:.2}% remaining)",
                    usage.bytes_used, usage.limit_bytes, usage.remaining_percent
                ),
            },
            ScanEvent::UsageUnavailable(reason) => warn!("Usage query failed: {}", reason),
            ScanEvent::Scanned { records } => debug!("Scanner returned {} rows", records),
            ScanEvent::LoggedOut => info!("Logged out"),
            ScanEvent::LogoutFailed(reason) => warn!("Logout failed: {}", reason),
            ScanEvent::Finished { records, elapsed } => info!(
                "Scan finished: {} rows in {:.2}s",
                records,
                elapsed.as_secs_f64()
            ),
            ScanEvent::Failed(err) => error!("Scan failed: {}", err),
        }
    }
}
