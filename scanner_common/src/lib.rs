//!
//! Brokerage stock-scanner core shared by the scanner server and CLI.
//!
//! This crate aggregates:
//! - `error` — `ScannerError` taxonomy and the SDK-level `BrokerError`.
//! - `result` — handy `Result<T, ScannerError>` alias.
//! - `config` — `KEY=VALUE` credentials file loader.
//! - `scanner_type` — ranking queries the scanner supports.
//! - `record` — open-shaped scan rows.
//! - `usage` — data-transfer quota classification.
//! - `request` — scan request payload and validation.
//! - `export` — BOM-prefixed CSV export.
//! - `observer` — scan progress events and the `log`-backed observer.
//! - `broker` — SDK seam, request-scoped session and the paper-trading broker.
//! - `orchestrator` — the scan request flow.
#![warn(missing_docs)]
pub mod broker;
pub mod config;
pub mod error;
pub mod export;
pub mod observer;
pub mod orchestrator;
pub mod record;
pub mod request;
pub mod result;
pub mod scanner_type;
pub mod usage;

pub use error::{BrokerError, ScannerError};
pub use orchestrator::{ScanOrchestrator, ScanOutcome};
pub use record::{FieldValue, ScanRecord};
pub use result::Result;
pub use usage::{QuotaLevel, UsageSnapshot};
