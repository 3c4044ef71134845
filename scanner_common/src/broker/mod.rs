//! Brokerage access.
//!
//! - `BrokerApi` — one handle of the vendor trading SDK (login, certificate, quota,
//!   scanner, logout). The SDK is an external collaborator; everything here talks to
//!   it only through this trait.
//! - `BrokerConnector` — hands out a fresh `BrokerApi` per session.
//! - `session` — `Session`, the request-scoped wrapper that owns one handle and logs
//!   out when dropped.
//! - `paper` — `PaperBroker`, a bundled paper-trading environment.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::BrokerError;
use crate::record::ScanRecord;
use crate::scanner_type::ScannerType;
use crate::usage::QuotaStatus;

pub mod paper;
pub mod session;

pub use paper::{PaperBroker, PaperLedger};
pub use session::Session;

/// Brokerage account visible after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Brokerage branch identifier.
    pub broker_id: String,
    /// Account number within the branch.
    pub account_id: String,
    /// Account holder.
    pub username: String,
    /// Stock or futures account.
    pub account_type: String,
}

/// Arguments of one scanner call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanQuery {
    /// Ranking query.
    pub scanner_type: ScannerType,
    /// Trading date.
    pub date: NaiveDate,
    /// Number of rows.
    pub count: u16,
    /// Sort ascending by the ranking value.
    pub ascending: bool,
    /// Budget for the call in milliseconds, enforced by the brokerage.
    pub timeout_ms: u64,
}

/// One handle of the brokerage SDK.
///
/// Calls block until the brokerage answers. A handle is owned by a single session and
/// never shared between requests.
pub trait BrokerApi: Send {
    /// Authenticate and list the accounts of the key holder.
    fn login(&mut self, api_key: &str, secret_key: &str) -> Result<Vec<Account>, BrokerError>;

    /// Activate the order-signing certificate.
    fn activate_ca(&mut self, ca_path: &str, ca_passwd: &str) -> Result<(), BrokerError>;

    /// Current data-transfer counters.
    fn usage(&mut self) -> Result<QuotaStatus, BrokerError>;

    /// Run a ranking scan. `None` means the brokerage had nothing to return.
    fn scanners(&mut self, query: &ScanQuery) -> Result<Option<Vec<ScanRecord>>, BrokerError>;

    /// End the brokerage session.
    fn logout(&mut self) -> Result<(), BrokerError>;
}

/// Factory of SDK handles.
pub trait BrokerConnector: Send + Sync {
    /// Open a handle against the paper (`simulation = true`) or live environment.
    fn connect(&self, simulation: bool) -> Box<dyn BrokerApi>;
}
