//! Error types shared by the scanner server and CLI.
//!
//! `ScannerError` is the taxonomy every orchestration step reports through. Each
//! variant maps to a distinct outcome at the API boundary, so callers match on the
//! variant rather than on the message. `BrokerError` is what the brokerage SDK seam
//! reports; the session translates it into the matching `ScannerError` variant.
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Unified error type shared by server and CLI.
#[derive(Error, Debug)]
pub enum ScannerError {
    /// The credentials file does not exist.
    #[error("Config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// A credential required by the current step is absent or blank.
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// The brokerage rejected the login.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The brokerage rejected the certificate activation.
    #[error("Certificate activation failed: {0}")]
    CertificateActivationFailed(String),

    /// A scan was attempted before a successful login.
    #[error("Session is not logged in")]
    NotLoggedIn,

    /// The scan call itself failed.
    #[error("Scan failed: {0}")]
    ScanFailed(String),

    /// The brokerage did not answer the scan within the given budget (milliseconds).
    #[error("Scan timed out after {0} ms")]
    ScanTimeout(u64),

    /// Request parameter outside its accepted domain.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// I/O error originating from the standard library or files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while writing CSV output.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Failure reported by a brokerage SDK handle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// The brokerage refused the call (bad credentials, unknown account, etc.).
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The call did not complete within the given budget (milliseconds).
    #[error("timed out after {0} ms")]
    Timeout(u64),

    /// The connection to the brokerage is gone or unusable.
    #[error("disconnected: {0}")]
    Disconnected(String),
}
