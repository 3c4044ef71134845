//! Result type alias shared across the workspace.
//!
//! Defaults the error type to `ScannerError`, so functions can simply return `Result<T>`.
use crate::error::ScannerError;

/// Workspace-wide `Result` alias with `ScannerError` as the default error.
pub type Result<T, E = ScannerError> = std::result::Result<T, E>;
