//! Command-line arguments for the scanner API server.
use std::path::PathBuf;

use clap::Parser;
use scanner_common::broker::paper::DEFAULT_DAILY_LIMIT_BYTES;
use scanner_common::config::DEFAULT_CONFIG_FILE;
use scanner_common::request::DEFAULT_TIMEOUT_MS;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Interface to bind.
    #[clap(long, default_value = "0.0.0.0")]
    pub host: String,

    /// TCP port to listen on.
    #[clap(long, default_value_t = 8000)]
    pub port: u16,

    /// Credentials file (`KEY=VALUE` lines).
    #[clap(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Scan budget handed to the brokerage, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Daily data-transfer budget of the paper account, in bytes.
    #[clap(long, default_value_t = DEFAULT_DAILY_LIMIT_BYTES)]
    pub quota_bytes: i64,

    /// Frontend origin allowed by CORS.
    #[clap(long, default_value = "http://localhost:5173")]
    pub cors_origin: String,
}

impl Args {
    /// Socket address string like "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
