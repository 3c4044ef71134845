//! Command-line arguments for the scanner CLI.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use std::path::PathBuf;

use clap::Parser;
use scanner_common::config::DEFAULT_CONFIG_FILE;
use scanner_common::request::{DEFAULT_COUNT, DEFAULT_TIMEOUT_MS};
use scanner_common::scanner_type::ScannerType;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Credentials file (`KEY=VALUE` lines).
    #[clap(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Ranking query to run.
    #[clap(long, value_enum, default_value_t = ScannerType::ChangePercentRank)]
    pub scanner_type: ScannerType,

    /// Trading date, `YYYY-MM-DD`. Defaults to today.
    #[clap(long)]
    pub date: Option<String>,

    /// Number of rows, 1..=200.
    #[clap(long, default_value_t = DEFAULT_COUNT)]
    pub count: i64,

    /// Sort ascending by the ranking value.
    #[clap(long)]
    pub ascending: bool,

    /// Use the live environment instead of paper trading.
    #[clap(long)]
    pub live: bool,

    /// CSV output path. Defaults to `stock_scan_{date}.csv`.
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Scan budget handed to the brokerage, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,
}
