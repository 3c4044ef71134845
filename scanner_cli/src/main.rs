//! Scanner CLI — runs a single brokerage scan and saves the rows as CSV.
//!
//! Usage example:
//! ```bash
//! scanner_cli --config ./config.txt --scanner-type VolumeRank --date 2026-01-02 --count 50
//! ```
//!
//! The run follows the same flow as the API server: load credentials, log in, activate
//! the certificate, check the data quota, scan, log out. The quota state is logged
//! before the CSV is written.
#![warn(missing_docs)]
mod args;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Local;
use clap::Parser;
use log::{error, info, warn};
use scanner_common::broker::PaperBroker;
use scanner_common::export::{export_file_name, save_csv};
use scanner_common::observer::LogObserver;
use scanner_common::request::ScanRequest;
use scanner_common::{QuotaLevel, Result, ScanOrchestrator};

use crate::args::Args;

fn main() -> ExitCode {
    init_logger();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let request = ScanRequest {
        scanner_type: args.scanner_type.to_string(),
        date: args
            .date
            .unwrap_or_else(|| Local::now().date_naive().format("%Y-%m-%d").to_string()),
        count: args.count,
        ascending: args.ascending,
        simulation: !args.live,
    };
    let params = request.validate()?;

    let orchestrator = ScanOrchestrator::new(Arc::new(PaperBroker::default()), &args.config)
        .with_timeout_ms(args.timeout_ms);
    let outcome = orchestrator.execute(&params, &LogObserver)?;

    match &outcome.usage {
        Some(usage) => match usage.level() {
            QuotaLevel::Exceeded => warn!(
                "Data quota exhausted ({}/{} bytes); further scans may be refused",
                usage.bytes_used, usage.limit_bytes
            ),
            QuotaLevel::Low => warn!(
                "Data quota nearly exhausted: {:.2}% remaining",
                usage.remaining_percent
            ),
            QuotaLevel::Healthy => info!("Data quota: {:.2}% remaining", usage.remaining_percent),
        },
        None => warn!("Data quota unknown"),
    }

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(export_file_name(&params.date_string())));
    save_csv(&outcome.records, &output)?;
    info!(
        "{} rows in {:.2}s",
        outcome.records.len(),
        outcome.execution_time_secs()
    );
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
