//! Stock scanner HTTP API.
//!
//! Exposes the brokerage scanner over HTTP. Each request runs one blocking scan
//! orchestration (config load, login, certificate, usage check, scan, logout) on the
//! blocking thread pool and maps the outcome to a status code:
//!
//! - `POST /api/scan` — JSON rows; `206` with a warning when under 10% of the data
//!   quota is left, `429` once the quota is used up.
//! - `POST /api/export` — the same scan as a BOM-prefixed CSV download.
//! - `GET /api/version`, `GET /` — version and liveness.
//!
//! The bundled paper broker stands in for the vendor SDK. Its quota ledger lives as
//! long as the process.
#![warn(missing_docs)]
mod api;
mod args;

use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use clap::Parser;
use log::{info, warn};
use scanner_common::broker::{PaperBroker, PaperLedger};
use scanner_common::{Result, ScanOrchestrator, ScannerError};
use tower_http::cors::CorsLayer;

use crate::api::AppState;
use crate::args::Args;

#[tokio::main]
async fn main() -> Result<(), ScannerError> {
    init_logger();
    let args = Args::parse();

    let broker = PaperBroker::new(PaperLedger::new(args.quota_bytes));
    let orchestrator =
        ScanOrchestrator::new(Arc::new(broker), &args.config).with_timeout_ms(args.timeout_ms);
    if !orchestrator.config_path().exists() {
        warn!(
            "Config file {} does not exist yet; scans will fail until it is created",
            orchestrator.config_path().display()
        );
    }

    let origin = args.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ScannerError::InvalidParameter(format!("invalid CORS origin {}: {}", args.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let app = api::create_router(Arc::new(AppState::new(orchestrator))).layer(cors);
    let listener = tokio::net::TcpListener::bind(args.bind_address()).await?;
    info!("Scanner API listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Scanner API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C received. Shutting down server...");
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
