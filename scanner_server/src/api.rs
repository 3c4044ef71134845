//! REST endpoints of the scanner API.
//!
//! - `GET /` - liveness message
//! - `GET /api/version` - server version
//! - `POST /api/scan` - run a scan, JSON rows
//! - `POST /api/export` - run a scan, CSV download
//!
//! `/api/export` answers 400 for an undecodable body or invalid parameters, the
//! same as `/api/scan`. Any other export failure is a 500.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::error;
use serde::Serialize;
use serde_json::json;

use scanner_common::export::{BOM, export_file_name, format_csv};
use scanner_common::observer::LogObserver;
use scanner_common::request::ScanRequest;
use scanner_common::{QuotaLevel, ScanOrchestrator, ScanOutcome, ScanRecord, ScannerError};

// ============================================================================
// API Types
// ============================================================================

/// Error payload.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Human-readable reason.
    pub detail: String,
}

impl ApiError {
    fn response(status: StatusCode, detail: impl Into<String>) -> Response {
        (
            status,
            Json(ApiError {
                detail: detail.into(),
            }),
        )
            .into_response()
    }
}

/// Successful scan payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    /// Always `success`.
    pub status: &'static str,
    /// Scan rows.
    pub data: Vec<ScanRecord>,
    /// Number of rows.
    pub total_count: usize,
    /// Seconds spent on the request.
    pub execution_time: f64,
    /// Low-quota notice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Payload returned once the data quota is used up.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaExceededResponse {
    /// Quota notice.
    pub detail: String,
    /// Bytes consumed.
    pub bytes_used: i64,
    /// Byte budget.
    pub limit_bytes: i64,
}

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers.
pub struct AppState {
    orchestrator: ScanOrchestrator,
}

impl AppState {
    /// State serving scans through `orchestrator`.
    pub fn new(orchestrator: ScanOrchestrator) -> Self {
        Self { orchestrator }
    }
}

// ============================================================================
// Status mapping
// ============================================================================

/// HTTP status for a failed scan request.
pub fn status_for(err: &ScannerError) -> StatusCode {
    match err {
        ScannerError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        ScannerError::ScanTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &ScannerError) -> Response {
    let status = status_for(err);
    let detail = match err {
        ScannerError::ConfigNotFound(_) => format!("Config file error: {}", err),
        ScannerError::InvalidParameter(_) => err.to_string(),
        ScannerError::ScanTimeout(_) => "Scan timed out, please try again later".to_string(),
        _ => format!("Scan failed: {}", err),
    };
    ApiError::response(status, detail)
}

/// Build the `/api/scan` response, applying the quota policy.
pub fn scan_response(outcome: ScanOutcome) -> Response {
    let mut body = ScanResponse {
        status: "success",
        total_count: outcome.records.len(),
        execution_time: outcome.execution_time_secs(),
        data: outcome.records,
        warning: None,
    };

    let Some(usage) = outcome.usage else {
        return (StatusCode::OK, Json(body)).into_response();
    };
    match usage.level() {
        QuotaLevel::Exceeded => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(QuotaExceededResponse {
                detail: usage.warning.clone().unwrap_or_else(|| {
                    format!("quota exceeded: {}/{}", usage.bytes_used, usage.limit_bytes)
                }),
                bytes_used: usage.bytes_used,
                limit_bytes: usage.limit_bytes,
            }),
        )
            .into_response(),
        QuotaLevel::Low => {
            body.warning = Some(format!(
                "quota nearly exhausted: {:.2}% remaining",
                usage.remaining_percent
            ));
            (StatusCode::PARTIAL_CONTENT, Json(body)).into_response()
        }
        QuotaLevel::Healthy => (StatusCode::OK, Json(body)).into_response(),
    }
}

// ============================================================================
// API Handlers
// ============================================================================

async fn run_scan(state: &AppState, request: ScanRequest) -> Result<ScanOutcome, ScannerError> {
    let params = request.validate()?;
    let orchestrator = state.orchestrator.clone();
    tokio::task::spawn_blocking(move || orchestrator.execute(&params, &LogObserver))
        .await
        .map_err(|e| ScannerError::ScanFailed(format!("scan task aborted: {}", e)))?
}

/// GET / - Liveness message.
async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Stock Scanner API is running" }))
}

/// GET /api/version - Server version.
async fn version() -> Json<serde_json::Value> {
    Json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

/// POST /api/scan - Run a scan and return the rows.
async fn scan_stocks(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(request) => request,
        Err(rejection) => return ApiError::response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    match run_scan(&state, request).await {
        Ok(outcome) => scan_response(outcome),
        Err(err) => {
            error!("Scan request failed: {}", err);
            error_response(&err)
        }
    }
}

/// POST /api/export - Run a scan and return the rows as a CSV download.
async fn export_csv(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(request) => request,
        Err(rejection) => return ApiError::response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    let date = request.date.clone();

    let csv = match run_scan(&state, request).await {
        Ok(outcome) => format_csv(&outcome.records),
        Err(err) => Err(err),
    };
    match csv {
        Ok(text) => {
            let body = if text.is_empty() { BOM.to_string() } else { text };
            let disposition = format!("attachment; filename={}", export_file_name(&date));
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
        Err(ScannerError::InvalidParameter(msg)) => {
            ApiError::response(StatusCode::BAD_REQUEST, format!("Invalid parameter: {}", msg))
        }
        Err(err) => {
            error!("CSV export failed: {}", err);
            ApiError::response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("CSV export failed: {}", err),
            )
        }
    }
}

/// Create the API router with all endpoints.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/version", get(version))
        .route("/api/scan", post(scan_stocks))
        .route("/api/export", post(export_csv))
        .with_state(state)
}
