//! API route handlers
//!
//! - `health`: service info, liveness, readiness and metrics
//! - `analysis`: WordCount and TopWords
//! - `load`: the Loader
//! - `workflows`: upload trigger and synchronous workflow runs

pub mod analysis;
pub mod health;
pub mod load;
pub mod workflows;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// Service name, version and routes.
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Wordstat Server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "POST /word-count",
            "POST /top-words",
            "POST /load",
            "POST /events/upload",
            "POST /workflows/run",
            "GET /health",
            "GET /ready",
            "GET /metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

/// Counts one handled request per component and outcome.
pub(crate) fn record(component: &'static str, success: bool) {
    let outcome = if success { "success" } else { "error" };
    metrics::counter!(
        "wordstat_requests_total",
        "component" => component,
        "outcome" => outcome
    )
    .increment(1);
}
