use crate::error::{status_for, ServerResult};
use crate::routes::record;
use crate::state::ServerState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use ingest::{validate_request, RawProcessingRequest, UploadEvent, WorkflowArgument};
use serde::Deserialize;
use std::sync::Arc;
use wordstat::{ExecutionReport, TriggerOutcome};

/// Upload notification push endpoint.
///
/// Accepts the object resource of a storage notification
/// (`bucket`, `name`, `generation`, `size`, `timeCreated`, `updated`).
/// Any non-2xx answer makes the delivery layer redeliver, so a failed
/// workflow start is returned as an error rather than acknowledged.
pub async fn upload_event(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> ServerResult<impl IntoResponse> {
    let result = trigger(&state, &body).await;
    record("trigger", result.is_ok());

    let outcome = result?;
    let status = match outcome {
        TriggerOutcome::Started { .. } => StatusCode::ACCEPTED,
        TriggerOutcome::Skipped { .. } => StatusCode::OK,
    };
    Ok((status, Json(outcome)))
}

async fn trigger(state: &ServerState, body: &[u8]) -> ServerResult<TriggerOutcome> {
    let event: UploadEvent = ingest::parse_json(body)?;
    Ok(state.pipeline.trigger().handle(event).await?)
}

/// Body of `POST /workflows/run`.
#[derive(Debug, Deserialize)]
pub struct RunRequest {
    #[serde(flatten)]
    pub request: RawProcessingRequest,

    #[serde(default)]
    pub generation: Option<String>,

    #[serde(default)]
    pub size_bytes: Option<u64>,

    #[serde(default)]
    pub upload_date: Option<DateTime<Utc>>,
}

/// Runs one workflow instance to completion and returns its report.
///
/// 200 when it completed; on failure the status follows the originating
/// error and the report carries it.
pub async fn run_workflow(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> ServerResult<impl IntoResponse> {
    let run: RunRequest = ingest::parse_json(&body)?;
    let request = validate_request(run.request)?;

    let argument = WorkflowArgument {
        file_path: request.object_path,
        bucket_name: request.bucket,
        generation: run.generation,
        size_bytes: run.size_bytes,
        upload_date: run.upload_date,
    };

    let execution = state.pipeline.orchestrator().run(argument).await;
    record("orchestrator", execution.error().is_none());

    let status = execution.error().map_or(StatusCode::OK, status_for);
    let report: ExecutionReport = execution.report();
    Ok((status, Json(report)))
}
