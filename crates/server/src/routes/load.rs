use crate::error::ServerResult;
use crate::routes::record;
use crate::state::ServerState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;
use wordstat::{LoadOutcome, LoadRequest};

/// Upserts one result row.
///
/// Row-level rejections are answered with 500 and the structured
/// `{"status": "error", "errors": [...]}` body, so the caller can tell them
/// apart from an unreachable warehouse (502).
pub async fn load(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> ServerResult<impl IntoResponse> {
    let result = upsert(&state, &body).await;
    let success = matches!(result, Ok(LoadOutcome::Success));
    record("loader", success);

    let outcome = result?;
    let status = if success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(outcome)))
}

async fn upsert(state: &ServerState, body: &[u8]) -> ServerResult<LoadOutcome> {
    let request: LoadRequest = ingest::parse_json(body)?;
    Ok(state.pipeline.loader().handle(request).await?)
}
