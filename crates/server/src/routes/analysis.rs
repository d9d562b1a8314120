use crate::error::ServerResult;
use crate::routes::record;
use crate::state::ServerState;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use ingest::RawProcessingRequest;
use std::sync::Arc;
use wordstat::{TopWordsResult, WordCountResult};

/// Total whitespace-delimited tokens of one object.
///
/// ```json
/// // Request
/// {"bucket_name": "b", "file_path": "a.txt"}
/// // Response
/// {"total_words": 9}
/// ```
pub async fn word_count(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> ServerResult<Json<WordCountResult>> {
    let result = count(&state, &body).await;
    record("word_count", result.is_ok());
    result.map(Json)
}

/// Ten most frequent normalized words of one object.
///
/// ```json
/// // Request
/// {"bucket_name": "b", "file_path": "a.txt"}
/// // Response
/// {"top_10_words": [{"word": "the", "count": 3}, {"word": "cat", "count": 2}]}
/// ```
pub async fn top_words(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> ServerResult<Json<TopWordsResult>> {
    let result = rank(&state, &body).await;
    record("top_words", result.is_ok());
    result.map(Json)
}

async fn count(state: &ServerState, body: &[u8]) -> ServerResult<WordCountResult> {
    let raw: RawProcessingRequest = ingest::parse_json(body)?;
    Ok(state.pipeline.word_count().handle(raw).await?)
}

async fn rank(state: &ServerState, body: &[u8]) -> ServerResult<TopWordsResult> {
    let raw: RawProcessingRequest = ingest::parse_json(body)?;
    Ok(state.pipeline.top_words().handle(raw).await?)
}
