use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ingest::IngestError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use wordstat::PipelineError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("{0}")]
    Ingest(#[from] IngestError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// HTTP status for a pipeline error. Transport failures are 502.
pub fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
        PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
        PipelineError::Transport(_) => StatusCode::BAD_GATEWAY,
        PipelineError::PartialWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ServerError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Pipeline(err) => status_for(err),
            ServerError::Ingest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::Pipeline(err) => err.code(),
            ServerError::Ingest(_) => "VALIDATION_ERROR",
            ServerError::NotFound => "NOT_FOUND",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();

        let body = match self {
            // row rejections keep the Loader's structured shape
            ServerError::Pipeline(PipelineError::PartialWrite(errors)) => json!({
                "status": "error",
                "errors": errors,
                "error": message,
                "code": code,
            }),
            _ => json!({
                "error": message,
                "code": code,
            }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<wordstat::ConfigLoadError> for ServerError {
    fn from(err: wordstat::ConfigLoadError) -> Self {
        ServerError::Config(err.to_string())
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Config(format!("Invalid address: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_bad_request() {
        let err = ServerError::from(IngestError::MissingRequestFields);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Missing bucket_name or file_path");
    }

    #[test]
    fn transport_is_bad_gateway() {
        let err = ServerError::from(PipelineError::Transport("timed out".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.error_code(), "TRANSPORT_ERROR");
    }

    #[test]
    fn not_found_object_is_404() {
        let err = ServerError::from(PipelineError::NotFound("object gs://b/x not found".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
