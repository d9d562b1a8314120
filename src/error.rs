use std::fmt;

use ingest::IngestError;
use store::{RowError, StoreError};
use thiserror::Error;

/// Errors that end a pipeline step.
///
/// | Variant | Cause | Retried by the workflow layer |
/// |---------|-------|-------------------------------|
/// | `Validation` | malformed or incomplete input | never |
/// | `NotFound` | referenced object absent | never |
/// | `Transport` | collaborator unreachable or timed out | yes, whole instance |
/// | `PartialWrite` | warehouse accepted the call, rejected the row | escalated, not retried |
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Transport(String),

    #[error("warehouse rejected the row: {}", RowErrors(.0))]
    PartialWrite(Vec<RowError>),
}

impl PipelineError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "VALIDATION_ERROR",
            PipelineError::NotFound(_) => "NOT_FOUND",
            PipelineError::Transport(_) => "TRANSPORT_ERROR",
            PipelineError::PartialWrite(_) => "PARTIAL_WRITE",
        }
    }

    /// Whether re-running the whole workflow instance may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PipelineError::Transport(_))
    }

    pub fn transport(err: impl fmt::Display) -> Self {
        PipelineError::Transport(err.to_string())
    }
}

impl From<IngestError> for PipelineError {
    fn from(value: IngestError) -> Self {
        PipelineError::Validation(value.to_string())
    }
}

impl From<StoreError> for PipelineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { .. } => PipelineError::NotFound(value.to_string()),
            StoreError::InvalidArgument(_) => PipelineError::Validation(value.to_string()),
            StoreError::Transport(_) | StoreError::InvalidResponse(_) | StoreError::Config(_) => {
                PipelineError::Transport(value.to_string())
            }
        }
    }
}

struct RowErrors<'a>(&'a [RowError]);

impl fmt::Display for RowErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "row {} {}: {}", err.index, err.reason, err.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_taxonomy() {
        let not_found: PipelineError = StoreError::not_found("b", "a.txt").into();
        assert_eq!(not_found.code(), "NOT_FOUND");
        assert!(!not_found.is_transient());

        let transport: PipelineError = StoreError::Transport("connection reset".into()).into();
        assert_eq!(transport.code(), "TRANSPORT_ERROR");
        assert!(transport.is_transient());
    }

    #[test]
    fn validation_keeps_boundary_message() {
        let err: PipelineError = IngestError::MissingRequestFields.into();
        assert_eq!(err.to_string(), "Missing bucket_name or file_path");
    }

    #[test]
    fn partial_write_lists_rows() {
        let err = PipelineError::PartialWrite(vec![RowError {
            index: 0,
            reason: "invalid".into(),
            message: "no such field".into(),
        }]);
        assert_eq!(
            err.to_string(),
            "warehouse rejected the row: row 0 invalid: no such field"
        );
    }
}
