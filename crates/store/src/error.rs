use thiserror::Error;

/// Errors surfaced by the collaborator clients.
///
/// `NotFound` is permanent. `Transport` covers every failure to talk to the
/// collaborator at all and is safe to retry at the workflow level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("object gs://{bucket}/{path} not found")]
    NotFound { bucket: String, path: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("invalid store configuration: {0}")]
    Config(String),

    #[error("invalid workflow argument: {0}")]
    InvalidArgument(String),
}

impl StoreError {
    pub fn not_found(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        StoreError::NotFound {
            bucket: bucket.into(),
            path: path.into(),
        }
    }

    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        StoreError::Transport(err.to_string())
    }
}

#[cfg(feature = "gcp")]
impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::InvalidResponse(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::InvalidResponse(err.to_string())
    }
}
