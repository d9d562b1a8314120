//! Error types produced at the pipeline boundary.
//!
//! Every variant is a client-caused validation failure: the request or event
//! as delivered can never succeed, so nothing in the pipeline retries it.
//! The `Display` strings double as the `error` field of HTTP error bodies and
//! match what existing callers of the functions already parse.
//!
//! # HTTP Status Code Mapping
//!
//! ```rust
//! use ingest::IngestError;
//!
//! fn to_http_status(_error: &IngestError) -> u16 {
//!     400 // all boundary errors are Bad Request
//! }
//! ```
use thiserror::Error;

/// Errors raised while parsing and validating boundary payloads.
///
/// # Examples
///
/// ```rust
/// use ingest::IngestError;
///
/// let err = IngestError::MissingRequestFields;
/// assert_eq!(err.to_string(), "Missing bucket_name or file_path");
///
/// let err = IngestError::MissingFields(vec!["filename".into(), "upload_date".into()]);
/// assert_eq!(
///     err.to_string(),
///     "Missing required fields in payload: filename, upload_date"
/// );
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// Body is not JSON, not an object, or an empty object. The parser
    /// detail is kept for logs but not shown to callers.
    #[error("Invalid JSON payload")]
    InvalidJson(String),

    /// An analysis request lacks its bucket or object path.
    #[error("Missing bucket_name or file_path")]
    MissingRequestFields,

    /// A load request lacks one or more required fields.
    #[error("Missing required fields in payload: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// A field is present but has the wrong shape.
    #[error("invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

impl IngestError {
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        IngestError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_json_hides_parser_detail() {
        let err = IngestError::InvalidJson("expected value at line 1 column 1".into());
        assert_eq!(err.to_string(), "Invalid JSON payload");
    }

    #[test]
    fn invalid_field_names_the_field() {
        let err = IngestError::invalid_field("upload_date", "not RFC 3339");
        assert_eq!(err.to_string(), "invalid upload_date: not RFC 3339");
    }
}
