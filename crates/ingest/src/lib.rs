//! Wordstat Ingest Layer
//!
//! Everything that crosses into the pipeline passes through here first:
//! object-store upload notifications and the JSON bodies of the analysis
//! endpoints. We parse them into typed structures and reject malformed input
//! with a single [`IngestError`], so the services behind this layer never
//! deal with optional fields.
//!
//! ## What we do here
//!
//! - **Filter upload events** - empty paths and directory markers are dropped
//!   silently; they are not errors.
//! - **Build workflow arguments** - bucket and path plus whatever upload
//!   metadata the event already carried.
//! - **Validate analysis requests** - `bucket_name` and `file_path` must be
//!   present and non-empty.
//! - **Log everything** - structured logs via tracing.
//!
//! ## Example
//!
//! ```
//! use ingest::{ingest_event, Dispatch, SkipReason, UploadEvent};
//!
//! let dispatch = ingest_event(UploadEvent::new("b", "folder/")).unwrap();
//! assert_eq!(dispatch, Dispatch::Skip(SkipReason::DirectoryMarker));
//!
//! let dispatch = ingest_event(UploadEvent::new("b", "a.txt")).unwrap();
//! assert!(matches!(dispatch, Dispatch::Start(arg) if arg.file_path == "a.txt"));
//! ```
use std::time::Instant;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

mod error;
mod event;
mod types;

pub use crate::error::IngestError;
pub use crate::event::{skip_reason, Dispatch, SkipReason};
pub use crate::types::{
    opt_string_or_number, ProcessingRequest, RawProcessingRequest, UploadEvent, WorkflowArgument,
};

/// Parses a JSON request body.
///
/// Bodies that are not JSON, not an object, or an empty object are all
/// rejected as [`IngestError::InvalidJson`].
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, IngestError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|err| IngestError::InvalidJson(err.to_string()))?;

    match &value {
        serde_json::Value::Object(map) if !map.is_empty() => {}
        _ => {
            return Err(IngestError::InvalidJson(
                "expected a non-empty JSON object".into(),
            ))
        }
    }

    serde_json::from_value(value).map_err(|err| IngestError::InvalidJson(err.to_string()))
}

/// Checks that an analysis request names both a bucket and an object path.
pub fn validate_request(raw: RawProcessingRequest) -> Result<ProcessingRequest, IngestError> {
    let bucket = non_empty(raw.bucket_name);
    let object_path = non_empty(raw.file_path);

    match (bucket, object_path) {
        (Some(bucket), Some(object_path)) => Ok(ProcessingRequest {
            bucket,
            object_path,
        }),
        _ => {
            warn!(error = %IngestError::MissingRequestFields, "request_rejected");
            Err(IngestError::MissingRequestFields)
        }
    }
}

/// Filters an upload event and, when it names a file, derives the workflow
/// argument for exactly one Orchestrator instance.
pub fn ingest_event(event: UploadEvent) -> Result<Dispatch, IngestError> {
    let start = Instant::now();

    if let Some(reason) = skip_reason(&event) {
        debug!(
            bucket = %event.bucket,
            file_path = %event.object_path,
            reason = %reason,
            "upload_event_skipped"
        );
        return Ok(Dispatch::Skip(reason));
    }

    if event.bucket.trim().is_empty() {
        let err = IngestError::MissingFields(vec!["bucket".into()]);
        warn!(
            file_path = %event.object_path,
            error = %err,
            elapsed_micros = start.elapsed().as_micros(),
            "upload_event_rejected"
        );
        return Err(err);
    }

    let argument = WorkflowArgument::from(&event);
    info!(
        bucket = %argument.bucket_name,
        file_path = %argument.file_path,
        generation = ?argument.generation,
        elapsed_micros = start.elapsed().as_micros(),
        "upload_event_accepted"
    );
    Ok(Dispatch::Start(argument))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_path_is_rejected() {
        let raw: RawProcessingRequest = parse_json(br#"{"bucket_name": "b"}"#).unwrap();
        let err = validate_request(raw).unwrap_err();
        assert_eq!(err.to_string(), "Missing bucket_name or file_path");
    }

    #[test]
    fn blank_values_count_as_missing() {
        let raw: RawProcessingRequest =
            parse_json(br#"{"bucket_name": " ", "file_path": "a.txt"}"#).unwrap();
        assert_eq!(
            validate_request(raw),
            Err(IngestError::MissingRequestFields)
        );
    }

    #[test]
    fn aliases_are_accepted() {
        let raw: RawProcessingRequest =
            parse_json(br#"{"bucket": "b", "objectPath": "a.txt"}"#).unwrap();
        assert_eq!(
            validate_request(raw).unwrap(),
            ProcessingRequest::new("b", "a.txt")
        );
    }

    #[test]
    fn non_json_and_empty_objects_are_invalid() {
        for body in [&b"not json"[..], b"", b"[]", b"{}", b"42"] {
            let result = parse_json::<RawProcessingRequest>(body);
            assert!(
                matches!(result, Err(IngestError::InvalidJson(_))),
                "body {:?} should be rejected",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn wrong_field_type_is_invalid_json() {
        let result = parse_json::<RawProcessingRequest>(br#"{"bucket_name": 5}"#);
        assert!(matches!(result, Err(IngestError::InvalidJson(_))));
    }

    #[test]
    fn event_without_bucket_is_rejected() {
        let err = ingest_event(UploadEvent::new("", "a.txt")).unwrap_err();
        assert_eq!(err, IngestError::MissingFields(vec!["bucket".into()]));
    }

    #[test]
    fn accepted_event_carries_metadata() {
        let event = UploadEvent::new("b", "a.txt")
            .with_generation("9")
            .with_size(34);
        let Dispatch::Start(arg) = ingest_event(event).unwrap() else {
            panic!("expected start");
        };
        assert_eq!(arg.generation.as_deref(), Some("9"));
        assert_eq!(arg.size_bytes, Some(34));
        assert_eq!(arg.request(), ProcessingRequest::new("b", "a.txt"));
    }
}
