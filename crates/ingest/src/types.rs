//! Boundary data model.
//!
//! ```text
//! UploadEvent (object-store notification)
//! ├── bucket
//! ├── object_path            ("name" on the wire)
//! ├── generation?            (string or number)
//! ├── size_bytes?            ("size", string or number)
//! └── upload_date?           ("timeCreated" / "updated")
//!
//!         ↓ ingest_event()
//!
//! WorkflowArgument           (Orchestrator input)
//! ├── file_path, bucket_name
//! └── generation?, size_bytes?, upload_date?
//!
//!         ↓ request()
//!
//! ProcessingRequest          (WordCount / TopWords input)
//! └── bucket_name, file_path
//! ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Notification that one object finished uploading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadEvent {
    #[serde(default)]
    pub bucket: String,

    #[serde(default, rename = "name", alias = "objectPath", alias = "object_path")]
    pub object_path: String,

    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub generation: Option<String>,

    #[serde(
        default,
        rename = "size",
        alias = "size_bytes",
        deserialize_with = "opt_u64_from_string_or_number"
    )]
    pub size_bytes: Option<u64>,

    #[serde(default, rename = "timeCreated", skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl UploadEvent {
    pub fn new(bucket: impl Into<String>, object_path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object_path: object_path.into(),
            generation: None,
            size_bytes: None,
            time_created: None,
            updated: None,
        }
    }

    /// Creation time of the object, falling back to its last update time.
    pub fn upload_date(&self) -> Option<DateTime<Utc>> {
        self.time_created.or(self.updated)
    }

    pub fn with_generation(mut self, generation: impl Into<String>) -> Self {
        self.generation = Some(generation.into());
        self
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    pub fn with_upload_date(mut self, upload_date: DateTime<Utc>) -> Self {
        self.time_created = Some(upload_date);
        self
    }
}

/// Validated input of the analysis steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessingRequest {
    #[serde(rename = "bucket_name")]
    pub bucket: String,
    #[serde(rename = "file_path")]
    pub object_path: String,
}

impl ProcessingRequest {
    pub fn new(bucket: impl Into<String>, object_path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object_path: object_path.into(),
        }
    }

    /// `gs://bucket/path` style location, used in logs.
    pub fn uri(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.object_path)
    }
}

/// Analysis request as received over HTTP, before presence checks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProcessingRequest {
    #[serde(default, alias = "bucket")]
    pub bucket_name: Option<String>,
    #[serde(default, alias = "object_path", alias = "objectPath")]
    pub file_path: Option<String>,
}

/// Argument of one Orchestrator instance.
///
/// Only `file_path` and `bucket_name` are required; the remaining fields carry
/// whatever upload metadata the triggering event already knew.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowArgument {
    #[serde(alias = "objectPath", alias = "object_path")]
    pub file_path: String,
    #[serde(alias = "bucket")]
    pub bucket_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<DateTime<Utc>>,
}

impl WorkflowArgument {
    pub fn new(bucket: impl Into<String>, object_path: impl Into<String>) -> Self {
        Self {
            file_path: object_path.into(),
            bucket_name: bucket.into(),
            generation: None,
            size_bytes: None,
            upload_date: None,
        }
    }

    pub fn request(&self) -> ProcessingRequest {
        ProcessingRequest::new(self.bucket_name.clone(), self.file_path.clone())
    }
}

impl From<&UploadEvent> for WorkflowArgument {
    fn from(event: &UploadEvent) -> Self {
        Self {
            file_path: event.object_path.clone(),
            bucket_name: event.bucket.clone(),
            generation: event.generation.clone(),
            size_bytes: event.size_bytes,
            upload_date: event.upload_date(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

/// Deserializes an optional id sent either as a JSON string or a number.
///
/// Storage notifications and hand-written bodies disagree on the type of
/// `generation`; both end up as the same string.
pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.map(|value| match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }),
    )
}

fn opt_u64_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<StringOrNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StringOrNumber::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(StringOrNumber::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("size must be a non-negative integer")),
    }
}
