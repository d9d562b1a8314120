//! Results exchanged between the pipeline steps.
//!
//! ```text
//! WordCountResult ─┐
//!                  ├─ AnalysisResult ─┐
//! TopWordsResult ──┘                  ├─ ProcessingResult ─→ WarehouseRow
//!                     UploadMetadata ─┘
//! ```
//!
//! `AnalysisResult` can only be built from both halves, and
//! `ProcessingResult::merge` only takes an `AnalysisResult`, so a result with
//! a missing analysis cannot be constructed.

use canonical::{is_valid_ranking, WordFrequency, TOP_WORDS_LIMIT};
use chrono::{DateTime, NaiveDateTime, Utc};
use ingest::IngestError;
use serde::{Deserialize, Serialize};
use store::{RowError, WarehouseRow};

use crate::PipelineError;

/// WordCount output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCountResult {
    pub total_words: u64,
}

/// TopWords output, most frequent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopWordsResult {
    pub top_10_words: Vec<WordFrequency>,
}

/// Both analysis halves of one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    word_count: WordCountResult,
    top_words: TopWordsResult,
}

impl AnalysisResult {
    pub fn new(word_count: WordCountResult, top_words: TopWordsResult) -> Self {
        Self {
            word_count,
            top_words,
        }
    }

    pub fn total_words(&self) -> u64 {
        self.word_count.total_words
    }

    pub fn top_words(&self) -> &[WordFrequency] {
        &self.top_words.top_10_words
    }
}

/// Facts about the upload itself, from the event or the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub filename: String,
    pub bucket: String,
    pub size_bytes: u64,
    pub upload_date: DateTime<Utc>,
    pub generation: Option<String>,
}

/// The merged record handed to the Loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub filename: String,
    pub bucket: String,
    pub size_bytes: u64,
    pub upload_date: DateTime<Utc>,
    pub total_words: u64,
    pub top_10_words: Vec<WordFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<String>,
}

impl ProcessingResult {
    pub fn merge(metadata: UploadMetadata, analysis: AnalysisResult) -> Self {
        Self {
            filename: metadata.filename,
            bucket: metadata.bucket,
            size_bytes: metadata.size_bytes,
            upload_date: metadata.upload_date,
            total_words: analysis.word_count.total_words,
            top_10_words: analysis.top_words.top_10_words,
            generation: metadata.generation,
        }
    }

    /// Serializes `top_10_words` into the JSON text stored in the warehouse.
    pub fn to_row(&self) -> Result<WarehouseRow, PipelineError> {
        let top_10_words = serde_json::to_string(&self.top_10_words)
            .map_err(|err| PipelineError::Validation(format!("invalid top_10_words: {err}")))?;
        Ok(WarehouseRow {
            filename: self.filename.clone(),
            bucket: self.bucket.clone(),
            size_bytes: self.size_bytes,
            upload_date: self.upload_date,
            total_words: self.total_words,
            top_10_words,
            generation: self.generation.clone(),
        })
    }
}

/// Loader request as received, before the required-field check.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadRequest {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub total_words: Option<u64>,
    #[serde(default)]
    pub top_10_words: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "ingest::opt_string_or_number")]
    pub generation: Option<String>,
}

impl LoadRequest {
    /// Checks every required field and the shape of `top_10_words`.
    ///
    /// `top_10_words` may arrive as a JSON array or as a string holding one;
    /// anything else is rejected rather than stored as-is.
    pub fn validate(self) -> Result<ProcessingResult, IngestError> {
        let filename = non_empty(self.filename);
        let bucket = non_empty(self.bucket);
        let upload_date = non_empty(self.upload_date);

        let mut missing = Vec::new();
        let mut require = |present: bool, name: &str| {
            if !present {
                missing.push(name.to_string());
            }
        };
        require(filename.is_some(), "filename");
        require(bucket.is_some(), "bucket");
        require(self.size_bytes.is_some(), "size_bytes");
        require(upload_date.is_some(), "upload_date");
        require(self.total_words.is_some(), "total_words");
        require(self.top_10_words.is_some(), "top_10_words");

        match (
            filename,
            bucket,
            self.size_bytes,
            upload_date,
            self.total_words,
            self.top_10_words,
        ) {
            (
                Some(filename),
                Some(bucket),
                Some(size_bytes),
                Some(upload_date),
                Some(total_words),
                Some(top_10_words),
            ) => Ok(ProcessingResult {
                filename,
                bucket,
                size_bytes,
                upload_date: parse_upload_date(&upload_date)?,
                total_words,
                top_10_words: parse_top_words(top_10_words)?,
                generation: non_empty(self.generation),
            }),
            _ => Err(IngestError::MissingFields(missing)),
        }
    }
}

impl From<&ProcessingResult> for LoadRequest {
    fn from(result: &ProcessingResult) -> Self {
        Self {
            filename: Some(result.filename.clone()),
            bucket: Some(result.bucket.clone()),
            size_bytes: Some(result.size_bytes),
            upload_date: Some(result.upload_date.to_rfc3339()),
            total_words: Some(result.total_words),
            top_10_words: serde_json::to_value(&result.top_10_words).ok(),
            generation: result.generation.clone(),
        }
    }
}

/// Loader reply. Row-level rejections are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    Success,
    Error { errors: Vec<RowError> },
}

impl LoadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoadOutcome::Success)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_upload_date(raw: &str) -> Result<DateTime<Utc>, IngestError> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date.with_timezone(&Utc));
    }
    // zone-less ISO-8601 is taken as UTC
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| IngestError::invalid_field("upload_date", "expected an ISO-8601 timestamp"))
}

fn parse_top_words(value: serde_json::Value) -> Result<Vec<WordFrequency>, IngestError> {
    let shape_error =
        || IngestError::invalid_field("top_10_words", "expected an ordered list of {word, count}");

    let entries: Vec<WordFrequency> = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value).map_err(|_| shape_error())?,
        serde_json::Value::String(text) => {
            serde_json::from_str(&text).map_err(|_| shape_error())?
        }
        _ => return Err(shape_error()),
    };

    if !is_valid_ranking(&entries, TOP_WORDS_LIMIT) {
        return Err(IngestError::invalid_field(
            "top_10_words",
            "at most 10 entries with count >= 1, sorted by count descending",
        ));
    }
    Ok(entries)
}
