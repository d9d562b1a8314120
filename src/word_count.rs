use std::sync::Arc;
use std::time::Instant;

use canonical::count_whitespace_tokens;
use ingest::{validate_request, ProcessingRequest, RawProcessingRequest};
use store::ObjectStore;
use tracing::{info, warn};

use crate::{PipelineError, WordCountResult};

/// Counts raw whitespace-delimited tokens of one object.
#[derive(Clone)]
pub struct WordCountService {
    store: Arc<dyn ObjectStore>,
}

impl WordCountService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Validates an HTTP request body and counts.
    pub async fn handle(&self, raw: RawProcessingRequest) -> Result<WordCountResult, PipelineError> {
        let request = validate_request(raw)?;
        self.count(&request).await
    }

    pub async fn count(&self, request: &ProcessingRequest) -> Result<WordCountResult, PipelineError> {
        let start = Instant::now();
        let outcome = self
            .store
            .read_text(&request.bucket, &request.object_path)
            .await
            .map(|text| WordCountResult {
                total_words: count_whitespace_tokens(&text) as u64,
            })
            .map_err(PipelineError::from);

        match &outcome {
            Ok(result) => info!(
                bucket = %request.bucket,
                file_path = %request.object_path,
                total_words = result.total_words,
                elapsed_micros = start.elapsed().as_micros(),
                "word_count_success"
            ),
            Err(err) => warn!(
                bucket = %request.bucket,
                file_path = %request.object_path,
                error = %err,
                elapsed_micros = start.elapsed().as_micros(),
                "word_count_failure"
            ),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::InMemoryObjectStore;

    fn service_with(text: &str) -> WordCountService {
        let store = InMemoryObjectStore::new();
        store.put("b", "a.txt", text).unwrap();
        WordCountService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn counts_raw_tokens() {
        let service = service_with("the cat sat on the mat the cat ran");
        let result = service.count(&ProcessingRequest::new("b", "a.txt")).await.unwrap();
        assert_eq!(result.total_words, 9);
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let service = service_with("x");
        let err = service
            .count(&ProcessingRequest::new("b", "missing.txt"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn missing_path_is_a_validation_error() {
        let service = service_with("x");
        let raw = RawProcessingRequest {
            bucket_name: Some("b".into()),
            file_path: None,
        };
        let err = service.handle(raw).await.unwrap_err();
        assert_eq!(
            err,
            PipelineError::Validation("Missing bucket_name or file_path".into())
        );
    }
}
