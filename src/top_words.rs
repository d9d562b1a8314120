use std::sync::Arc;
use std::time::Instant;

use canonical::{top_words, TOP_WORDS_LIMIT};
use ingest::{validate_request, ProcessingRequest, RawProcessingRequest};
use store::ObjectStore;
use tracing::{info, warn};

use crate::{PipelineError, TopWordsResult};

/// Ranks the most frequent normalized words of one object.
#[derive(Clone)]
pub struct TopWordsService {
    store: Arc<dyn ObjectStore>,
    limit: usize,
}

impl TopWordsService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            limit: TOP_WORDS_LIMIT,
        }
    }

    /// Validates an HTTP request body and ranks.
    pub async fn handle(&self, raw: RawProcessingRequest) -> Result<TopWordsResult, PipelineError> {
        let request = validate_request(raw)?;
        self.rank(&request).await
    }

    pub async fn rank(&self, request: &ProcessingRequest) -> Result<TopWordsResult, PipelineError> {
        let start = Instant::now();
        let outcome = self
            .store
            .read_text(&request.bucket, &request.object_path)
            .await
            .map(|text| TopWordsResult {
                top_10_words: top_words(&text, self.limit),
            })
            .map_err(PipelineError::from);

        match &outcome {
            Ok(result) => info!(
                bucket = %request.bucket,
                file_path = %request.object_path,
                distinct = result.top_10_words.len(),
                top = ?result.top_10_words.first().map(|w| w.word.as_str()),
                elapsed_micros = start.elapsed().as_micros(),
                "top_words_success"
            ),
            Err(err) => warn!(
                bucket = %request.bucket,
                file_path = %request.object_path,
                error = %err,
                elapsed_micros = start.elapsed().as_micros(),
                "top_words_failure"
            ),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canonical::WordFrequency;
    use store::InMemoryObjectStore;

    #[tokio::test]
    async fn ranks_normalized_words() {
        let store = InMemoryObjectStore::new();
        store.put("b", "a.txt", "The cat. THE cat! the end").unwrap();
        let service = TopWordsService::new(Arc::new(store));

        let result = service.rank(&ProcessingRequest::new("b", "a.txt")).await.unwrap();
        assert_eq!(
            result.top_10_words,
            vec![
                WordFrequency::new("the", 3),
                WordFrequency::new("cat", 2),
                WordFrequency::new("end", 1),
            ]
        );
    }

    #[tokio::test]
    async fn unchanged_object_gives_identical_output() {
        let store = InMemoryObjectStore::new();
        store.put("b", "a.txt", "b a c a b d e f g h i j k l").unwrap();
        let service = TopWordsService::new(Arc::new(store));
        let request = ProcessingRequest::new("b", "a.txt");

        let first = serde_json::to_vec(&service.rank(&request).await.unwrap()).unwrap();
        let second = serde_json::to_vec(&service.rank(&request).await.unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
