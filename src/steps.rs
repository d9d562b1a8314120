use std::sync::Arc;

use async_trait::async_trait;
use ingest::ProcessingRequest;
use store::{ObjectStore, Warehouse};

use crate::{
    LoadOutcome, Loader, PipelineError, ProcessingResult, TopWordsResult, TopWordsService,
    WordCountResult, WordCountService,
};

/// The three calls an Orchestrator instance makes.
///
/// Each call must be safe to repeat: the analysis steps are pure reads and
/// the load is an upsert.
#[async_trait]
pub trait PipelineSteps: Send + Sync {
    async fn word_count(&self, request: &ProcessingRequest)
        -> Result<WordCountResult, PipelineError>;

    async fn top_words(&self, request: &ProcessingRequest)
        -> Result<TopWordsResult, PipelineError>;

    async fn load(&self, result: &ProcessingResult) -> Result<LoadOutcome, PipelineError>;
}

/// Steps backed by the in-process services.
#[derive(Clone)]
pub struct LocalSteps {
    pub word_count: WordCountService,
    pub top_words: TopWordsService,
    pub loader: Loader,
}

impl LocalSteps {
    pub fn new(store: Arc<dyn ObjectStore>, warehouse: Arc<dyn Warehouse>) -> Self {
        Self {
            word_count: WordCountService::new(store.clone()),
            top_words: TopWordsService::new(store),
            loader: Loader::new(warehouse),
        }
    }
}

#[async_trait]
impl PipelineSteps for LocalSteps {
    async fn word_count(
        &self,
        request: &ProcessingRequest,
    ) -> Result<WordCountResult, PipelineError> {
        self.word_count.count(request).await
    }

    async fn top_words(
        &self,
        request: &ProcessingRequest,
    ) -> Result<TopWordsResult, PipelineError> {
        self.top_words.rank(request).await
    }

    async fn load(&self, result: &ProcessingResult) -> Result<LoadOutcome, PipelineError> {
        self.loader.load(result).await
    }
}
