//! Steps invoked over HTTP against independently deployed services.

use std::time::Duration;

use async_trait::async_trait;
use ingest::ProcessingRequest;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    LoadOutcome, PipelineError, PipelineSteps, ProcessingResult, TopWordsResult,
    WordCountResult,
};

/// Endpoints of the deployed step services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEndpoints {
    pub word_count_url: String,
    pub top_words_url: String,
    pub loader_url: String,
}

/// `PipelineSteps` over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpSteps {
    client: reqwest::Client,
    endpoints: StepEndpoints,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpSteps {
    pub fn new(endpoints: StepEndpoints, timeout: Duration) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(PipelineError::transport)?;
        Ok(Self { client, endpoints })
    }

    async fn post<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<(StatusCode, Vec<u8>), PipelineError> {
        debug!(url, "step_request");
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(PipelineError::transport)?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(PipelineError::transport)?;
        Ok((status, bytes.to_vec()))
    }

    async fn call<B, T>(&self, url: &str, body: &B) -> Result<T, PipelineError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let (status, bytes) = self.post(url, body).await?;
        if status.is_success() {
            return serde_json::from_slice(&bytes).map_err(|err| {
                PipelineError::Transport(format!("{url} returned an unreadable body: {err}"))
            });
        }
        Err(status_error(url, status, &bytes))
    }
}

fn status_error(url: &str, status: StatusCode, body: &[u8]) -> PipelineError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string());
    match status {
        StatusCode::BAD_REQUEST => PipelineError::Validation(message),
        StatusCode::NOT_FOUND => PipelineError::NotFound(message),
        _ => PipelineError::Transport(format!(
            "{url} returned {}: {message}",
            status.as_u16()
        )),
    }
}

#[async_trait]
impl PipelineSteps for HttpSteps {
    async fn word_count(
        &self,
        request: &ProcessingRequest,
    ) -> Result<WordCountResult, PipelineError> {
        self.call(&self.endpoints.word_count_url, request).await
    }

    async fn top_words(
        &self,
        request: &ProcessingRequest,
    ) -> Result<TopWordsResult, PipelineError> {
        self.call(&self.endpoints.top_words_url, request).await
    }

    async fn load(&self, result: &ProcessingResult) -> Result<LoadOutcome, PipelineError> {
        let url = self.endpoints.loader_url.as_str();
        let (status, bytes) = self.post(url, result).await?;
        decode_load(url, status, &bytes)
    }
}

/// Reads a Loader reply. A `{status, ...}` body is an outcome whatever the
/// HTTP status, since row rejections are answered with 500.
fn decode_load(url: &str, status: StatusCode, body: &[u8]) -> Result<LoadOutcome, PipelineError> {
    if let Ok(outcome) = serde_json::from_slice::<LoadOutcome>(body) {
        return Ok(outcome);
    }
    Err(status_error(url, status, body))
}
