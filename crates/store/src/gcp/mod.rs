//! REST clients for the Google Cloud collaborators.
//!
//! Credentials are out of scope: callers hand in an OAuth access token (or
//! none, for emulators) and every request carries it as a bearer token.

mod bigquery;
mod gcs;
mod workflows;

pub use bigquery::{BigQueryTable, BigQueryWarehouse, DEFAULT_BIGQUERY_URL};
pub use gcs::{GcsObjectStore, DEFAULT_STORAGE_URL};
pub use workflows::{CloudWorkflowsClient, DEFAULT_WORKFLOWS_URL};

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode, Url};

use crate::StoreError;

/// Connection settings shared by the REST clients.
#[derive(Debug, Clone)]
pub struct GcpEndpoint {
    pub base_url: String,
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl GcpEndpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One pooled HTTP client plus the endpoint it talks to.
#[derive(Debug, Clone)]
pub(crate) struct RestClient {
    client: reqwest::Client,
    base: Url,
    access_token: Option<String>,
}

impl RestClient {
    pub(crate) fn new(endpoint: &GcpEndpoint) -> Result<Self, StoreError> {
        let base = Url::parse(&endpoint.base_url)
            .map_err(|err| StoreError::Config(format!("invalid base url: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(StoreError::Config(format!(
                "base url cannot hold a path: {}",
                endpoint.base_url
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(endpoint.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base,
            access_token: endpoint.access_token.clone(),
        })
    }

    /// Appends percent-encoded path segments to the base url. A `/` inside a
    /// segment is encoded, so object names keep their slashes.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Config("base url cannot hold a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        self.authorize(self.client.get(url))
    }

    pub(crate) fn post(&self, url: Url) -> RequestBuilder {
        self.authorize(self.client.post(url))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Turns any non-success status into a transport error carrying the body.
pub(crate) async fn ensure_success(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Transport(format!(
        "status {}: {}",
        status.as_u16(),
        body.trim()
    )))
}

pub(crate) fn is_not_found(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND
}
