use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{ensure_success, is_not_found, GcpEndpoint, RestClient};
use crate::{ObjectMetadata, ObjectStore, StoreError};

pub const DEFAULT_STORAGE_URL: &str = "https://storage.googleapis.com";

/// Cloud Storage JSON API reader.
#[derive(Debug, Clone)]
pub struct GcsObjectStore {
    rest: RestClient,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectResource {
    bucket: String,
    name: String,
    size: String,
    updated: DateTime<Utc>,
    #[serde(default)]
    generation: Option<String>,
}

impl GcsObjectStore {
    pub fn new(endpoint: &GcpEndpoint) -> Result<Self, StoreError> {
        Ok(Self {
            rest: RestClient::new(endpoint)?,
        })
    }

    async fn fetch(
        &self,
        bucket: &str,
        path: &str,
        media: bool,
    ) -> Result<reqwest::Response, StoreError> {
        let mut url = self.rest.url(&["storage", "v1", "b", bucket, "o", path])?;
        if media {
            url.query_pairs_mut().append_pair("alt", "media");
        }
        debug!(bucket, path, media, "gcs_request");

        let resp = self.rest.get(url).send().await?;
        if is_not_found(resp.status()) {
            return Err(StoreError::not_found(bucket, path));
        }
        ensure_success(resp).await
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn read_text(&self, bucket: &str, path: &str) -> Result<String, StoreError> {
        let resp = self.fetch(bucket, path, true).await?;
        let bytes = resp.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn stat(&self, bucket: &str, path: &str) -> Result<ObjectMetadata, StoreError> {
        let resp = self.fetch(bucket, path, false).await?;
        let resource: ObjectResource = resp.json().await?;
        let size_bytes = resource.size.parse::<u64>().map_err(|err| {
            StoreError::InvalidResponse(format!("object size {:?}: {err}", resource.size))
        })?;

        Ok(ObjectMetadata {
            bucket: resource.bucket,
            name: resource.name,
            size_bytes,
            updated: resource.updated,
            generation: resource.generation,
        })
    }
}
