use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Metadata of one stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub bucket: String,
    pub name: String,
    pub size_bytes: u64,
    pub updated: DateTime<Utc>,
    pub generation: Option<String>,
}

/// Read access to the object store.
///
/// Implementations must be safe to call concurrently for the same object.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reads the full object content as text.
    async fn read_text(&self, bucket: &str, path: &str) -> Result<String, StoreError>;
    /// Fetches size, update time, and generation without the content.
    async fn stat(&self, bucket: &str, path: &str) -> Result<ObjectMetadata, StoreError>;
}

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    generation: u64,
    updated: DateTime<Utc>,
}

/// An in-memory object store using a `RwLock` around a `HashMap`.
///
/// Every `put` bumps the object's generation, mirroring how a real bucket
/// versions overwrites.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<(String, String), StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `bytes` and returns the new generation.
    pub fn put(
        &self,
        bucket: &str,
        path: &str,
        bytes: impl Into<Vec<u8>>,
    ) -> Result<String, StoreError> {
        let mut guard = self
            .objects
            .write()
            .map_err(|_| StoreError::transport("poisoned lock"))?;
        let key = (bucket.to_string(), path.to_string());
        let generation = guard.get(&key).map_or(1, |prev| prev.generation + 1);
        guard.insert(
            key,
            StoredObject {
                bytes: bytes.into(),
                generation,
                updated: Utc::now(),
            },
        );
        Ok(generation.to_string())
    }

    pub fn remove(&self, bucket: &str, path: &str) -> Result<bool, StoreError> {
        let mut guard = self
            .objects
            .write()
            .map_err(|_| StoreError::transport("poisoned lock"))?;
        Ok(guard
            .remove(&(bucket.to_string(), path.to_string()))
            .is_some())
    }

    fn get(&self, bucket: &str, path: &str) -> Result<StoredObject, StoreError> {
        let guard = self
            .objects
            .read()
            .map_err(|_| StoreError::transport("poisoned lock"))?;
        guard
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::not_found(bucket, path))
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn read_text(&self, bucket: &str, path: &str) -> Result<String, StoreError> {
        let object = self.get(bucket, path)?;
        Ok(String::from_utf8_lossy(&object.bytes).into_owned())
    }

    async fn stat(&self, bucket: &str, path: &str) -> Result<ObjectMetadata, StoreError> {
        let object = self.get(bucket, path)?;
        Ok(ObjectMetadata {
            bucket: bucket.to_string(),
            name: path.to_string(),
            size_bytes: object.bytes.len() as u64,
            updated: object.updated,
            generation: Some(object.generation.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_read() {
        let store = InMemoryObjectStore::new();
        store.put("b", "a.txt", "hello world").unwrap();

        assert_eq!(store.read_text("b", "a.txt").await.unwrap(), "hello world");
        let meta = store.stat("b", "a.txt").await.unwrap();
        assert_eq!(meta.size_bytes, 11);
        assert_eq!(meta.generation.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn overwrite_bumps_generation() {
        let store = InMemoryObjectStore::new();
        assert_eq!(store.put("b", "a.txt", "one").unwrap(), "1");
        assert_eq!(store.put("b", "a.txt", "two").unwrap(), "2");
        assert_eq!(store.read_text("b", "a.txt").await.unwrap(), "two");
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let store = InMemoryObjectStore::new();
        let err = store.read_text("b", "nope.txt").await.unwrap_err();
        assert_eq!(err, StoreError::not_found("b", "nope.txt"));

        store.put("b", "gone.txt", "x").unwrap();
        assert!(store.remove("b", "gone.txt").unwrap());
        assert!(store.stat("b", "gone.txt").await.is_err());
    }
}
