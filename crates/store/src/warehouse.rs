use std::collections::BTreeMap;
use std::fmt;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Persisted form of one processed file.
///
/// `top_10_words` is JSON text for the table's JSON-typed column.
/// `generation` is stored in a nullable column and takes part in the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseRow {
    pub filename: String,
    pub bucket: String,
    pub size_bytes: u64,
    pub upload_date: DateTime<Utc>,
    pub total_words: u64,
    pub top_10_words: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<String>,
}

impl WarehouseRow {
    pub fn key(&self) -> RowKey {
        let identity = match &self.generation {
            Some(generation) => RowIdentity::Generation(generation.clone()),
            None => RowIdentity::UploadDate(self.upload_date),
        };
        RowKey {
            bucket: self.bucket.clone(),
            filename: self.filename.clone(),
            identity,
        }
    }
}

/// What distinguishes two uploads of the same object name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RowIdentity {
    Generation(String),
    UploadDate(DateTime<Utc>),
}

/// Idempotency key of a warehouse row:
/// `(bucket, filename, generation)`, else `(bucket, filename, upload_date)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey {
    pub bucket: String,
    pub filename: String,
    pub identity: RowIdentity,
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identity {
            RowIdentity::Generation(g) => write!(f, "{}/{}#g{}", self.bucket, self.filename, g),
            RowIdentity::UploadDate(d) => write!(
                f,
                "{}/{}@{}",
                self.bucket,
                self.filename,
                d.to_rfc3339_opts(SecondsFormat::Micros, true)
            ),
        }
    }
}

/// A row the warehouse accepted the call for but refused to store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub index: usize,
    pub reason: String,
    pub message: String,
}

/// Write access to the analytical table.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Inserts or replaces the row for `row.key()`.
    ///
    /// Row-level rejections come back as `Ok(errors)`; only a failure to reach
    /// the warehouse at all is an `Err`.
    async fn upsert(&self, row: &WarehouseRow) -> Result<Vec<RowError>, StoreError>;
}

/// An in-memory table keyed by [`RowKey`]. Useful for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryWarehouse {
    rows: RwLock<BTreeMap<RowKey, WarehouseRow>>,
}

impl InMemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &RowKey) -> Option<WarehouseRow> {
        self.rows.read().ok()?.get(key).cloned()
    }

    /// Snapshot of all rows in key order.
    pub fn rows(&self) -> Vec<WarehouseRow> {
        self.rows
            .read()
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Warehouse for InMemoryWarehouse {
    async fn upsert(&self, row: &WarehouseRow) -> Result<Vec<RowError>, StoreError> {
        if serde_json::from_str::<serde_json::Value>(&row.top_10_words).is_err() {
            return Ok(vec![RowError {
                index: 0,
                reason: "invalid".into(),
                message: "top_10_words is not valid JSON".into(),
            }]);
        }

        let mut guard = self
            .rows
            .write()
            .map_err(|_| StoreError::transport("poisoned lock"))?;
        guard.insert(row.key(), row.clone());
        Ok(Vec::new())
    }
}
