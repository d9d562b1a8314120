//! Collaborator seams of the wordstat pipeline.
//!
//! Three traits, each the narrowest interface the pipeline needs:
//!
//! - [`ObjectStore`]: read an object's text and metadata.
//! - [`Warehouse`]: upsert one result row, reporting row-level rejections as
//!   data.
//! - [`WorkflowStarter`]: start one workflow instance with a JSON argument.
//!
//! In-memory implementations live next to each trait. The Cloud Storage,
//! BigQuery, and Workflow Executions clients sit behind the `gcp` feature.
//! Clients are built once per process and shared behind `Arc<dyn _>`.

mod error;
mod object;
mod warehouse;
mod workflow;

#[cfg(feature = "gcp")]
pub mod gcp;

pub use crate::error::StoreError;
pub use crate::object::{InMemoryObjectStore, ObjectMetadata, ObjectStore};
pub use crate::warehouse::{
    InMemoryWarehouse, RowError, RowIdentity, RowKey, Warehouse, WarehouseRow,
};
pub use crate::workflow::{ExecutionId, RecordingWorkflowStarter, WorkflowStarter};
