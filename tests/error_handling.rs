use std::sync::Arc;

use async_trait::async_trait;
use wordstat::ingest::{UploadEvent, WorkflowArgument};
use wordstat::store::{
    ExecutionId, InMemoryObjectStore, InMemoryWarehouse, RowError, StoreError, Warehouse,
    WarehouseRow, WorkflowStarter,
};
use wordstat::{Pipeline, PipelineError, WorkflowState};

struct FullTable;

#[async_trait]
impl Warehouse for FullTable {
    async fn upsert(&self, _row: &WarehouseRow) -> Result<Vec<RowError>, StoreError> {
        Ok(vec![RowError {
            index: 0,
            reason: "quotaExceeded".into(),
            message: "table is full".into(),
        }])
    }
}

struct Offline;

#[async_trait]
impl Warehouse for Offline {
    async fn upsert(&self, _row: &WarehouseRow) -> Result<Vec<RowError>, StoreError> {
        Err(StoreError::transport("connection refused"))
    }
}

#[async_trait]
impl WorkflowStarter for Offline {
    async fn start(
        &self,
        _workflow: &str,
        _argument: serde_json::Value,
    ) -> Result<ExecutionId, StoreError> {
        Err(StoreError::transport("executions API unavailable"))
    }
}

fn store_with_object() -> Arc<InMemoryObjectStore> {
    let store = Arc::new(InMemoryObjectStore::new());
    store.put("b", "a.txt", "some text").unwrap();
    store
}

#[tokio::test]
async fn missing_object_fails_the_instance() {
    let pipeline = Pipeline::builder(store_with_object(), Arc::new(InMemoryWarehouse::new())).build();

    let execution = pipeline
        .orchestrator()
        .run(WorkflowArgument::new("b", "deleted.txt"))
        .await;

    assert_eq!(execution.state(), WorkflowState::Failed);
    assert!(matches!(execution.error(), Some(PipelineError::NotFound(_))));
    assert!(!execution.trace().contains(&WorkflowState::Loading));
}

#[tokio::test]
async fn row_rejection_is_surfaced_as_partial_write() {
    let pipeline = Pipeline::builder(store_with_object(), Arc::new(FullTable)).build();

    let execution = pipeline
        .orchestrator()
        .run(WorkflowArgument::new("b", "a.txt"))
        .await;

    let err = execution.into_result().unwrap_err();
    assert_eq!(err.code(), "PARTIAL_WRITE");
    assert!(!err.is_transient());
    assert!(err.to_string().contains("table is full"));
}

#[tokio::test]
async fn unreachable_warehouse_is_transient() {
    let pipeline = Pipeline::builder(store_with_object(), Arc::new(Offline)).build();

    let execution = pipeline
        .orchestrator()
        .run(WorkflowArgument::new("b", "a.txt"))
        .await;

    assert_eq!(
        execution.trace().last(),
        Some(&WorkflowState::Failed)
    );
    assert!(execution.error().is_some_and(PipelineError::is_transient));
}

#[tokio::test]
async fn failed_start_reaches_the_caller() {
    let pipeline = Pipeline::builder(store_with_object(), Arc::new(InMemoryWarehouse::new()))
        .workflow_starter(Arc::new(Offline))
        .build();

    let err = pipeline
        .trigger()
        .handle(UploadEvent::new("b", "a.txt"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "TRANSPORT_ERROR");
}

#[tokio::test]
async fn validation_errors_are_not_transient() {
    let pipeline = Pipeline::builder(store_with_object(), Arc::new(InMemoryWarehouse::new())).build();
    let raw = wordstat::ingest::RawProcessingRequest {
        bucket_name: Some("b".into()),
        file_path: None,
    };

    let err = pipeline.top_words().handle(raw).await.unwrap_err();
    assert_eq!(err.to_string(), "Missing bucket_name or file_path");
    assert!(!err.is_transient());
}
