use std::sync::Mutex;

use async_trait::async_trait;
use ingest::WorkflowArgument;
use store::{ExecutionId, StoreError, WorkflowStarter};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::{Execution, Orchestrator};

/// Runs workflow instances on the current tokio runtime.
///
/// Stands in for a managed workflow service: `start` returns as soon as the
/// instance is spawned, like an executions API would. Finished instances are
/// reaped on every `start`, so only instances still running (or finished
/// since the last start) are held.
pub struct LocalWorkflowEngine {
    orchestrator: Orchestrator,
    workflow: String,
    running: Mutex<JoinSet<Execution>>,
}

impl LocalWorkflowEngine {
    pub fn new(orchestrator: Orchestrator, workflow: impl Into<String>) -> Self {
        Self {
            orchestrator,
            workflow: workflow.into(),
            running: Mutex::new(JoinSet::new()),
        }
    }

    pub fn workflow(&self) -> &str {
        &self.workflow
    }

    /// Instances not yet finished.
    pub fn in_flight(&self) -> usize {
        self.running
            .lock()
            .map(|mut running| {
                reap(&mut running);
                running.len()
            })
            .unwrap_or(0)
    }

    /// Waits for every instance that has not been reaped yet and returns
    /// them.
    pub async fn drain(&self) -> Result<Vec<Execution>, StoreError> {
        let mut running = {
            let mut guard = self
                .running
                .lock()
                .map_err(|_| StoreError::transport("poisoned lock"))?;
            std::mem::take(&mut *guard)
        };

        let mut finished = Vec::with_capacity(running.len());
        while let Some(joined) = running.join_next().await {
            match joined {
                Ok(execution) => finished.push(execution),
                Err(err) => error!(error = %err, "workflow_task_aborted"),
            }
        }
        Ok(finished)
    }
}

#[async_trait]
impl WorkflowStarter for LocalWorkflowEngine {
    async fn start(
        &self,
        workflow: &str,
        argument: serde_json::Value,
    ) -> Result<ExecutionId, StoreError> {
        if workflow != self.workflow {
            return Err(StoreError::InvalidArgument(format!(
                "unknown workflow {workflow}"
            )));
        }
        let argument: WorkflowArgument = serde_json::from_value(argument)
            .map_err(|err| StoreError::InvalidArgument(format!("workflow argument: {err}")))?;

        let execution_id = Uuid::new_v4().to_string();
        let orchestrator = self.orchestrator.clone();
        let id = execution_id.clone();

        let mut running = self
            .running
            .lock()
            .map_err(|_| StoreError::transport("poisoned lock"))?;
        reap(&mut running);
        running.spawn(async move { orchestrator.run_with_id(id, argument).await });
        drop(running);

        debug!(workflow, %execution_id, "workflow_spawned");
        Ok(ExecutionId(execution_id))
    }
}

/// Drops every finished instance without waiting on the rest.
fn reap(running: &mut JoinSet<Execution>) {
    while let Some(joined) = running.try_join_next() {
        match joined {
            Ok(execution) if execution.error().is_some() => warn!(
                execution_id = %execution.execution_id(),
                state = %execution.state(),
                "workflow_reaped"
            ),
            Ok(execution) => debug!(
                execution_id = %execution.execution_id(),
                state = %execution.state(),
                "workflow_reaped"
            ),
            Err(err) => error!(error = %err, "workflow_task_aborted"),
        }
    }
}

impl std::fmt::Debug for LocalWorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWorkflowEngine")
            .field("workflow", &self.workflow)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LocalSteps, WorkflowState};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use store::{InMemoryObjectStore, InMemoryWarehouse};

    fn engine() -> (Arc<InMemoryWarehouse>, LocalWorkflowEngine) {
        let store = Arc::new(InMemoryObjectStore::new());
        store.put("b", "a.txt", "one two two").unwrap();
        let warehouse = Arc::new(InMemoryWarehouse::new());
        let steps = Arc::new(LocalSteps::new(store.clone(), warehouse.clone()));
        let engine = LocalWorkflowEngine::new(Orchestrator::new(steps, store), "wf");
        (warehouse, engine)
    }

    #[tokio::test]
    async fn started_instance_runs_to_completion() {
        let (warehouse, engine) = engine();
        let id = engine
            .start("wf", json!({"file_path": "a.txt", "bucket_name": "b"}))
            .await
            .unwrap();

        let finished = engine.drain().await.unwrap();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].execution_id(), id.0);
        assert_eq!(finished[0].state(), WorkflowState::Completed);
        assert_eq!(warehouse.len(), 1);
    }

    #[tokio::test]
    async fn malformed_argument_is_rejected_before_spawning() {
        let (_, engine) = engine();
        let err = engine.start("wf", json!({"bucket_name": "b"})).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
        assert!(engine.drain().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn finished_instances_are_released_without_draining() {
        let (warehouse, engine) = engine();
        let argument = json!({"file_path": "a.txt", "bucket_name": "b"});
        for _ in 0..500 {
            engine.start("wf", argument.clone()).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(300)).await;

        engine.start("wf", argument).await.unwrap();
        assert!(engine.running.lock().unwrap().len() <= 1);
        assert_eq!(warehouse.len(), 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(engine.in_flight(), 0);
        assert!(engine.drain().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_workflow_is_rejected() {
        let (_, engine) = engine();
        let err = engine
            .start("other", json!({"file_path": "a.txt", "bucket_name": "b"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }
}
