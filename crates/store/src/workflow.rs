use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Identifier of one started workflow execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(pub String);

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Starts workflow instances.
#[async_trait]
pub trait WorkflowStarter: Send + Sync {
    /// Starts one instance of `workflow` with a JSON argument.
    async fn start(
        &self,
        workflow: &str,
        argument: serde_json::Value,
    ) -> Result<ExecutionId, StoreError>;
}

/// A starter that only records what it was asked to start.
///
/// Used for dry runs and in tests that assert how many instances a trigger
/// produced.
#[derive(Debug, Default)]
pub struct RecordingWorkflowStarter {
    started: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingWorkflowStarter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&self) -> Vec<(String, serde_json::Value)> {
        self.started
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl WorkflowStarter for RecordingWorkflowStarter {
    async fn start(
        &self,
        workflow: &str,
        argument: serde_json::Value,
    ) -> Result<ExecutionId, StoreError> {
        let mut calls = self
            .started
            .lock()
            .map_err(|_| StoreError::transport("poisoned lock"))?;
        calls.push((workflow.to_string(), argument));
        Ok(ExecutionId(format!("{workflow}/executions/{}", calls.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn records_each_start() {
        let starter = RecordingWorkflowStarter::new();
        let id = starter
            .start("wf", json!({"file_path": "a.txt", "bucket_name": "b"}))
            .await
            .unwrap();
        assert_eq!(id.to_string(), "wf/executions/1");
        assert_eq!(starter.started().len(), 1);
    }
}
