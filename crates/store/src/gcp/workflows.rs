use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{ensure_success, GcpEndpoint, RestClient};
use crate::{ExecutionId, StoreError, WorkflowStarter};

pub const DEFAULT_WORKFLOWS_URL: &str = "https://workflowexecutions.googleapis.com";

/// Workflow Executions API client.
#[derive(Debug, Clone)]
pub struct CloudWorkflowsClient {
    rest: RestClient,
    project_id: String,
    location: String,
}

#[derive(Debug, Deserialize)]
struct Execution {
    name: String,
}

impl CloudWorkflowsClient {
    pub fn new(
        endpoint: &GcpEndpoint,
        project_id: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            rest: RestClient::new(endpoint)?,
            project_id: project_id.into(),
            location: location.into(),
        })
    }
}

#[async_trait]
impl WorkflowStarter for CloudWorkflowsClient {
    async fn start(
        &self,
        workflow: &str,
        argument: serde_json::Value,
    ) -> Result<ExecutionId, StoreError> {
        let url = self.rest.url(&[
            "v1",
            "projects",
            &self.project_id,
            "locations",
            &self.location,
            "workflows",
            workflow,
            "executions",
        ])?;
        // the API takes the argument as a JSON-encoded string
        let body = json!({ "argument": argument.to_string() });

        let resp = ensure_success(self.rest.post(url).json(&body).send().await?).await?;
        let execution: Execution = resp.json().await?;
        info!(workflow, execution = %execution.name, "workflow_execution_started");
        Ok(ExecutionId(execution.name))
    }
}
