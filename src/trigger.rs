use std::sync::Arc;

use ingest::{ingest_event, Dispatch, SkipReason, UploadEvent};
use serde::Serialize;
use store::{ExecutionId, WorkflowStarter};
use tracing::{info, warn};

use crate::PipelineError;

/// What the listener did with one upload event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TriggerOutcome {
    Started { execution_id: ExecutionId },
    Skipped { reason: SkipReason },
}

/// Turns upload events into workflow starts.
///
/// Delivery is at-least-once, so a redelivered event starts a second
/// instance; the Loader's upsert makes that harmless.
#[derive(Clone)]
pub struct TriggerListener {
    starter: Arc<dyn WorkflowStarter>,
    workflow: String,
}

impl TriggerListener {
    pub fn new(starter: Arc<dyn WorkflowStarter>, workflow: impl Into<String>) -> Self {
        Self {
            starter,
            workflow: workflow.into(),
        }
    }

    pub fn workflow(&self) -> &str {
        &self.workflow
    }

    /// Filters the event and starts at most one instance.
    ///
    /// A failed start is returned to the caller so the delivery layer can
    /// redeliver.
    pub async fn handle(&self, event: UploadEvent) -> Result<TriggerOutcome, PipelineError> {
        let argument = match ingest_event(event)? {
            Dispatch::Skip(reason) => {
                metrics::counter!("wordstat_trigger_total", "outcome" => "skipped").increment(1);
                return Ok(TriggerOutcome::Skipped { reason });
            }
            Dispatch::Start(argument) => argument,
        };

        let payload = serde_json::to_value(&argument)
            .map_err(|err| PipelineError::Validation(format!("invalid workflow argument: {err}")))?;

        match self.starter.start(&self.workflow, payload).await {
            Ok(execution_id) => {
                metrics::counter!("wordstat_trigger_total", "outcome" => "started").increment(1);
                info!(
                    workflow = %self.workflow,
                    bucket = %argument.bucket_name,
                    file_path = %argument.file_path,
                    %execution_id,
                    "workflow_start_requested"
                );
                Ok(TriggerOutcome::Started { execution_id })
            }
            Err(err) => {
                metrics::counter!("wordstat_trigger_total", "outcome" => "failed").increment(1);
                warn!(
                    workflow = %self.workflow,
                    bucket = %argument.bucket_name,
                    file_path = %argument.file_path,
                    error = %err,
                    "workflow_start_failed"
                );
                Err(err.into())
            }
        }
    }
}
