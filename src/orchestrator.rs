//! One workflow instance per upload.
//!
//! ```text
//! Started ─→ AwaitingAnalysis ─→ Merging ─→ Loading ─→ Completed
//!    │              │               │          │
//!    └──────────────┴───────────────┴──────────┴─────→ Failed
//! ```
//!
//! The Loader is only reachable from `Merging`, and `Merging` only starts
//! once both analysis halves returned successfully.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ingest::{validate_request, ProcessingRequest, RawProcessingRequest, WorkflowArgument};
use serde::Serialize;
use store::ObjectStore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    AnalysisResult, LoadOutcome, PipelineError, PipelineSteps, ProcessingResult, UploadMetadata,
};

/// Default bound on each step call.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Started,
    AwaitingAnalysis,
    Merging,
    Loading,
    Completed,
    Failed,
}

impl WorkflowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowState::Completed | WorkflowState::Failed)
    }

    pub fn can_transition_to(self, next: WorkflowState) -> bool {
        use WorkflowState::*;
        match (self, next) {
            (Started, AwaitingAnalysis)
            | (AwaitingAnalysis, Merging)
            | (Merging, Loading)
            | (Loading, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowState::Started => "started",
            WorkflowState::AwaitingAnalysis => "awaiting_analysis",
            WorkflowState::Merging => "merging",
            WorkflowState::Loading => "loading",
            WorkflowState::Completed => "completed",
            WorkflowState::Failed => "failed",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finished workflow instance.
#[derive(Debug, Clone)]
pub struct Execution {
    execution_id: String,
    argument: WorkflowArgument,
    trace: Vec<WorkflowState>,
    outcome: Result<ProcessingResult, PipelineError>,
}

impl Execution {
    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    pub fn argument(&self) -> &WorkflowArgument {
        &self.argument
    }

    /// Terminal state.
    pub fn state(&self) -> WorkflowState {
        match self.outcome {
            Ok(_) => WorkflowState::Completed,
            Err(_) => WorkflowState::Failed,
        }
    }

    /// Every state visited, in order, ending with the terminal one.
    pub fn trace(&self) -> &[WorkflowState] {
        &self.trace
    }

    pub fn result(&self) -> Option<&ProcessingResult> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.outcome.as_ref().err()
    }

    pub fn into_result(self) -> Result<ProcessingResult, PipelineError> {
        self.outcome
    }

    pub fn report(&self) -> ExecutionReport {
        ExecutionReport {
            execution_id: self.execution_id.clone(),
            state: self.state(),
            trace: self.trace.clone(),
            result: self.result().cloned(),
            error: self.error().map(|err| ErrorReport {
                error: err.to_string(),
                code: err.code(),
            }),
        }
    }
}

/// Serializable summary of an [`Execution`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub execution_id: String,
    pub state: WorkflowState,
    pub trace: Vec<WorkflowState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ProcessingResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub code: &'static str,
}

/// Runs workflow instances against a set of steps.
///
/// Performs no retries. A failed instance is reported as `Failed` with the
/// originating error and the surrounding engine decides whether to rerun it.
#[derive(Clone)]
pub struct Orchestrator {
    steps: Arc<dyn PipelineSteps>,
    store: Arc<dyn ObjectStore>,
    step_timeout: Duration,
}

impl Orchestrator {
    pub fn new(steps: Arc<dyn PipelineSteps>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            steps,
            store,
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    pub fn with_step_timeout(mut self, step_timeout: Duration) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    pub fn step_timeout(&self) -> Duration {
        self.step_timeout
    }

    pub async fn run(&self, argument: WorkflowArgument) -> Execution {
        self.run_with_id(Uuid::new_v4().to_string(), argument).await
    }

    pub async fn run_with_id(&self, execution_id: String, argument: WorkflowArgument) -> Execution {
        let start = Instant::now();
        let mut run = Run::new(execution_id);
        let outcome = self.drive(&mut run, &argument).await;

        match &outcome {
            Ok(_) => run.advance(WorkflowState::Completed),
            Err(err) => {
                warn!(
                    execution_id = %run.execution_id,
                    state = %run.current(),
                    code = err.code(),
                    error = %err,
                    "workflow_failed"
                );
                run.advance(WorkflowState::Failed);
            }
        }
        metrics::counter!("wordstat_workflow_total", "state" => run.current().as_str())
            .increment(1);
        info!(
            execution_id = %run.execution_id,
            bucket = %argument.bucket_name,
            file_path = %argument.file_path,
            state = %run.current(),
            elapsed_micros = start.elapsed().as_micros(),
            "workflow_finished"
        );

        Execution {
            execution_id: run.execution_id,
            argument,
            trace: run.trace,
            outcome,
        }
    }

    async fn drive(
        &self,
        run: &mut Run,
        argument: &WorkflowArgument,
    ) -> Result<ProcessingResult, PipelineError> {
        let request = validate_request(RawProcessingRequest {
            bucket_name: Some(argument.bucket_name.clone()),
            file_path: Some(argument.file_path.clone()),
        })?;

        run.advance(WorkflowState::AwaitingAnalysis);
        let analysis = self.analyze(&request).await?;

        run.advance(WorkflowState::Merging);
        let metadata = self.resolve_metadata(argument).await?;
        let result = ProcessingResult::merge(metadata, analysis);

        run.advance(WorkflowState::Loading);
        match self.steps.load(&result).await? {
            LoadOutcome::Success => Ok(result),
            LoadOutcome::Error { errors } => Err(PipelineError::PartialWrite(errors)),
        }
    }

    /// Runs both analyses concurrently and waits for both.
    async fn analyze(&self, request: &ProcessingRequest) -> Result<AnalysisResult, PipelineError> {
        let (word_count, top_words) = tokio::join!(
            self.bounded("word_count", self.steps.word_count(request)),
            self.bounded("top_words", self.steps.top_words(request)),
        );
        Ok(AnalysisResult::new(word_count?, top_words?))
    }

    async fn bounded<T>(
        &self,
        step: &str,
        call: impl std::future::Future<Output = Result<T, PipelineError>>,
    ) -> Result<T, PipelineError> {
        tokio::time::timeout(self.step_timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(PipelineError::Transport(format!(
                    "{step} timed out after {}ms",
                    self.step_timeout.as_millis()
                )))
            })
    }

    /// Fills in size and upload date from the object store when the
    /// triggering event did not carry them.
    async fn resolve_metadata(
        &self,
        argument: &WorkflowArgument,
    ) -> Result<UploadMetadata, PipelineError> {
        let (size_bytes, upload_date, generation) = match argument {
            WorkflowArgument {
                size_bytes: Some(size_bytes),
                upload_date: Some(upload_date),
                ..
            } => (*size_bytes, *upload_date, argument.generation.clone()),
            _ => {
                let stat = self
                    .store
                    .stat(&argument.bucket_name, &argument.file_path)
                    .await?;
                (
                    argument.size_bytes.unwrap_or(stat.size_bytes),
                    argument.upload_date.unwrap_or(stat.updated),
                    argument.generation.clone().or(stat.generation),
                )
            }
        };

        Ok(UploadMetadata {
            filename: argument.file_path.clone(),
            bucket: argument.bucket_name.clone(),
            size_bytes,
            upload_date,
            generation,
        })
    }
}

/// In-flight state of one instance.
struct Run {
    execution_id: String,
    trace: Vec<WorkflowState>,
}

impl Run {
    fn new(execution_id: String) -> Self {
        info!(execution_id = %execution_id, state = %WorkflowState::Started, "workflow_started");
        Self {
            execution_id,
            trace: vec![WorkflowState::Started],
        }
    }

    fn current(&self) -> WorkflowState {
        self.trace
            .last()
            .copied()
            .unwrap_or(WorkflowState::Started)
    }

    fn advance(&mut self, next: WorkflowState) {
        let from = self.current();
        debug_assert!(
            from.can_transition_to(next),
            "illegal transition {from} -> {next}"
        );
        info!(execution_id = %self.execution_id, %from, to = %next, "workflow_transition");
        self.trace.push(next);
    }
}
