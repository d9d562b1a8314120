use std::sync::Arc;
use std::time::Duration;

use store::{ObjectStore, Warehouse, WorkflowStarter};

use crate::{
    LocalSteps, LocalWorkflowEngine, Loader, Orchestrator, PipelineSteps, TopWordsService,
    TriggerListener, WordCountService, DEFAULT_STEP_TIMEOUT,
};

pub const DEFAULT_WORKFLOW_NAME: &str = "file-processing-workflow";

/// Every component wired to one set of collaborators.
///
/// Clients are created once per process and shared by all components.
#[derive(Clone)]
pub struct Pipeline {
    word_count: WordCountService,
    top_words: TopWordsService,
    loader: Loader,
    orchestrator: Orchestrator,
    trigger: TriggerListener,
    engine: Option<Arc<LocalWorkflowEngine>>,
}

impl Pipeline {
    pub fn builder(store: Arc<dyn ObjectStore>, warehouse: Arc<dyn Warehouse>) -> PipelineBuilder {
        PipelineBuilder {
            store,
            warehouse,
            steps: None,
            starter: None,
            workflow_name: DEFAULT_WORKFLOW_NAME.to_string(),
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    pub fn word_count(&self) -> &WordCountService {
        &self.word_count
    }

    pub fn top_words(&self) -> &TopWordsService {
        &self.top_words
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn trigger(&self) -> &TriggerListener {
        &self.trigger
    }

    /// The in-process engine, when workflow starts are run locally.
    pub fn engine(&self) -> Option<&Arc<LocalWorkflowEngine>> {
        self.engine.as_ref()
    }
}

pub struct PipelineBuilder {
    store: Arc<dyn ObjectStore>,
    warehouse: Arc<dyn Warehouse>,
    steps: Option<Arc<dyn PipelineSteps>>,
    starter: Option<Arc<dyn WorkflowStarter>>,
    workflow_name: String,
    step_timeout: Duration,
}

impl PipelineBuilder {
    /// Steps used by the orchestrator. Defaults to the in-process services.
    pub fn steps(mut self, steps: Arc<dyn PipelineSteps>) -> Self {
        self.steps = Some(steps);
        self
    }

    /// Where the trigger starts instances. Defaults to a [`LocalWorkflowEngine`].
    pub fn workflow_starter(mut self, starter: Arc<dyn WorkflowStarter>) -> Self {
        self.starter = Some(starter);
        self
    }

    pub fn workflow_name(mut self, name: impl Into<String>) -> Self {
        self.workflow_name = name.into();
        self
    }

    pub fn step_timeout(mut self, step_timeout: Duration) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    pub fn build(self) -> Pipeline {
        let local = LocalSteps::new(self.store.clone(), self.warehouse.clone());
        let steps = self
            .steps
            .unwrap_or_else(|| Arc::new(local.clone()) as Arc<dyn PipelineSteps>);
        let orchestrator =
            Orchestrator::new(steps, self.store).with_step_timeout(self.step_timeout);

        let (starter, engine) = match self.starter {
            Some(starter) => (starter, None),
            None => {
                let engine = Arc::new(LocalWorkflowEngine::new(
                    orchestrator.clone(),
                    self.workflow_name.clone(),
                ));
                (engine.clone() as Arc<dyn WorkflowStarter>, Some(engine))
            }
        };

        Pipeline {
            word_count: local.word_count,
            top_words: local.top_words,
            loader: local.loader,
            orchestrator,
            trigger: TriggerListener::new(starter, self.workflow_name),
            engine,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest::UploadEvent;
    use store::{InMemoryObjectStore, InMemoryWarehouse, RecordingWorkflowStarter};

    #[tokio::test]
    async fn custom_starter_replaces_the_local_engine() {
        let starter = Arc::new(RecordingWorkflowStarter::new());
        let pipeline = Pipeline::builder(
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(InMemoryWarehouse::new()),
        )
        .workflow_starter(starter.clone())
        .workflow_name("nightly")
        .build();

        assert!(pipeline.engine().is_none());
        pipeline
            .trigger()
            .handle(UploadEvent::new("b", "a.txt"))
            .await
            .unwrap();
        assert_eq!(starter.started()[0].0, "nightly");
    }

    #[test]
    fn step_timeout_reaches_the_orchestrator() {
        let pipeline = Pipeline::builder(
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(InMemoryWarehouse::new()),
        )
        .step_timeout(Duration::from_secs(3))
        .build();
        assert_eq!(
            pipeline.orchestrator().step_timeout(),
            Duration::from_secs(3)
        );
    }
}
