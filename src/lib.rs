//! Upload-triggered word-frequency pipeline.
//!
//! An upload event reaches the [`TriggerListener`], which filters it and
//! starts one workflow instance. Each instance is run by the
//! [`Orchestrator`]: WordCount and TopWords analyse the object concurrently,
//! their results are merged with the upload metadata, and the [`Loader`]
//! upserts one warehouse row.
//!
//! ```text
//! UploadEvent → TriggerListener → WorkflowStarter ─┐
//!                                                  ▼
//!          ┌──────────── Orchestrator ─────────────┐
//!          │  WordCount ─┐                          │
//!          │             ├─ merge ─→ Loader ─→ Warehouse
//!          │  TopWords ──┘                          │
//!          └────────────────────────────────────────┘
//! ```
//!
//! Every step is safe to repeat, so a duplicated trigger only ever yields
//! one row per object generation.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use wordstat::store::{InMemoryObjectStore, InMemoryWarehouse};
//! use wordstat::{ingest::WorkflowArgument, Pipeline, WorkflowState};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let store = Arc::new(InMemoryObjectStore::new());
//! store.put("b", "a.txt", "the cat sat on the mat the cat ran").unwrap();
//! let warehouse = Arc::new(InMemoryWarehouse::new());
//!
//! let pipeline = Pipeline::builder(store, warehouse.clone()).build();
//! let execution = pipeline
//!     .orchestrator()
//!     .run(WorkflowArgument::new("b", "a.txt"))
//!     .await;
//!
//! assert_eq!(execution.state(), WorkflowState::Completed);
//! assert_eq!(execution.result().unwrap().total_words, 9);
//! assert_eq!(warehouse.len(), 1);
//! # });
//! ```

mod config;
mod engine;
mod error;
mod loader;
mod model;
mod orchestrator;
mod pipeline;
#[cfg(feature = "remote")]
mod remote;
mod steps;
mod top_words;
mod trigger;
mod word_count;

pub use canonical;
pub use ingest;
pub use store;

pub use crate::config::{
    ConfigLoadError, GcpYamlConfig, ObjectStoreBackend, ObjectStoreYamlConfig,
    OrchestratorYamlConfig, StepsMode, WarehouseBackend, WarehouseYamlConfig, WordstatConfig,
    WorkflowEngine, WorkflowYamlConfig,
};
pub use crate::engine::LocalWorkflowEngine;
pub use crate::error::PipelineError;
pub use crate::loader::Loader;
pub use crate::model::{
    AnalysisResult, LoadOutcome, LoadRequest, ProcessingResult, TopWordsResult, UploadMetadata,
    WordCountResult,
};
pub use crate::orchestrator::{
    ErrorReport, Execution, ExecutionReport, Orchestrator, WorkflowState, DEFAULT_STEP_TIMEOUT,
};
pub use crate::pipeline::{Pipeline, PipelineBuilder, DEFAULT_WORKFLOW_NAME};
#[cfg(feature = "remote")]
pub use crate::remote::{HttpSteps, StepEndpoints};
pub use crate::steps::{LocalSteps, PipelineSteps};
pub use crate::top_words::TopWordsService;
pub use crate::trigger::{TriggerListener, TriggerOutcome};
pub use crate::word_count::WordCountService;
