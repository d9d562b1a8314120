//! YAML configuration for the pipeline.
//!
//! Every field has a default, so an empty document gives a fully in-memory
//! pipeline. A deployment against Google Cloud looks like:
//!
//! ```yaml
//! version: "1.0"
//!
//! gcp:
//!   project_id: "my-project"
//!   access_token_env: "GOOGLE_OAUTH_ACCESS_TOKEN"
//!   timeout_secs: 30
//!
//! object_store:
//!   backend: "gcs"
//!
//! warehouse:
//!   backend: "bigquery"
//!   dataset: "file_processing_dataset"
//!   table: "file_processing_results"
//!
//! workflow:
//!   engine: "cloud"
//!   name: "file-processing-workflow"
//!   location: "us-central1"
//!
//! orchestrator:
//!   steps: "http"
//!   step_timeout_secs: 60
//!   word_count_url: "https://word-count.example.run.app"
//!   top_words_url: "https://top-words.example.run.app"
//!   loader_url: "https://loader.example.run.app"
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use store::{InMemoryObjectStore, InMemoryWarehouse, ObjectStore, Warehouse};
use thiserror::Error;

use crate::{LocalSteps, Pipeline, PipelineSteps};

/// Errors that can occur when loading or applying a configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("failed to build pipeline: {0}")]
    Build(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordstatConfig {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub gcp: GcpYamlConfig,

    #[serde(default)]
    pub object_store: ObjectStoreYamlConfig,

    #[serde(default)]
    pub warehouse: WarehouseYamlConfig,

    #[serde(default)]
    pub workflow: WorkflowYamlConfig,

    #[serde(default)]
    pub orchestrator: OrchestratorYamlConfig,
}

impl WordstatConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        // an empty document parses as null
        let config: WordstatConfig = if yaml.trim().is_empty() {
            WordstatConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }

        if self.gcp.timeout_secs == 0 {
            return Err(invalid("gcp.timeout_secs must be greater than zero"));
        }
        if self.orchestrator.step_timeout_secs == 0 {
            return Err(invalid("orchestrator.step_timeout_secs must be greater than zero"));
        }
        if self.workflow.name.trim().is_empty() {
            return Err(invalid("workflow.name must not be empty"));
        }

        if self.object_store.backend == ObjectStoreBackend::Gcs {
            require_gcp("object_store.backend: gcs")?;
            if self.object_store.base_url.trim().is_empty() {
                return Err(invalid("object_store.base_url must not be empty"));
            }
        }

        if self.warehouse.backend == WarehouseBackend::Bigquery {
            require_gcp("warehouse.backend: bigquery")?;
            self.project_id("warehouse.backend: bigquery")?;
            if self.warehouse.dataset.trim().is_empty() || self.warehouse.table.trim().is_empty() {
                return Err(invalid("warehouse.dataset and warehouse.table must not be empty"));
            }
        }

        if self.workflow.engine == WorkflowEngine::Cloud {
            require_gcp("workflow.engine: cloud")?;
            self.project_id("workflow.engine: cloud")?;
            if self.workflow.location.trim().is_empty() {
                return Err(invalid("workflow.location must not be empty"));
            }
        }

        if self.orchestrator.steps == StepsMode::Http {
            if !cfg!(feature = "remote") {
                return Err(invalid(
                    "orchestrator.steps: http requires the `remote` feature",
                ));
            }
            for (name, url) in [
                ("word_count_url", &self.orchestrator.word_count_url),
                ("top_words_url", &self.orchestrator.top_words_url),
                ("loader_url", &self.orchestrator.loader_url),
            ] {
                if url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                    return Err(invalid(format!(
                        "orchestrator.{name} is required when steps is http"
                    )));
                }
            }
            // `stat` runs in-process and must see the objects the remote steps read
            if self.object_store.backend != ObjectStoreBackend::Gcs {
                return Err(invalid(
                    "orchestrator.steps: http requires object_store.backend: gcs",
                ));
            }
        }

        Ok(())
    }

    fn project_id(&self, needed_by: &str) -> Result<&str, ConfigLoadError> {
        self.gcp
            .project_id
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| invalid(format!("gcp.project_id is required for {needed_by}")))
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.orchestrator.step_timeout_secs)
    }

    /// Builds every component the configuration describes.
    pub fn build_pipeline(&self) -> Result<Pipeline, ConfigLoadError> {
        self.validate()?;

        let store = self.build_object_store()?;
        let warehouse = self.build_warehouse()?;
        let steps = self.build_steps(store.clone(), warehouse.clone())?;

        let mut builder = Pipeline::builder(store, warehouse)
            .steps(steps)
            .workflow_name(self.workflow.name.clone())
            .step_timeout(self.step_timeout());

        match self.workflow.engine {
            WorkflowEngine::Local => {}
            WorkflowEngine::Recording => {
                builder =
                    builder.workflow_starter(Arc::new(store::RecordingWorkflowStarter::new()));
            }
            #[cfg(feature = "gcp")]
            WorkflowEngine::Cloud => {
                let client = store::gcp::CloudWorkflowsClient::new(
                    &self.gcp.endpoint(&self.workflow.base_url),
                    self.project_id("workflow.engine: cloud")?,
                    self.workflow.location.clone(),
                )
                .map_err(build_error)?;
                builder = builder.workflow_starter(Arc::new(client));
            }
            #[cfg(not(feature = "gcp"))]
            WorkflowEngine::Cloud => return Err(invalid("built without the `gcp` feature")),
        }

        Ok(builder.build())
    }

    fn build_object_store(&self) -> Result<Arc<dyn ObjectStore>, ConfigLoadError> {
        match self.object_store.backend {
            ObjectStoreBackend::Memory => Ok(Arc::new(InMemoryObjectStore::new())),
            #[cfg(feature = "gcp")]
            ObjectStoreBackend::Gcs => {
                let endpoint = self.gcp.endpoint(&self.object_store.base_url);
                Ok(Arc::new(
                    store::gcp::GcsObjectStore::new(&endpoint).map_err(build_error)?,
                ))
            }
            #[cfg(not(feature = "gcp"))]
            ObjectStoreBackend::Gcs => Err(invalid("built without the `gcp` feature")),
        }
    }

    fn build_warehouse(&self) -> Result<Arc<dyn Warehouse>, ConfigLoadError> {
        match self.warehouse.backend {
            WarehouseBackend::Memory => Ok(Arc::new(InMemoryWarehouse::new())),
            #[cfg(feature = "gcp")]
            WarehouseBackend::Bigquery => {
                let table = store::gcp::BigQueryTable {
                    project_id: self.project_id("warehouse.backend: bigquery")?.to_string(),
                    dataset_id: self.warehouse.dataset.clone(),
                    table_id: self.warehouse.table.clone(),
                };
                let endpoint = self.gcp.endpoint(&self.warehouse.base_url);
                Ok(Arc::new(
                    store::gcp::BigQueryWarehouse::new(&endpoint, table).map_err(build_error)?,
                ))
            }
            #[cfg(not(feature = "gcp"))]
            WarehouseBackend::Bigquery => Err(invalid("built without the `gcp` feature")),
        }
    }

    fn build_steps(
        &self,
        store: Arc<dyn ObjectStore>,
        warehouse: Arc<dyn Warehouse>,
    ) -> Result<Arc<dyn PipelineSteps>, ConfigLoadError> {
        match self.orchestrator.steps {
            StepsMode::Local => Ok(Arc::new(LocalSteps::new(store, warehouse))),
            #[cfg(feature = "remote")]
            StepsMode::Http => {
                let endpoints = crate::StepEndpoints {
                    word_count_url: self.orchestrator.word_count_url.clone().unwrap_or_default(),
                    top_words_url: self.orchestrator.top_words_url.clone().unwrap_or_default(),
                    loader_url: self.orchestrator.loader_url.clone().unwrap_or_default(),
                };
                let steps = crate::HttpSteps::new(endpoints, self.step_timeout())
                    .map_err(build_error)?;
                Ok(Arc::new(steps))
            }
            #[cfg(not(feature = "remote"))]
            StepsMode::Http => Err(invalid("built without the `remote` feature")),
        }
    }
}

impl Default for WordstatConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            gcp: GcpYamlConfig::default(),
            object_store: ObjectStoreYamlConfig::default(),
            warehouse: WarehouseYamlConfig::default(),
            workflow: WorkflowYamlConfig::default(),
            orchestrator: OrchestratorYamlConfig::default(),
        }
    }
}

/// Credentials and client settings shared by the Google Cloud backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcpYamlConfig {
    #[serde(default)]
    pub project_id: Option<String>,

    /// Bearer token. Takes precedence over `access_token_env`.
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,

    #[serde(default = "default_gcp_timeout")]
    pub timeout_secs: u64,
}

impl GcpYamlConfig {
    pub fn resolved_access_token(&self) -> Option<String> {
        self.access_token
            .clone()
            .or_else(|| std::env::var(&self.access_token_env).ok())
            .filter(|t| !t.trim().is_empty())
    }

    #[cfg(feature = "gcp")]
    fn endpoint(&self, base_url: &str) -> store::gcp::GcpEndpoint {
        let endpoint = store::gcp::GcpEndpoint::new(base_url)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        match self.resolved_access_token() {
            Some(token) => endpoint.with_access_token(token),
            None => endpoint,
        }
    }
}

impl Default for GcpYamlConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            access_token: None,
            access_token_env: default_access_token_env(),
            timeout_secs: default_gcp_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectStoreBackend {
    #[default]
    Memory,
    Gcs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStoreYamlConfig {
    #[serde(default)]
    pub backend: ObjectStoreBackend,

    #[serde(default = "default_storage_url")]
    pub base_url: String,
}

impl Default for ObjectStoreYamlConfig {
    fn default() -> Self {
        Self {
            backend: ObjectStoreBackend::default(),
            base_url: default_storage_url(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseBackend {
    #[default]
    Memory,
    Bigquery,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseYamlConfig {
    #[serde(default)]
    pub backend: WarehouseBackend,

    #[serde(default = "default_dataset")]
    pub dataset: String,

    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default = "default_bigquery_url")]
    pub base_url: String,
}

impl Default for WarehouseYamlConfig {
    fn default() -> Self {
        Self {
            backend: WarehouseBackend::default(),
            dataset: default_dataset(),
            table: default_table(),
            base_url: default_bigquery_url(),
        }
    }
}

/// Who runs workflow instances started by the trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowEngine {
    /// Spawned on the local runtime.
    #[default]
    Local,
    /// Google Cloud Workflows executions API.
    Cloud,
    /// Only recorded, never run.
    Recording,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowYamlConfig {
    #[serde(default)]
    pub engine: WorkflowEngine,

    #[serde(default = "default_workflow_name")]
    pub name: String,

    #[serde(default = "default_location")]
    pub location: String,

    #[serde(default = "default_workflows_url")]
    pub base_url: String,
}

impl Default for WorkflowYamlConfig {
    fn default() -> Self {
        Self {
            engine: WorkflowEngine::default(),
            name: default_workflow_name(),
            location: default_location(),
            base_url: default_workflows_url(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepsMode {
    #[default]
    Local,
    Http,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorYamlConfig {
    #[serde(default)]
    pub steps: StepsMode,

    #[serde(default = "default_step_timeout")]
    pub step_timeout_secs: u64,

    #[serde(default)]
    pub word_count_url: Option<String>,

    #[serde(default)]
    pub top_words_url: Option<String>,

    #[serde(default)]
    pub loader_url: Option<String>,
}

impl Default for OrchestratorYamlConfig {
    fn default() -> Self {
        Self {
            steps: StepsMode::default(),
            step_timeout_secs: default_step_timeout(),
            word_count_url: None,
            top_words_url: None,
            loader_url: None,
        }
    }
}

fn invalid(message: impl Into<String>) -> ConfigLoadError {
    ConfigLoadError::Validation(message.into())
}

fn build_error(err: impl std::fmt::Display) -> ConfigLoadError {
    ConfigLoadError::Build(err.to_string())
}

fn require_gcp(setting: &str) -> Result<(), ConfigLoadError> {
    if cfg!(feature = "gcp") {
        Ok(())
    } else {
        Err(invalid(format!("{setting} requires the `gcp` feature")))
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_access_token_env() -> String {
    "GOOGLE_OAUTH_ACCESS_TOKEN".to_string()
}

fn default_gcp_timeout() -> u64 {
    30
}

fn default_storage_url() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_bigquery_url() -> String {
    "https://bigquery.googleapis.com".to_string()
}

fn default_workflows_url() -> String {
    "https://workflowexecutions.googleapis.com".to_string()
}

fn default_dataset() -> String {
    "file_processing_dataset".to_string()
}

fn default_table() -> String {
    "file_processing_results".to_string()
}

fn default_workflow_name() -> String {
    "file-processing-workflow".to_string()
}

fn default_location() -> String {
    "us-central1".to_string()
}

fn default_step_timeout() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_is_all_defaults() {
        let config = WordstatConfig::from_yaml("").unwrap();
        assert_eq!(config, WordstatConfig::default());
        assert_eq!(config.warehouse.dataset, "file_processing_dataset");
        assert_eq!(config.warehouse.table, "file_processing_results");
        assert_eq!(config.workflow.name, "file-processing-workflow");
        assert_eq!(config.workflow.location, "us-central1");
        assert_eq!(config.step_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = WordstatConfig::from_yaml(
            r#"
version: "1"
orchestrator:
  step_timeout_secs: 5
workflow:
  engine: recording
"#,
        )
        .unwrap();
        assert_eq!(config.orchestrator.step_timeout_secs, 5);
        assert_eq!(config.orchestrator.steps, StepsMode::Local);
        assert_eq!(config.workflow.engine, WorkflowEngine::Recording);
        assert_eq!(config.workflow.name, "file-processing-workflow");
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let err = WordstatConfig::from_yaml("version: \"2.0\"").unwrap_err();
        assert!(matches!(err, ConfigLoadError::UnsupportedVersion(v) if v == "2.0"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err =
            WordstatConfig::from_yaml("orchestrator:\n  step_timeout_secs: 0\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(_)));
    }

    #[test]
    fn bigquery_needs_a_project() {
        let err = WordstatConfig::from_yaml("warehouse:\n  backend: bigquery\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(msg) if msg.contains("project_id")));
    }

    #[test]
    fn http_steps_need_every_url() {
        let err = WordstatConfig::from_yaml(
            "orchestrator:\n  steps: http\n  word_count_url: http://wc\n  top_words_url: http://tw\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(_)));
    }

    #[test]
    fn http_steps_over_the_memory_store_are_rejected() {
        let err = WordstatConfig::from_yaml(
            r#"
orchestrator:
  steps: http
  word_count_url: http://wc
  top_words_url: http://tw
  loader_url: http://ld
"#,
        )
        .unwrap_err();
        assert!(
            matches!(err, ConfigLoadError::Validation(msg) if msg.contains("object_store.backend: gcs"))
        );
    }

    #[cfg(all(feature = "gcp", feature = "remote"))]
    #[test]
    fn http_steps_over_gcs_are_accepted() {
        let config = WordstatConfig::from_yaml(
            r#"
gcp:
  project_id: p
object_store:
  backend: gcs
orchestrator:
  steps: http
  word_count_url: http://wc
  top_words_url: http://tw
  loader_url: http://ld
"#,
        )
        .unwrap();
        assert_eq!(config.orchestrator.steps, StepsMode::Http);
        assert_eq!(config.object_store.backend, ObjectStoreBackend::Gcs);
    }

    #[test]
    fn unknown_backend_fails_to_parse() {
        let err = WordstatConfig::from_yaml("object_store:\n  backend: s3\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::YamlParse(_)));
    }

    #[test]
    fn explicit_token_wins_over_env() {
        let gcp = GcpYamlConfig {
            access_token: Some("tok".into()),
            access_token_env: "WORDSTAT_TEST_UNSET_TOKEN_VAR".into(),
            ..GcpYamlConfig::default()
        };
        assert_eq!(gcp.resolved_access_token().as_deref(), Some("tok"));

        let gcp = GcpYamlConfig {
            access_token: None,
            ..gcp
        };
        assert_eq!(gcp.resolved_access_token(), None);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "workflow:\n  name: nightly").unwrap();
        let config = WordstatConfig::from_file(file.path()).unwrap();
        assert_eq!(config.workflow.name, "nightly");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = WordstatConfig::from_file("/nonexistent/wordstat.yaml").unwrap_err();
        assert!(matches!(err, ConfigLoadError::FileRead(_)));
    }

    #[test]
    fn default_config_builds_an_in_memory_pipeline() {
        let pipeline = WordstatConfig::default().build_pipeline().unwrap();
        assert_eq!(pipeline.trigger().workflow(), "file-processing-workflow");
        assert!(pipeline.engine().is_some());
    }
}
