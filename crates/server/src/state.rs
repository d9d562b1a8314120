use crate::config::ServerConfig;
use crate::error::ServerResult;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Instant;
use wordstat::{Pipeline, WordstatConfig};

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Pipeline configuration the components were built from
    pub pipeline_config: Arc<WordstatConfig>,

    /// Pipeline components, sharing one set of clients
    pub pipeline: Pipeline,

    /// Prometheus renderer, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,

    pub started_at: Instant,
}

impl ServerState {
    /// Builds the pipeline from `config.pipeline_config`, or an in-memory one.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let pipeline_config = match &config.pipeline_config {
            Some(path) => WordstatConfig::from_file(path)?,
            None => {
                tracing::warn!("no pipeline_config set, running with in-memory collaborators");
                WordstatConfig::default()
            }
        };
        let pipeline = pipeline_config.build_pipeline()?;
        Ok(Self::with_pipeline(config, pipeline_config, pipeline))
    }

    /// State around an already wired pipeline.
    pub fn with_pipeline(
        config: ServerConfig,
        pipeline_config: WordstatConfig,
        pipeline: Pipeline,
    ) -> Self {
        Self {
            config: Arc::new(config),
            pipeline_config: Arc::new(pipeline_config),
            pipeline,
            metrics: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
