use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::{PipelineOrchestrator, PipelineResult};

/// Shared state handed to every request handler.
pub struct AppState {
    pub config: ServerConfig,
    pub pipeline: Arc<PipelineOrchestrator>,
}

impl AppState {
    /// Build state with the production pipeline wired from `config`.
    pub fn new(config: ServerConfig) -> PipelineResult<Arc<Self>> {
        let pipeline = PipelineOrchestrator::from_config(&config)?;
        Ok(Self::with_pipeline(config, Arc::new(pipeline)))
    }

    pub fn with_pipeline(config: ServerConfig, pipeline: Arc<PipelineOrchestrator>) -> Arc<Self> {
        Arc::new(Self { config, pipeline })
    }
}
