//! Shared application state

use anyhow::{Context, Result};
use isquestion_classifiers::{Lexicon, ModelBundle, QuestionPipeline, WhatlangDetector};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::info;

use crate::config::ServerConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Guard plus model, immutable after startup
    pub pipeline: Arc<QuestionPipeline>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Load the lexicon and model artifacts named by `config`
    pub fn load(config: ServerConfig, metrics_handle: PrometheusHandle) -> Result<Self> {
        let lexicon = match &config.lexicon_path {
            Some(path) => Lexicon::from_file(path)
                .with_context(|| format!("Failed to load lexicon {}", path.display()))?,
            None => Lexicon::builtin().context("Built-in lexicon is invalid")?,
        };

        let bundle = ModelBundle::load(&config.artifacts_dir).with_context(|| {
            format!(
                "Failed to load model artifacts from {}",
                config.artifacts_dir.display()
            )
        })?;

        let pipeline = QuestionPipeline::from_parts(
            config.guard.clone(),
            lexicon,
            Arc::new(WhatlangDetector::new()),
            bundle,
        )?;
        info!(guard = ?pipeline.guard(), "Pipeline ready");

        Ok(Self::new(config, pipeline, metrics_handle))
    }

    pub fn new(config: ServerConfig, pipeline: QuestionPipeline, metrics_handle: PrometheusHandle) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            metrics_handle,
        }
    }
}
