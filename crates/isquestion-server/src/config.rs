//! Server configuration

use anyhow::{bail, Context};
use isquestion_classifiers::GuardConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding vectorizer.json, svd.json and classifier.json
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Word list file; the built-in lexicon is used when unset
    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Guard thresholds
    #[serde(default)]
    pub guard: GuardConfig,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &crate::Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file {}", config_path))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid config file {}", config_path))?
        } else {
            tracing::debug!(path = config_path, "Config file not found, using defaults");
            Self::default()
        };

        // Apply CLI overrides
        if let Some(listen) = &cli.listen {
            config.listen = listen.clone();
        }

        if let Some(port) = cli.port {
            config.port = port;
        }

        if let Some(artifacts) = &cli.artifacts {
            config.artifacts_dir = artifacts.clone();
        }

        if let Some(lexicon) = &cli.lexicon {
            config.lexicon_path = Some(lexicon.clone());
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_body_bytes == 0 {
            bail!("max_body_bytes must be positive");
        }
        if self.guard.min_chars == 0 {
            bail!("guard.min_chars must be at least 1");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            artifacts_dir: default_artifacts_dir(),
            lexicon_path: None,
            max_body_bytes: default_max_body_bytes(),
            guard: GuardConfig::default(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("./artifacts")
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}
