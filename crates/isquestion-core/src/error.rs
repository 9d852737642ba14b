//! Error types for isquestion

/// Result type alias using isquestion's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for isquestion operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Feature extraction or classifier execution errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Artifact loading and validation errors
    #[error("artifact error: {0}")]
    Artifact(String),

    /// Two pipeline stages disagree on vector width
    #[error("dimension mismatch in {stage}: expected {expected}, got {actual}")]
    DimensionMismatch {
        stage: String,
        expected: usize,
        actual: usize,
    },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new artifact error
    pub fn artifact(msg: impl Into<String>) -> Self {
        Self::Artifact(msg.into())
    }

    /// Create a new dimension mismatch error
    pub fn dimension_mismatch(stage: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            stage: stage.into(),
            expected,
            actual,
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
