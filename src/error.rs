use std::time::Duration;

use thiserror::Error;

/// Custom error type for Proseflow operations.
#[derive(Debug, Error)]
pub enum ProseError {
    /// Request input rejected before any stage ran.
    #[error("Input error: {0}")]
    Input(String),

    /// Not enough paragraphs to compare (at least two are required).
    #[error("Insufficient input: {0}")]
    InsufficientInput(String),

    /// Relation endpoint was never added to the graph.
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// A single analysis stage failed. Absorbed by the pipeline.
    #[error("Stage '{stage}' failed: {message}")]
    StageFailure { stage: String, message: String },

    /// An external collaborator exceeded its time budget.
    #[error("Stage '{stage}' timed out after {after:?}")]
    Timeout { stage: String, after: Duration },

    /// The signal bag handed to the aggregator violated its contract.
    #[error("Aggregation error: {0}")]
    Aggregation(String),

    /// External collaborator is not loaded or is a no-op.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl ProseError {
    /// Wrap any displayable error as a failure of the named stage.
    pub fn stage(stage: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ProseError::StageFailure {
            stage: stage.into(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ProseError {
    fn from(err: serde_json::Error) -> Self {
        ProseError::Serialization(format!("JSON serialization error: {}", err))
    }
}

impl From<toml::de::Error> for ProseError {
    fn from(err: toml::de::Error) -> Self {
        ProseError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<std::io::Error> for ProseError {
    fn from(err: std::io::Error) -> Self {
        ProseError::Io(err.to_string())
    }
}
