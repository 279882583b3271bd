//! Error types for ldaviz

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LdavizError {
    // Workspace errors
    #[error("Directory not found at {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Cannot run {action}: {reason}")]
    PreconditionFailed { action: String, reason: String },

    #[error("Unknown action '{name}'")]
    UnknownAction { name: String },

    // Data errors
    #[error("No raw data for configuration {id}")]
    DatasetMissing { id: u32 },

    #[error("Configuration {id} has no topics")]
    EmptyDataset { id: u32 },

    #[error("Keyword '{keyword}' missing from topic {topic}")]
    MissingKeyword { keyword: String, topic: usize },

    // Numeric errors
    #[error("{metric} produced a non-finite value ({value}) for topics {source_topic} and {target_topic}")]
    NonFiniteDistance {
        metric: String,
        value: f64,
        source_topic: usize,
        target_topic: usize,
    },

    #[error("Invalid matrix: {reason}")]
    InvalidMatrix { reason: String },

    #[error("Numeric failure: {reason}")]
    NumericFailure { reason: String },

    #[error("Task {job} panicked: {message}")]
    TaskPanicked { job: String, message: String },

    // Artifact errors
    #[error("Malformed artifact {path} at line {line}: {reason}")]
    MalformedArtifact {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Generation errors
    #[error("Data generation failed: {reason}")]
    Generation { reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LdavizError>;
