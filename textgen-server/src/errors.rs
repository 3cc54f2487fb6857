use std::path::PathBuf;
use thiserror::Error;

/// Bad or missing request input. Always the caller's fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Request body was absent, unparseable, or an empty object
    #[error("No JSON data provided")]
    MissingBody,

    /// Prompt was absent or the empty string
    #[error("Prompt is required")]
    MissingPrompt,

    /// A field was present but had the wrong JSON type
    #[error("Invalid value for '{field}': expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

/// Failure while bringing a model into residency.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    /// Run name cannot name a checkpoint (empty, or escapes the checkpoint directory)
    #[error("Invalid run name: {0:?}")]
    InvalidRunName(String),

    /// No checkpoint directory for this run
    #[error("Checkpoint not found for run '{run_name}' at {}", path.display())]
    CheckpointNotFound { run_name: String, path: PathBuf },

    /// Checkpoint exists but a required file is missing
    #[error("Checkpoint for run '{run_name}' is missing {}", file.display())]
    MissingFile { run_name: String, file: PathBuf },

    /// Checkpoint data could not be interpreted
    #[error("Corrupt checkpoint for run '{run_name}': {reason}")]
    Corrupt { run_name: String, reason: String },

    /// IO error while reading checkpoint data
    #[error("IO error loading run '{run_name}': {source}")]
    Io {
        run_name: String,
        #[source]
        source: std::io::Error,
    },
}

/// The model ran but produced nothing usable.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Generation call returned zero candidates
    #[error("No text generated")]
    NoOutput,

    /// Execution context was already released
    #[error("Model '{run_name}' has been released")]
    ContextClosed { run_name: String },

    /// Runtime failure inside the execution context
    #[error("Generation failed: {0}")]
    Runtime(String),
}

/// Every way a single generation request can fail.
///
/// The generation service surfaces these unchanged; the HTTP layer decides
/// the status code.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Process-level errors (startup, configuration, logging).
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration error (invalid values, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error occurred (file operations, port binding, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Tracing/logging error
    #[error("Logging error: {0}")]
    Logging(String),
}

/// Result type alias for process-level operations.
pub type Result<T> = std::result::Result<T, ServerError>;

impl From<anyhow::Error> for ServerError {
    fn from(e: anyhow::Error) -> Self {
        ServerError::Logging(e.to_string())
    }
}
