use crate::answer::ExtractionError;
use crate::embedding::{EmbeddingError, VectorIndexError};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the virtual TA
#[derive(Error, Debug)]
pub enum TaError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Embedding model or answer model could not be initialized
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Question was empty or whitespace
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    /// Embedding generation failed for a request or during a build
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Vector index build or search failed
    #[error("Vector index error: {0}")]
    VectorIndex(#[from] VectorIndexError),

    /// Answer extraction failed
    #[error("Answer extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// A stage exceeded its time budget
    #[error("{stage} timed out after {}s", .after.as_secs())]
    Timeout { stage: &'static str, after: Duration },

    /// Compute resource or upstream quota exhausted
    #[error("Capacity exhausted: {0}")]
    CapacityExhausted(String),

    /// A blocking worker task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Markers that identify resource or quota exhaustion in error text
const CAPACITY_MARKERS: &[&str] = &[
    "rate limit",
    "quota",
    "resource exhausted",
    "out of memory",
    "too many requests",
];

impl TaError {
    /// Whether the failure should be reported to callers as "retry later"
    pub fn is_capacity_exhausted(&self) -> bool {
        if matches!(self, TaError::CapacityExhausted(_)) {
            return true;
        }
        let detail = self.to_string().to_lowercase();
        CAPACITY_MARKERS.iter().any(|marker| detail.contains(marker))
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for virtual TA operations
pub type Result<T> = std::result::Result<T, TaError>;
