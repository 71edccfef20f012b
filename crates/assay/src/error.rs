//! Error types for the Assay library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Assay operations.
#[derive(Debug, Error)]
pub enum AssayError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to analyze.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An external store or service reported a failure.
    #[error("{store} failed for dataset '{dataset_id}': {message}")]
    Store {
        store: &'static str,
        dataset_id: String,
        message: String,
    },

    /// The dataset could not be evaluated at all.
    #[error(transparent)]
    CannotEvaluate(#[from] CannotEvaluate),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl AssayError {
    /// Build a store failure for `dataset_id`.
    pub fn store(
        store: &'static str,
        dataset_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        AssayError::Store {
            store,
            dataset_id: dataset_id.into(),
            message: message.into(),
        }
    }
}

/// Fatal evaluation failure: no field descriptors could be obtained.
///
/// Cloneable so every caller coalesced onto one evaluation receives it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot evaluate dataset '{dataset_id}': {reason}")]
pub struct CannotEvaluate {
    pub dataset_id: String,
    pub reason: String,
}

/// Result type alias for Assay operations.
pub type Result<T> = std::result::Result<T, AssayError>;
