//! Pipeline error types

use crate::models::ModelError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by any pipeline stage
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required column is missing or its contents violate the table schema
    #[error("Schema error: {0}")]
    Schema(String),

    /// Not enough rows for the requested look-ahead horizon or split
    #[error("Insufficient data: need at least {required} rows, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Bad target column or empty feature set
    #[error("Training configuration error: {0}")]
    TrainingConfig(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
