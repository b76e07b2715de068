//! Application error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::parser::ParseError;

/// Application-level errors for Histograph.
///
/// Errors raised while processing a single source never abort a run; the
/// pipeline logs them and omits that source.
#[derive(Error, Debug)]
pub enum AppError {
    // I/O errors
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source document not found: {0}")]
    MissingSource(PathBuf),

    // Format errors
    #[error("Script parse error: {0}")]
    Script(#[from] ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // Config errors
    #[error("Invalid source '{name}': {reason}")]
    InvalidSource { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }
}
