//! Error handling for the CRTAC1 analysis pipeline.
//!
//! Every stage propagates its failures as an [`AnalysisError`]; nothing in the
//! pipeline recovers locally, so the first error aborts the run.

pub mod util;

use std::io;
use std::path::{Path, PathBuf};

use arrow::error::ArrowError;
use thiserror::Error;

/// Specialized error type for the analysis pipeline
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Missing, unreadable or malformed input file
    #[error("IO error: {message}{}", display_path(.path.as_deref()))]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<io::Error>,
    },

    /// Missing column, missing value, or a value outside a closed domain
    #[error("Schema error: {0}")]
    Schema(String),

    /// Group too small for a mean, standard deviation, model or normality test
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Value outside the domain of a transform (e.g. log of a non-positive number)
    #[error("Domain error: {0}")]
    Domain(String),

    /// Singular design or degenerate distribution parameters
    #[error("Numerical error: {0}")]
    Numerical(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Arrow compute or conversion failure outside file parsing
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

fn display_path(path: Option<&Path>) -> String {
    path.map_or_else(String::new, |p| format!(" ({})", p.display()))
}

impl AnalysisError {
    /// Create an IO error without an underlying source
    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Create an IO error wrapping an underlying `std::io::Error`
    pub fn io_error_with_source(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            path: None,
            source: Some(source),
        }
    }

    /// Attach a file path to an IO error; other variants are returned unchanged
    #[must_use]
    pub fn with_path(self, path: &Path) -> Self {
        match self {
            Self::Io {
                message, source, ..
            } => Self::Io {
                message,
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        }
    }

    /// Shorthand for a missing-column schema error
    pub fn missing_column(table: &str, column: &str) -> Self {
        Self::Schema(format!("column '{column}' not found in {table}"))
    }
}

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
