//! Error types for report generation and rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur while building or rendering a report.
#[derive(Error, Debug)]
pub enum ReportError {
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The document tree is structurally invalid.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// PDF layout or serialization failed.
    #[error("render failed: {0}")]
    RenderFailed(String),

    /// No font family from the fallback list could be loaded.
    #[error("no usable font family found (tried {families:?} in {searched:?})")]
    FontNotFound {
        families: Vec<String>,
        searched: Vec<PathBuf>,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<genpdf::error::Error> for ReportError {
    fn from(err: genpdf::error::Error) -> Self {
        ReportError::RenderFailed(err.to_string())
    }
}
