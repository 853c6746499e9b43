//! Error types for the Vista report model.

use thiserror::Error;

/// Errors raised while loading or validating a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report violates a structural invariant and cannot be rendered.
    #[error("Malformed report: {0}")]
    MalformedReport(String),

    #[error("Invalid step path: {0}")]
    InvalidStepPath(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, ReportError>;
