//! Lint engine error types

use thiserror::Error;

/// Lint engine errors
#[derive(Debug, Error)]
pub enum LintError {
    #[error("Unknown formatter: {0}")]
    UnknownFormatter(String),

    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
