//! Error types shared by the digest crates

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workspace-wide error type
#[derive(Error, Debug)]
pub enum DigestError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DigestError {
    pub fn config(msg: impl Into<String>) -> Self {
        DigestError::Config(msg.into())
    }
}

/// Result type alias for digest operations
pub type DigestResult<T> = Result<T, DigestError>;

/// How a failed backend call should affect control flow.
///
/// Errors are classified once, at the generative backend boundary, and the
/// reconciler switches on this tag instead of inspecting error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Backend is over capacity or out of quota; stop the whole batch
    Overloaded,
    /// Server-side fault worth retrying the same call
    Transient,
    /// Nothing to gain from retrying
    Terminal,
}

impl ErrorClass {
    pub fn is_overloaded(&self) -> bool {
        matches!(self, ErrorClass::Overloaded)
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorClass::Transient)
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::Overloaded => write!(f, "overloaded"),
            ErrorClass::Transient => write!(f, "transient"),
            ErrorClass::Terminal => write!(f, "terminal"),
        }
    }
}
