//! Error types for the Gemini backend

use digest_core::ErrorClass;
use thiserror::Error;

/// Errors that can occur while talking to the Gemini API
#[derive(Debug, Error)]
pub enum GeminiError {
    /// HTTP request could not be completed
    #[error("Request failed: {0}")]
    Request(String),

    /// Request exceeded its deadline
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// API returned an error status
    #[error("API error ({status} {status_text}): {message}")]
    Api {
        status: u16,
        /// Canonical status name, e.g. `UNAVAILABLE`
        status_text: String,
        message: String,
    },

    /// Response could not be decoded or lacked the expected parts
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Candidate came back without content
    #[error("generation was terminated due to: {0}")]
    NoContent(String),

    /// Uploaded file did not become usable
    #[error("File processing failed: {0}")]
    FileProcessing(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GeminiError {
    /// Classify this error for retry and batch-abort decisions.
    ///
    /// Overload and quota exhaustion stop the whole batch; remaining server
    /// faults and timeouts are retried; everything else is final.
    pub fn class(&self) -> ErrorClass {
        match self {
            GeminiError::Api {
                status, message, ..
            } => {
                if *status == 429 || message.to_lowercase().contains("overloaded") {
                    ErrorClass::Overloaded
                } else if *status >= 500 {
                    ErrorClass::Transient
                } else {
                    ErrorClass::Terminal
                }
            }
            GeminiError::Timeout(_) => ErrorClass::Transient,
            _ => ErrorClass::Terminal,
        }
    }

    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        // Request URLs carry the API key
        let error = error.without_url();
        if error.is_timeout() {
            GeminiError::Timeout(error.to_string())
        } else if error.is_decode() {
            GeminiError::MalformedResponse(error.to_string())
        } else {
            GeminiError::Request(error.to_string())
        }
    }
}
