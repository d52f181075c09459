//! Error types for the news module

use thiserror::Error;

use crate::content::FetchedContent;

/// Errors that can occur in the news module
#[derive(Debug, Error)]
pub enum NewsError {
    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Remote returned a non-success status
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message or response body
        message: String,
    },

    /// Failed to parse a response or feed document
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Article scraping failed
    #[error("Scrape failed: {0}")]
    ScrapeFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A failed content fetch.
///
/// Always carries a non-empty diagnostic body so callers can embed the
/// failure text in prompts or cached summaries.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
    pub diagnostic: FetchedContent,
}

impl FetchError {
    pub fn new(message: impl Into<String>, diagnostic: FetchedContent) -> Self {
        Self {
            message: message.into(),
            diagnostic,
        }
    }
}
