//! Generation results and summary text conventions

use serde::{Deserialize, Serialize};

/// Marker that prefixes every summary produced by a failed summarization
pub const ERROR_PREFIX_SUMMARY_FAILED: &str = "Summary failed with error";

/// Stored in place of a summary the backend returned empty
pub const SUMMARY_EMPTY_PLACEHOLDER: &str = "<<< Summarized content is empty. >>>";

/// Maximum number of items returned when listing including read items
pub const LIST_LIMIT: usize = 100;

/// Replacement text for redacted secrets
pub const REDACTED: &str = "|REDACTED|";

/// Outcome of summarizing one feed item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Translated title, or the original title when translation did not happen
    pub title: String,
    /// Summary body, or an error-tagged diagnostic
    pub summary: String,
    pub success: bool,
}

impl GenerationResult {
    pub fn succeeded(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            success: true,
        }
    }

    /// A degraded result keeping the original title and tagging the error text
    pub fn failed(original_title: impl Into<String>, error: &str) -> Self {
        Self {
            title: original_title.into(),
            summary: format!("{}: {}", ERROR_PREFIX_SUMMARY_FAILED, error),
            success: false,
        }
    }

    /// Replace empty generated fields with the original title and a placeholder
    pub fn with_fallbacks(mut self, original_title: &str) -> Self {
        if self.title.trim().is_empty() {
            self.title = original_title.to_string();
        }
        if self.summary.trim().is_empty() {
            self.summary = SUMMARY_EMPTY_PLACEHOLDER.to_string();
        }
        self
    }
}

/// Check if a summary body holds an error diagnostic rather than a summary
pub fn is_error_summary(body: &str) -> bool {
    body.contains(ERROR_PREFIX_SUMMARY_FAILED)
}

/// Redact every occurrence of the given secrets in `text`
pub fn redact_text(text: &str, secrets: &[String]) -> String {
    secrets
        .iter()
        .filter(|s| !s.is_empty())
        .fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), REDACTED))
}
