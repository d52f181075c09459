//! Pipeline configuration

use std::time::Duration;

use digest_core::{DigestError, DigestResult};
use digest_gemini::{GeminiConfig, DEFAULT_LANGUAGE, DEFAULT_MODEL};

/// Configuration for summarization and caching
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Gemini model name
    pub model: String,
    /// Language summaries and titles are translated into
    pub desired_language: String,
    /// Pause between two summarizations of the same source
    pub summarize_interval: Duration,
    /// Deadline for summarizing a single item, fetches included
    pub item_timeout: Duration,
    /// Fetch attempts before the final plain fetch
    pub fetch_retry_budget: u32,
    /// Deadline of one generation request
    pub generation_timeout: Duration,
    /// Retries granted to transient backend errors
    pub generation_max_retries: u32,
    pub generation_retry_delay: Duration,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            desired_language: DEFAULT_LANGUAGE.to_string(),
            summarize_interval: Duration::from_secs(10),
            item_timeout: Duration::from_secs(6 * 60),
            fetch_retry_budget: 3,
            generation_timeout: Duration::from_secs(60),
            generation_max_retries: 3,
            generation_retry_delay: Duration::from_secs(5),
        }
    }
}

impl SummarizerConfig {
    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> DigestResult<()> {
        if self.model.trim().is_empty() {
            return Err(DigestError::config("model name is empty"));
        }
        if self.desired_language.trim().is_empty() {
            return Err(DigestError::config("desired language is empty"));
        }
        if self.item_timeout.is_zero() || self.generation_timeout.is_zero() {
            return Err(DigestError::config("timeouts must be greater than zero"));
        }
        Ok(())
    }

    /// Backend configuration derived from these settings
    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            model: self.model.clone(),
            generation_timeout: self.generation_timeout,
            max_retries: self.generation_max_retries,
            retry_delay: self.generation_retry_delay,
            ..GeminiConfig::default()
        }
    }
}
