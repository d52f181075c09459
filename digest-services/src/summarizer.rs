//! Summarization orchestrator
//!
//! Decides how each feed item is summarized:
//! - video links go straight to the backend
//! - everything else is fetched (scrapper first for HTML pages, when configured)
//!   and summarized as text or as uploaded files
//! - when fetching fails entirely, the backend fetches the URL itself

use std::sync::Arc;
use std::time::Duration;

use digest_core::{ErrorClass, FeedItem, GenerationResult};
use digest_gemini::{GeminiError, GenerativeBackend, PromptFile};
use digest_news::{
    is_html_content, is_youtube_url, normalize_youtube_url, ContentFetcher, ContentScrapper,
    FetchError, FetchedContent,
};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::SummarizerConfig;

/// Why an item could not be summarized
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error(transparent)]
    Backend(#[from] GeminiError),

    #[error("failed to fetch '{url}' ({fetch_error}), and url context summarization failed: {source}")]
    UrlContext {
        url: String,
        fetch_error: String,
        source: GeminiError,
    },

    #[error("content type '{0}' is not supported")]
    UnsupportedContent(String),

    #[error("summarization timed out after {0:?}")]
    Timeout(Duration),
}

impl SummarizeError {
    pub fn class(&self) -> ErrorClass {
        match self {
            SummarizeError::Backend(e) => e.class(),
            SummarizeError::UrlContext { source, .. } => source.class(),
            SummarizeError::UnsupportedContent(_) => ErrorClass::Terminal,
            SummarizeError::Timeout(_) => ErrorClass::Transient,
        }
    }
}

/// A failed summarization together with the degraded result to cache
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SummaryFailure {
    /// Original title with an error-tagged summary
    pub result: GenerationResult,
    pub error: SummarizeError,
}

impl SummaryFailure {
    pub fn new(original_title: &str, error: SummarizeError) -> Self {
        Self {
            result: GenerationResult::failed(original_title, error.to_string().trim()),
            error,
        }
    }
}

/// Drives content acquisition and the generative backend for single items
pub struct Summarizer {
    backend: Arc<dyn GenerativeBackend>,
    fetcher: Arc<dyn ContentFetcher>,
    scrapper: Option<Arc<dyn ContentScrapper>>,
    config: SummarizerConfig,
}

impl Summarizer {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        fetcher: Arc<dyn ContentFetcher>,
        config: SummarizerConfig,
    ) -> Self {
        Self {
            backend,
            fetcher,
            scrapper: None,
            config,
        }
    }

    /// Use `scrapper` for HTML pages before falling back to plain fetches
    pub fn with_scrapper(mut self, scrapper: Arc<dyn ContentScrapper>) -> Self {
        self.scrapper = Some(scrapper);
        self
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    pub fn backend(&self) -> &Arc<dyn GenerativeBackend> {
        &self.backend
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    /// Summarize one item
    #[instrument(skip(self, item), fields(guid = %item.guid))]
    pub async fn summarize(&self, item: &FeedItem) -> Result<GenerationResult, SummaryFailure> {
        self.try_summarize(item)
            .await
            .map_err(|error| SummaryFailure::new(&item.title, error))
    }

    async fn try_summarize(&self, item: &FeedItem) -> Result<GenerationResult, SummarizeError> {
        let title = item.title.as_str();
        let url = item.link.as_str();
        let language = self.config.desired_language.as_str();

        if is_youtube_url(url) {
            let video_url = normalize_youtube_url(url);
            info!("Summarizing video: {}", video_url);
            return Ok(self
                .backend
                .summarize_video(title, &video_url, language)
                .await?);
        }

        match self.fetch_with_fallback(url).await {
            Ok(content) if content.is_text() => {
                debug!("Summarizing {} byte(s) of '{}'", content.bytes.len(), content.content_type);
                Ok(self
                    .backend
                    .summarize_text(title, &content.text(), language)
                    .await?)
            }
            Ok(content) if content.is_file() => {
                debug!("Summarizing '{}' file of {} byte(s)", content.content_type, content.bytes.len());
                let file = PromptFile::new(content.bytes, content.content_type);
                Ok(self
                    .backend
                    .summarize_files(title, vec![file], language)
                    .await?)
            }
            Ok(content) => Err(SummarizeError::UnsupportedContent(content.content_type)),
            Err(fetch_error) => {
                warn!(
                    "Failed to fetch {}, summarizing with url context: {}",
                    url, fetch_error
                );
                self.backend
                    .summarize_url(title, url, language)
                    .await
                    .map_err(|source| SummarizeError::UrlContext {
                        url: url.to_string(),
                        fetch_error: fetch_error.to_string(),
                        source,
                    })
            }
        }
    }

    /// Fetch `url` with the retry budget, then make one last plain fetch.
    ///
    /// Budgeted attempts use the scrapper when one is configured and the page
    /// is HTML; the final attempt never does.
    async fn fetch_with_fallback(&self, url: &str) -> Result<FetchedContent, FetchError> {
        let html_type = match &self.scrapper {
            Some(_) => match self.fetcher.probe_content_type(url).await {
                Ok(content_type) if is_html_content(&content_type) => Some(content_type),
                Ok(_) => None,
                Err(e) => {
                    debug!("Failed to probe content type of {}: {}", url, e);
                    None
                }
            },
            None => None,
        };

        let budget = self.config.fetch_retry_budget;
        for attempt in 1..=budget {
            let fetched = match (&self.scrapper, &html_type) {
                (Some(scrapper), Some(content_type)) => scrapper
                    .scrape(url)
                    .await
                    .map(|text| FetchedContent::wrapped(url, content_type, &text))
                    .map_err(|e| {
                        FetchError::new(
                            format!("failed to scrape '{}': {}", url, e),
                            FetchedContent::wrapped(
                                url,
                                content_type,
                                &format!("Failed to scrape this URL: {}", e),
                            ),
                        )
                    }),
                _ => self.fetcher.fetch(url).await,
            };

            match fetched {
                Ok(content) => return Ok(content),
                Err(e) => warn!("Fetch attempt {}/{} for {} failed: {}", attempt, budget, url, e),
            }
        }

        self.fetcher.fetch(url).await
    }
}
