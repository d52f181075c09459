//! Feed reconciler
//!
//! Fetches the configured sources, drops what is already cached or too old,
//! and summarizes the rest one item at a time into the cache store.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Local, Utc};
use digest_core::{FeedItem, GenerationResult, SourceFeed};
use digest_news::{FeedClient, NewsError};
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, instrument, warn};

use crate::cache_store::CacheStore;
use crate::summarizer::{SummarizeError, Summarizer, SummaryFailure};

/// Source of parsed feeds
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_feed(&self, url: &str) -> Result<SourceFeed, NewsError>;
}

#[async_trait]
impl FeedSource for FeedClient {
    async fn fetch_feed(&self, url: &str) -> Result<SourceFeed, NewsError> {
        FeedClient::fetch_feed(self, url).await
    }
}

/// One non-fatal failure of a batch
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to fetch feeds from '{url}': {source}")]
    Feed { url: String, source: NewsError },

    #[error("failed to summarize '{title}' ({link}): {source}")]
    Item {
        title: String,
        link: String,
        source: SummarizeError,
    },

    #[error("model overloaded, remaining items were skipped: {0}")]
    Overloaded(SummarizeError),
}

/// All failures of one batch, joined line by line
#[derive(Debug, Default)]
pub struct BatchError {
    pub errors: Vec<ReconcileError>,
}

impl BatchError {
    pub fn new(errors: Vec<ReconcileError>) -> Self {
        Self { errors }
    }

    /// Whether the batch was cut short by overload and is worth running again later
    pub fn is_retryable(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, ReconcileError::Overloaded(_)))
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn extend(&mut self, other: BatchError) {
        self.errors.extend(other.errors);
    }

    /// `Ok(value)` when nothing failed
    pub fn into_result<T>(self, value: T) -> Result<T, BatchError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

impl std::error::Error for BatchError {}

/// Feeds that survived filtering, plus the sources that failed
#[derive(Debug, Default)]
pub struct FetchedFeeds {
    pub feeds: Vec<SourceFeed>,
    pub errors: BatchError,
}

impl FetchedFeeds {
    pub fn item_count(&self) -> usize {
        self.feeds.iter().map(|f| f.items.len()).sum()
    }
}

/// Feed reconciler
pub struct FeedReconciler {
    feed_urls: Vec<String>,
    source: Arc<dyn FeedSource>,
    store: Arc<dyn CacheStore>,
    summarizer: Summarizer,
}

impl FeedReconciler {
    pub fn new(
        feed_urls: Vec<String>,
        source: Arc<dyn FeedSource>,
        store: Arc<dyn CacheStore>,
        summarizer: Summarizer,
    ) -> Self {
        Self {
            feed_urls,
            source,
            store,
            summarizer,
        }
    }

    pub fn feed_urls(&self) -> &[String] {
        &self.feed_urls
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    /// Fetch every configured source.
    ///
    /// With `ignore_cached`, items whose GUID is already stored are dropped.
    /// Items published strictly before `ignore_older_than_days` ago are dropped;
    /// undated items are kept. A window of 0 days disables the age filter.
    #[instrument(skip(self))]
    pub async fn fetch_feeds(&self, ignore_cached: bool, ignore_older_than_days: i64) -> FetchedFeeds {
        let cutoff =
            (ignore_older_than_days > 0).then(|| Utc::now() - Duration::days(ignore_older_than_days));

        let mut fetched = FetchedFeeds::default();
        for url in &self.feed_urls {
            match self.source.fetch_feed(url).await {
                Ok(mut feed) => {
                    let total = feed.items.len();
                    feed.items.retain(|item| {
                        if cutoff.is_some_and(|c| item.is_published_before(c)) {
                            return false;
                        }
                        !(ignore_cached && self.store.exists(&item.guid))
                    });
                    debug!("{}: {} of {} item(s) kept", url, feed.items.len(), total);
                    fetched.feeds.push(feed);
                }
                Err(e) => {
                    warn!("Failed to fetch feeds from {}: {}", url, e);
                    fetched.errors.errors.push(ReconcileError::Feed {
                        url: url.clone(),
                        source: e,
                    });
                }
            }
        }

        fetched
    }

    /// Summarize and cache every item of `feeds`, pacing calls per source.
    ///
    /// Returns the number of items cached. Overload stops all sources at once;
    /// items cached before that stay cached.
    #[instrument(skip(self, feeds), fields(feed_count = feeds.len()))]
    pub async fn summarize_and_cache(&self, feeds: &[SourceFeed]) -> Result<usize, BatchError> {
        let interval = self.summarizer.config().summarize_interval;
        let mut errors = BatchError::default();
        let mut cached = 0;

        'sources: for feed in feeds {
            let total = feed.items.len();
            for (i, item) in feed.items.iter().enumerate() {
                match self.summarize_item(item).await {
                    Ok(result) => {
                        let summary = format!(
                            "{}\n\n(summarized with **{}**, {})",
                            result.summary,
                            self.summarizer.model(),
                            Local::now().format("%Y-%m-%d %H:%M:%S %Z")
                        );
                        self.store.save(item, &result.title, &summary);
                    }
                    Err(failure) if failure.error.class().is_overloaded() => {
                        error!("Model overloaded while summarizing '{}', stopping", item.title);
                        errors.errors.push(ReconcileError::Overloaded(failure.error));
                        break 'sources;
                    }
                    Err(SummaryFailure { result, error }) => {
                        warn!("Failed to summarize '{}' ({}): {}", item.title, item.link, error);
                        let summary = format!("{}\n\n{}", result.summary, item.description);
                        self.store.save(item, &result.title, &summary);
                        errors.errors.push(ReconcileError::Item {
                            title: item.title.clone(),
                            link: item.link.clone(),
                            source: error,
                        });
                    }
                }
                cached += 1;

                if i + 1 < total {
                    debug!("Sleeping {:?} before the next item", interval);
                    sleep(interval).await;
                }
            }
        }

        info!("Cached {} item(s) with {} error(s)", cached, errors.len());
        errors.into_result(cached)
    }

    async fn summarize_item(&self, item: &FeedItem) -> Result<GenerationResult, SummaryFailure> {
        let deadline = self.summarizer.config().item_timeout;
        match timeout(deadline, self.summarizer.summarize(item)).await {
            Ok(result) => result,
            Err(_) => Err(SummaryFailure::new(
                &item.title,
                SummarizeError::Timeout(deadline),
            )),
        }
    }
}
