//! Digest Service
//!
//! Client façade over the pipeline: owns the configured sources, the
//! summarizer and the cache store, and exposes fetch, summarize, list,
//! mark-as-read, sweep and publish operations.

use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use digest_core::{redact_text, CachedItem, DigestError, SourceFeed};
use digest_gemini::{GeminiClient, GeminiError, GenerativeBackend};
use digest_news::{FeedClient, FirecrawlClient, HttpContentFetcher, NewsError};
use thiserror::Error;
use tracing::{info, instrument};

use crate::cache_store::{CacheStore, CacheStoreError, DEFAULT_RETENTION_DAYS};
use crate::config::SummarizerConfig;
use crate::memory_cache::MemoryCacheStore;
use crate::publisher::{self, FeedMeta, PublishError};
use crate::reconciler::{BatchError, FeedReconciler, FetchedFeeds};
use crate::sqlite_cache::SqliteCacheStore;
use crate::summarizer::Summarizer;

/// Errors raised while assembling the service
#[derive(Debug, Error)]
pub enum DigestServiceError {
    #[error("Backend error: {0}")]
    Backend(#[from] GeminiError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheStoreError),

    #[error("HTTP client error: {0}")]
    Http(#[from] NewsError),

    #[error(transparent)]
    Config(#[from] DigestError),
}

/// Feed digest client
pub struct DigestService {
    reconciler: FeedReconciler,
    store: Arc<dyn CacheStore>,
}

impl DigestService {
    /// Create a service backed by Gemini, keeping the cache in memory
    pub fn in_memory(
        feed_urls: Vec<String>,
        api_keys: Vec<String>,
        firecrawl_api_key: Option<String>,
        config: SummarizerConfig,
    ) -> Result<Self, DigestServiceError> {
        Self::with_store(
            feed_urls,
            api_keys,
            firecrawl_api_key,
            config,
            Arc::new(MemoryCacheStore::new()),
        )
    }

    /// Create a service backed by Gemini, caching into the SQLite file at `db_path`
    pub fn with_sqlite<P: AsRef<Path>>(
        feed_urls: Vec<String>,
        api_keys: Vec<String>,
        firecrawl_api_key: Option<String>,
        config: SummarizerConfig,
        db_path: P,
    ) -> Result<Self, DigestServiceError> {
        let store = SqliteCacheStore::new(db_path)?;
        Self::with_store(feed_urls, api_keys, firecrawl_api_key, config, Arc::new(store))
    }

    fn with_store(
        feed_urls: Vec<String>,
        api_keys: Vec<String>,
        firecrawl_api_key: Option<String>,
        config: SummarizerConfig,
        store: Arc<dyn CacheStore>,
    ) -> Result<Self, DigestServiceError> {
        config.validate()?;
        info!(
            "Initializing DigestService ({} feed(s), {} key(s), model: {}, Firecrawl: {})",
            feed_urls.len(),
            api_keys.len(),
            config.model,
            firecrawl_api_key.is_some()
        );

        let backend = Arc::new(GeminiClient::new(api_keys, config.gemini_config())?);
        let mut summarizer =
            Summarizer::new(backend, Arc::new(HttpContentFetcher::new()?), config);
        if let Some(key) = firecrawl_api_key.filter(|k| !k.is_empty()) {
            summarizer = summarizer.with_scrapper(Arc::new(FirecrawlClient::new(key)?));
        }

        let reconciler = FeedReconciler::new(
            feed_urls,
            Arc::new(FeedClient::new()?),
            store.clone(),
            summarizer,
        );
        Ok(Self::from_parts(reconciler, store))
    }

    /// Assemble a service from an already configured reconciler and its store
    pub fn from_parts(reconciler: FeedReconciler, store: Arc<dyn CacheStore>) -> Self {
        Self { reconciler, store }
    }

    pub fn feed_urls(&self) -> &[String] {
        self.reconciler.feed_urls()
    }

    pub fn model(&self) -> &str {
        self.reconciler.summarizer().model()
    }

    fn backend(&self) -> &Arc<dyn GenerativeBackend> {
        self.reconciler.summarizer().backend()
    }

    /// Fetch all sources, see [`FeedReconciler::fetch_feeds`]
    pub async fn fetch_feeds(&self, ignore_cached: bool, ignore_older_than_days: i64) -> FetchedFeeds {
        self.reconciler
            .fetch_feeds(ignore_cached, ignore_older_than_days)
            .await
    }

    /// Summarize and cache the items of `feeds`, see [`FeedReconciler::summarize_and_cache`]
    pub async fn summarize_and_cache(&self, feeds: &[SourceFeed]) -> Result<usize, BatchError> {
        self.reconciler.summarize_and_cache(feeds).await
    }

    /// Fetch uncached items and summarize them, reporting source and item
    /// failures together.
    #[instrument(skip(self))]
    pub async fn run(&self, ignore_older_than_days: i64) -> Result<usize, BatchError> {
        let FetchedFeeds { feeds, mut errors } =
            self.fetch_feeds(true, ignore_older_than_days).await;

        let cached = match self.summarize_and_cache(&feeds).await {
            Ok(cached) => cached,
            Err(batch) => {
                errors.extend(batch);
                return Err(errors);
            }
        };

        errors.into_result(cached)
    }

    /// List cached items newest first, with credentials redacted from their text
    pub fn list_cached_items(&self, include_read: bool) -> Vec<CachedItem> {
        let secrets = self.backend().secrets();
        self.store
            .list(include_read)
            .into_iter()
            .map(|mut item| {
                item.title = redact_text(&item.title, &secrets);
                item.summary = redact_text(&item.summary, &secrets);
                item
            })
            .collect()
    }

    pub fn mark_cached_items_as_read(&self, items: &[CachedItem]) {
        for item in items {
            self.store.mark_as_read(&item.guid);
        }
    }

    /// Mark a single item as read; returns false when `guid` is not cached
    pub fn mark_as_read(&self, guid: &str) -> bool {
        if !self.store.exists(guid) {
            return false;
        }
        self.store.mark_as_read(guid);
        true
    }

    /// Sweep items cached more than a month ago
    pub fn delete_old_cached_items(&self) -> usize {
        let deleted = self
            .store
            .delete_older_than(Duration::days(DEFAULT_RETENTION_DAYS));
        if deleted > 0 {
            info!("Deleted {} old cached item(s)", deleted);
        }
        deleted
    }

    pub fn publish_xml(&self, meta: &FeedMeta, items: &[CachedItem]) -> Result<String, PublishError> {
        publisher::publish_xml(meta, items)
    }
}
