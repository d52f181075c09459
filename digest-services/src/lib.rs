//! Pipeline services for the feed digest
//!
//! This crate provides the layer that reconciles feed sources against the
//! cache, drives summarization of new items and republishes the cache as RSS.

pub mod cache_store;
pub mod config;
pub mod digest_service;
pub mod memory_cache;
pub mod publisher;
pub mod reconciler;
pub mod sqlite_cache;
pub mod summarizer;

#[cfg(test)]
mod testing;

pub use cache_store::{CacheStore, CacheStoreError, DEFAULT_RETENTION_DAYS};
pub use config::SummarizerConfig;
pub use digest_service::{DigestService, DigestServiceError};
pub use memory_cache::MemoryCacheStore;
pub use publisher::{decorate_html, publish_xml, FeedMeta, PublishError};
pub use reconciler::{BatchError, FeedReconciler, FeedSource, FetchedFeeds, ReconcileError};
pub use sqlite_cache::SqliteCacheStore;
pub use summarizer::{SummarizeError, Summarizer, SummaryFailure};
