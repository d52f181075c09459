//! Cache store abstraction
//!
//! Persists summarized feed items keyed by GUID. Store failures never abort
//! the pipeline: implementations log them and degrade to a no-op.

use chrono::{DateTime, Duration, Utc};
use digest_core::{CachedItem, FeedItem};
use thiserror::Error;

/// Default age after which cached items are swept
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Persistent storage of cached items
pub trait CacheStore: Send + Sync {
    /// Whether an item with `guid` is cached
    fn exists(&self, guid: &str) -> bool;

    /// Insert `item`, or overwrite only the title and summary of an existing one
    fn upsert(&self, item: &FeedItem, title: &str, summary: &str, at: DateTime<Utc>);

    /// [`CacheStore::upsert`] at the current time
    fn save(&self, item: &FeedItem, title: &str, summary: &str) {
        self.upsert(item, title, summary, Utc::now());
    }

    fn fetch(&self, guid: &str) -> Option<CachedItem>;

    /// Mark an item as read; unknown GUIDs are logged and ignored
    fn mark_as_read(&self, guid: &str);

    /// Newest-first listing. Unread listings are complete; listings that
    /// include read items are capped at [`digest_core::LIST_LIMIT`].
    fn list(&self, include_read: bool) -> Vec<CachedItem>;

    /// Delete items created strictly before `cutoff`, returning how many went
    fn delete_created_before(&self, cutoff: DateTime<Utc>) -> usize;

    fn delete_older_than(&self, window: Duration) -> usize {
        self.delete_created_before(Utc::now() - window)
    }
}

/// Cache store errors
#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Failed to acquire lock")]
    LockError,
}
