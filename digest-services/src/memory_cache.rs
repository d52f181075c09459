//! In-memory cache store

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use digest_core::{CachedItem, FeedItem, LIST_LIMIT};
use parking_lot::Mutex;
use tracing::warn;

use crate::cache_store::CacheStore;

#[derive(Default)]
struct MemoryState {
    items: HashMap<String, CachedItem>,
    next_id: i64,
}

/// Cache store kept in process memory; contents are lost on exit
#[derive(Default)]
pub struct MemoryCacheStore {
    state: Mutex<MemoryState>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCacheStore {
    fn exists(&self, guid: &str) -> bool {
        self.state.lock().items.contains_key(guid)
    }

    fn upsert(&self, item: &FeedItem, title: &str, summary: &str, at: DateTime<Utc>) {
        let mut state = self.state.lock();

        if let Some(existing) = state.items.get_mut(&item.guid) {
            existing.title = title.to_string();
            existing.summary = summary.to_string();
            existing.updated_at = at;
            return;
        }

        state.next_id += 1;
        let mut cached = CachedItem::from_feed_item(item, title, summary, at);
        cached.id = state.next_id;
        state.items.insert(item.guid.clone(), cached);
    }

    fn fetch(&self, guid: &str) -> Option<CachedItem> {
        self.state.lock().items.get(guid).cloned()
    }

    fn mark_as_read(&self, guid: &str) {
        match self.state.lock().items.get_mut(guid) {
            Some(item) => {
                item.marked_as_read = true;
                item.updated_at = Utc::now();
            }
            None => warn!("No cached item with guid '{}' to mark as read", guid),
        }
    }

    fn list(&self, include_read: bool) -> Vec<CachedItem> {
        let state = self.state.lock();

        let mut items: Vec<CachedItem> = state
            .items
            .values()
            .filter(|item| include_read || !item.marked_as_read)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        if include_read {
            items.truncate(LIST_LIMIT);
        }
        items
    }

    fn delete_created_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut state = self.state.lock();
        let before = state.items.len();
        state.items.retain(|_, item| item.created_at >= cutoff);
        before - state.items.len()
    }
}
