//! Feed and cache item data structures

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::summary::is_error_summary;

/// A single entry parsed from an RSS, Atom or JSON feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Globally unique identifier, used as the cache key
    pub guid: String,
    /// Entry title
    pub title: String,
    /// URL of the original article
    pub link: String,
    /// URL of the community comments (if the feed provides a second link)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    /// Author name, or e-mail when no name is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Publication date, when the feed carries a parseable one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Description or body as delivered by the feed
    #[serde(default)]
    pub description: String,
}

impl FeedItem {
    /// Publication date formatted the way it is stored in the cache
    pub fn publish_date(&self) -> String {
        self.published_at
            .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default()
    }

    /// Whether this item was published strictly before `cutoff`.
    ///
    /// Items without a publication date are never considered old.
    pub fn is_published_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.published_at.map(|d| d < cutoff).unwrap_or(false)
    }
}

/// The items fetched from one configured source URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFeed {
    /// URL the feed was fetched from
    pub url: String,
    /// Feed title
    pub title: String,
    /// Parsed items, in feed order
    pub items: Vec<FeedItem>,
}

/// A feed item as persisted by the cache store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedItem {
    /// Row identifier assigned by the store
    pub id: i64,
    /// Title, translated when summarization succeeded
    pub title: String,
    /// URL of the original article
    pub link: String,
    /// URL of the community comments
    pub comments: String,
    /// Unique identifier of the feed item
    pub guid: String,
    pub author: String,
    /// ISO-8601 publication date (empty when unknown)
    pub publish_date: String,
    /// Original description from the feed
    pub description: String,
    /// Generated summary, or an error-tagged diagnostic
    pub summary: String,
    pub marked_as_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CachedItem {
    /// Build a new record from a feed item, as the store does on first insert
    pub fn from_feed_item(
        item: &FeedItem,
        title: &str,
        summary: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            title: title.to_string(),
            link: item.link.clone(),
            comments: item.comments.clone().unwrap_or_default(),
            guid: item.guid.clone(),
            author: item.author.clone().unwrap_or_default(),
            publish_date: item.publish_date(),
            description: item.description.clone(),
            summary: summary.to_string(),
            marked_as_read: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a summary (successful or not) has been stored
    pub fn is_summarized(&self) -> bool {
        !self.summary.is_empty()
    }

    /// Whether the stored summary is an error-tagged diagnostic
    pub fn is_failed(&self) -> bool {
        is_error_summary(&self.summary)
    }
}
