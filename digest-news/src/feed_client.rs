//! Feed client for configured sources
//!
//! Fetches RSS, Atom and JSON feeds and parses their entries into [`FeedItem`]s.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use digest_core::{FeedItem, SourceFeed};

use crate::content::{build_client, FAKE_USER_AGENT};
use crate::error::NewsError;
use crate::types::{JsonFeed, JsonFeedItem};

/// Timeout for fetching one feed document
pub const FEED_FETCH_TIMEOUT_SECS: u64 = 30;

/// Feed client
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    pub fn new() -> Result<Self, NewsError> {
        Self::with_timeout(Duration::from_secs(FEED_FETCH_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, NewsError> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }

    /// Fetch and parse a single feed
    #[instrument(skip(self))]
    pub async fn fetch_feed(&self, url: &str) -> Result<SourceFeed, NewsError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", FAKE_USER_AGENT)
            .header("Content-Type", "text/xml;charset=UTF-8")
            .send()
            .await
            .map_err(|e| NewsError::RequestFailed(format!("failed to fetch feeds from url: {}", e)))?;

        if !response.status().is_success() {
            return Err(NewsError::ApiError {
                status: response.status().as_u16(),
                message: format!("http error from url: '{}'", url),
            });
        }

        let content = response
            .bytes()
            .await
            .map_err(|e| NewsError::RequestFailed(format!("failed to read '{}': {}", url, e)))?;

        let feed = parse_feed(url, &content)?;
        debug!("Fetched {} item(s) from {}", feed.items.len(), url);

        Ok(feed)
    }
}

/// Parse a feed document, trying RSS first, then Atom, then JSON Feed
pub fn parse_feed(url: &str, content: &[u8]) -> Result<SourceFeed, NewsError> {
    if let Ok(channel) = rss::Channel::read_from(content) {
        return Ok(SourceFeed {
            url: url.to_string(),
            title: channel.title().to_string(),
            items: channel.items().iter().filter_map(parse_rss_item).collect(),
        });
    }

    if let Ok(atom_feed) = atom_syndication::Feed::read_from(content) {
        return Ok(SourceFeed {
            url: url.to_string(),
            title: atom_feed.title().to_string(),
            items: atom_feed.entries().iter().filter_map(parse_atom_entry).collect(),
        });
    }

    if let Ok(json_feed) = serde_json::from_slice::<JsonFeed>(content) {
        if json_feed.version.contains("jsonfeed.org") {
            return Ok(SourceFeed {
                url: url.to_string(),
                title: json_feed.title,
                items: json_feed.items.iter().filter_map(parse_json_item).collect(),
            });
        }
    }

    Err(NewsError::ParseError(format!(
        "failed to parse feeds from '{}'",
        url
    )))
}

fn parse_rss_item(item: &rss::Item) -> Option<FeedItem> {
    let link = item.link().unwrap_or_default().to_string();
    let title = item.title().unwrap_or_default().to_string();
    if link.is_empty() && title.is_empty() {
        return None;
    }

    let guid = item
        .guid()
        .map(|g| g.value().to_string())
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| fallback_guid(&link, &title));

    let author = item
        .author()
        .map(str::to_string)
        .or_else(|| {
            item.dublin_core_ext()
                .and_then(|dc| dc.creators().first().cloned())
        })
        .filter(|a| !a.is_empty());

    let published_at = item.pub_date().and_then(parse_date);

    let description = item
        .description()
        .or_else(|| item.content())
        .unwrap_or_default()
        .to_string();

    Some(FeedItem {
        guid,
        title,
        link,
        comments: item.comments().map(str::to_string).filter(|c| !c.is_empty()),
        author,
        published_at,
        description,
    })
}

fn parse_atom_entry(entry: &atom_syndication::Entry) -> Option<FeedItem> {
    let mut hrefs = entry.links().iter().map(|l| l.href().to_string());
    let link = hrefs.next().unwrap_or_default();
    let comments = hrefs.next();

    let title = entry.title().to_string();
    if link.is_empty() && title.is_empty() {
        return None;
    }

    let guid = if entry.id().is_empty() {
        fallback_guid(&link, &title)
    } else {
        entry.id().to_string()
    };

    let author = entry.authors().first().and_then(|person| {
        if !person.name().is_empty() {
            Some(person.name().to_string())
        } else {
            person.email().map(str::to_string)
        }
    });

    let published_at = entry
        .published()
        .or_else(|| Some(entry.updated()))
        .map(|d| d.with_timezone(&Utc));

    let description = entry
        .summary()
        .map(|s| s.as_str().to_string())
        .or_else(|| entry.content().and_then(|c| c.value()).map(str::to_string))
        .unwrap_or_default();

    Some(FeedItem {
        guid,
        title,
        link,
        comments,
        author,
        published_at,
        description,
    })
}

fn parse_json_item(item: &JsonFeedItem) -> Option<FeedItem> {
    let link = item.url.clone().unwrap_or_default();
    let title = item.title.clone().unwrap_or_default();
    if link.is_empty() && title.is_empty() {
        return None;
    }

    let guid = match &item.id {
        serde_json::Value::String(s) if !s.is_empty() => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => fallback_guid(&link, &title),
    };

    let author = item
        .authors
        .first()
        .or(item.author.as_ref())
        .and_then(|a| a.name.clone().or_else(|| a.url.clone()));

    let published_at = item
        .date_published
        .as_deref()
        .or(item.date_modified.as_deref())
        .and_then(parse_date);

    let description = item
        .content_html
        .clone()
        .or_else(|| item.content_text.clone())
        .or_else(|| item.summary.clone())
        .unwrap_or_default();

    Some(FeedItem {
        guid,
        title,
        link,
        comments: item.external_url.clone(),
        author,
        published_at,
        description,
    })
}

/// Parse RFC 2822 (RSS) or RFC 3339 (Atom, JSON Feed) dates
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|d| d.with_timezone(&Utc))
        .ok()
}

/// Identifier for entries that carry none: hash of the link (or title)
fn fallback_guid(link: &str, title: &str) -> String {
    let key = if link.is_empty() { title } else { link };
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(&hasher.finalize()[..8])
}
