//! Feed sources and article content acquisition
//!
//! This crate provides:
//! - Feed client: fetches RSS, Atom and JSON feeds and parses their items
//! - Content fetcher: resolves an article URL to text or file bytes for prompting
//! - Firecrawl: optional web scrapper used as an alternate fetch strategy
//! - YouTube helpers: detection and normalization of video URLs

pub mod content;
pub mod error;
pub mod feed_client;
pub mod firecrawl;
pub mod types;
pub mod youtube;

pub use content::{
    is_file_content, is_html_content, is_text_formattable_content, wrap_url_text,
    ContentFetcher, ContentScrapper, FetchedContent, HttpContentFetcher,
};
pub use error::{FetchError, NewsError};
pub use feed_client::FeedClient;
pub use firecrawl::FirecrawlClient;
pub use youtube::{is_youtube_url, normalize_youtube_url};
