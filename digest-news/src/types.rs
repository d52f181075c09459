//! Wire types for Firecrawl and JSON Feed documents

use serde::{Deserialize, Serialize};

// ============================================================================
// Firecrawl Types
// ============================================================================

/// Firecrawl scrape request
#[derive(Debug, Serialize)]
pub struct FirecrawlScrapeRequest {
    /// URL to scrape
    pub url: String,
    /// Output formats to return
    pub formats: Vec<String>,
    /// Only extract main content
    #[serde(rename = "onlyMainContent")]
    pub only_main_content: bool,
}

/// Firecrawl scrape response
#[derive(Debug, Deserialize)]
pub struct FirecrawlScrapeResponse {
    /// Whether the scrape was successful
    pub success: bool,
    /// Scraped data
    pub data: Option<FirecrawlScrapeData>,
    /// Error message if failed
    pub error: Option<String>,
}

/// Scraped data from Firecrawl
#[derive(Debug, Deserialize)]
pub struct FirecrawlScrapeData {
    /// Markdown content
    pub markdown: Option<String>,
}

// ============================================================================
// JSON Feed Types (https://www.jsonfeed.org/version/1.1/)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct JsonFeed {
    pub version: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<JsonFeedItem>,
}

#[derive(Debug, Deserialize)]
pub struct JsonFeedItem {
    pub id: serde_json::Value,
    pub url: Option<String>,
    pub external_url: Option<String>,
    pub title: Option<String>,
    pub content_html: Option<String>,
    pub content_text: Option<String>,
    pub summary: Option<String>,
    pub date_published: Option<String>,
    pub date_modified: Option<String>,
    /// Version 1.0 single author
    pub author: Option<JsonFeedAuthor>,
    /// Version 1.1 author list
    #[serde(default)]
    pub authors: Vec<JsonFeedAuthor>,
}

#[derive(Debug, Deserialize)]
pub struct JsonFeedAuthor {
    pub name: Option<String>,
    pub url: Option<String>,
}
