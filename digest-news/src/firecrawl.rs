//! Firecrawl API client used as a content scrapper

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::content::{build_client, ContentScrapper};
use crate::error::NewsError;
use crate::types::{FirecrawlScrapeRequest, FirecrawlScrapeResponse};

const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev";

/// Timeout for one scrape request
pub const SCRAPE_TIMEOUT_SECS: u64 = 60;

/// Firecrawl API client
pub struct FirecrawlClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl FirecrawlClient {
    /// Create a new Firecrawl client
    pub fn new(api_key: String) -> Result<Self, NewsError> {
        Self::with_timeout(api_key, Duration::from_secs(SCRAPE_TIMEOUT_SECS))
    }

    pub fn with_timeout(api_key: String, timeout: Duration) -> Result<Self, NewsError> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at another endpoint (self-hosted instances)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ContentScrapper for FirecrawlClient {
    /// Scrape a page and return its main content as markdown
    #[instrument(skip(self))]
    async fn scrape(&self, url: &str) -> Result<String, NewsError> {
        let request = FirecrawlScrapeRequest {
            url: url.to_string(),
            formats: vec!["markdown".to_string()],
            only_main_content: true,
        };

        debug!("Scraping page: {}", url);

        let response = self
            .client
            .post(format!("{}/v1/scrape", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| NewsError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NewsError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let firecrawl_response: FirecrawlScrapeResponse = response
            .json()
            .await
            .map_err(|e| NewsError::ParseError(e.to_string()))?;

        if !firecrawl_response.success {
            return Err(NewsError::ScrapeFailed(
                firecrawl_response
                    .error
                    .unwrap_or_else(|| "Unknown scrape error".to_string()),
            ));
        }

        let markdown = firecrawl_response
            .data
            .and_then(|data| data.markdown)
            .filter(|markdown| !markdown.trim().is_empty())
            .ok_or_else(|| NewsError::ScrapeFailed("No markdown content".to_string()))?;

        debug!("Successfully scraped {} chars", markdown.len());

        Ok(markdown)
    }
}
