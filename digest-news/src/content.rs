//! Article content acquisition
//!
//! Resolves an article URL to something a generative model can consume:
//! visible text wrapped with its origin, or raw bytes for file uploads.

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{header, Client, StatusCode};
use scraper::{ElementRef, Html, Node};
use tracing::{debug, instrument, warn};

use crate::error::{FetchError, NewsError};

/// Browser-like user agent; several sites refuse unknown agents
pub const FAKE_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Timeout for probing and fetching a single URL
pub const FETCH_URL_TIMEOUT_SECS: u64 = 10;

/// Elements whose text never reaches the prompt
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "link"];

/// Wrap fetched text with the URL and content type it came from
pub fn wrap_url_text(url: &str, content_type: &str, text: &str) -> String {
    format!(
        "<link url=\"{}\" content-type=\"{}\">\n{}\n</link>",
        url, content_type, text
    )
}

/// Whether a content type can be inlined into a text prompt
pub fn is_text_formattable_content(content_type: &str) -> bool {
    content_type.starts_with("text/") || content_type.starts_with("application/json")
}

/// Whether a content type should be uploaded as a file
pub fn is_file_content(content_type: &str) -> bool {
    content_type.starts_with("application/pdf")
}

pub fn is_html_content(content_type: &str) -> bool {
    content_type.starts_with("text/html")
}

/// Bytes fetched from a URL together with their content type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedContent {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl FetchedContent {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    /// Build the wrapped text body for `url`
    pub fn wrapped(url: &str, content_type: &str, text: &str) -> Self {
        Self::new(wrap_url_text(url, content_type, text), content_type)
    }

    pub fn is_text(&self) -> bool {
        is_text_formattable_content(&self.content_type)
    }

    pub fn is_file(&self) -> bool {
        is_file_content(&self.content_type)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// Plain fetch strategy: metadata probe plus full download
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Determine the content type of `url` without downloading its body
    async fn probe_content_type(&self, url: &str) -> Result<String, NewsError>;

    /// Download `url` and convert it for prompting
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError>;
}

/// Alternate fetch strategy returning extracted page text
#[async_trait]
pub trait ContentScrapper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<String, NewsError>;
}

/// HTTP implementation of [`ContentFetcher`]
#[derive(Debug, Clone)]
pub struct HttpContentFetcher {
    client: Client,
}

/// HTTP client with a per-request timeout and the browser user agent
pub(crate) fn build_client(timeout: Duration) -> Result<Client, NewsError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(FAKE_USER_AGENT)
        .build()
        .map_err(|e| NewsError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))
}

impl HttpContentFetcher {
    pub fn new() -> Result<Self, NewsError> {
        Self::with_timeout(Duration::from_secs(FETCH_URL_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, NewsError> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }

    async fn read_text(
        response: reqwest::Response,
        url: &str,
        content_type: &str,
    ) -> Result<String, FetchError> {
        response.text().await.map_err(|e| {
            FetchError::new(
                format!("failed to read '{}' document from {}: {}", content_type, url, e),
                FetchedContent::wrapped(url, content_type, "Failed to read this document."),
            )
        })
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    #[instrument(skip(self))]
    async fn probe_content_type(&self, url: &str) -> Result<String, NewsError> {
        debug!("Fetching head from url: {}", url);

        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| NewsError::RequestFailed(format!("failed to fetch head from url: {}", e)))?;

        Ok(content_type_of(&response))
    }

    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError> {
        debug!("Fetching contents from url: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            FetchError::new(
                format!("failed to fetch contents from url: {}", e),
                FetchedContent::wrapped(url, "", &format!("Failed to fetch this URL: {}", e)),
            )
        })?;

        let status = response.status();
        let content_type = content_type_of(&response);

        debug!("Fetched '{}' ({}) from url: {}", content_type, status, url);

        if status != StatusCode::OK {
            return Err(FetchError::new(
                format!("http error {} from url: {}", status.as_u16(), url),
                FetchedContent::wrapped(
                    url,
                    &content_type,
                    &format!("HTTP Error {}", status.as_u16()),
                ),
            ));
        }

        if is_html_content(&content_type) {
            let html = Self::read_text(response, url, &content_type).await?;
            let text = extract_visible_text(&html);
            Ok(FetchedContent::wrapped(
                url,
                &content_type,
                &remove_consecutive_empty_lines(&text),
            ))
        } else if content_type.starts_with("text/") {
            let text = Self::read_text(response, url, &content_type).await?;
            Ok(FetchedContent::wrapped(
                url,
                &content_type,
                &remove_consecutive_empty_lines(&text),
            ))
        } else if content_type.starts_with("application/json") {
            let text = Self::read_text(response, url, &content_type).await?;
            Ok(FetchedContent::wrapped(url, &content_type, &text))
        } else if is_file_content(&content_type) {
            let bytes = response.bytes().await.map_err(|e| {
                FetchError::new(
                    format!("failed to read bytes from url '{}': {}", url, e),
                    FetchedContent::wrapped(url, &content_type, "Failed to read this file."),
                )
            })?;
            Ok(FetchedContent::new(bytes.to_vec(), content_type))
        } else {
            warn!("Content type '{}' not supported for url: {}", content_type, url);
            Err(FetchError::new(
                format!("content type '{}' not supported for url: {}", content_type, url),
                FetchedContent::wrapped(
                    url,
                    &content_type,
                    &format!("Content type '{}' not supported.", content_type),
                ),
            ))
        }
    }
}

fn content_type_of(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Extract the visible text of an HTML document
pub fn extract_visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();
    collect_text(document.root_element(), &mut text);
    text
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) if SKIPPED_ELEMENTS.contains(&e.name()) => {}
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
            }
            _ => {}
        }
    }
}

/// Trim trailing spaces on every line and collapse runs of empty lines
pub fn remove_consecutive_empty_lines(input: &str) -> String {
    let trimmed = input
        .split('\n')
        .map(|line| line.trim_end_matches(' '))
        .collect::<Vec<_>>()
        .join("\n");

    match Regex::new(r"\n{2,}") {
        Ok(re) => re.replace_all(&trimmed, "\n").into_owned(),
        Err(_) => trimmed,
    }
}
