//! Hand-written fakes shared by the unit tests of this crate

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use digest_core::{GenerationResult, SourceFeed};
use digest_gemini::{GeminiError, GenerativeBackend, PromptFile};
use digest_news::{ContentFetcher, ContentScrapper, FetchError, FetchedContent, NewsError};
use parking_lot::Mutex;

use crate::reconciler::FeedSource;

pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

#[derive(Debug, Clone)]
pub enum FakeFailure {
    Overloaded,
    Terminal(String),
}

impl FakeFailure {
    fn to_error(&self) -> GeminiError {
        match self {
            FakeFailure::Overloaded => GeminiError::Api {
                status: 503,
                status_text: "UNAVAILABLE".to_string(),
                message: "The model is overloaded. Please try again later.".to_string(),
            },
            FakeFailure::Terminal(message) => GeminiError::Api {
                status: 400,
                status_text: "INVALID_ARGUMENT".to_string(),
                message: message.clone(),
            },
        }
    }
}

/// Backend answering every call with a canned result
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<&'static str>>,
    contents: Mutex<Vec<String>>,
    titles: Mutex<Vec<String>>,
    failure: Option<FakeFailure>,
    failures_by_title: HashMap<String, FakeFailure>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overloaded(mut self) -> Self {
        self.failure = Some(FakeFailure::Overloaded);
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(FakeFailure::Terminal(message.to_string()));
        self
    }

    pub fn failing_for(mut self, title: &str, failure: FakeFailure) -> Self {
        self.failures_by_title.insert(title.to_string(), failure);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    /// Titles of every summarization request, in order
    pub fn titles(&self) -> Vec<String> {
        self.titles.lock().clone()
    }

    pub fn last_content(&self) -> String {
        self.contents.lock().last().cloned().unwrap_or_default()
    }

    fn record(
        &self,
        call: &'static str,
        title: &str,
        content: String,
    ) -> Result<(), GeminiError> {
        self.calls.lock().push(call);
        self.titles.lock().push(title.to_string());
        self.contents.lock().push(content);

        match self.failures_by_title.get(title).or(self.failure.as_ref()) {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GenerativeBackend for FakeBackend {
    fn model(&self) -> &str {
        "fake-model"
    }

    fn secrets(&self) -> Vec<String> {
        vec!["secret-key".to_string()]
    }

    async fn summarize_text(
        &self,
        title: &str,
        content: &str,
        _language: &str,
    ) -> Result<GenerationResult, GeminiError> {
        self.record("text", title, content.to_string())?;
        Ok(GenerationResult::succeeded(
            format!("[T] {}", title),
            format!("Summary of {}", title),
        ))
    }

    async fn summarize_files(
        &self,
        title: &str,
        files: Vec<PromptFile>,
        _language: &str,
    ) -> Result<GenerationResult, GeminiError> {
        let mime_types: Vec<String> = files.into_iter().map(|f| f.mime_type).collect();
        self.record("files", title, mime_types.join(","))?;
        Ok(GenerationResult::succeeded(
            format!("[T] {}", title),
            format!("Summary of file {}", title),
        ))
    }

    async fn summarize_url(
        &self,
        title: &str,
        url: &str,
        _language: &str,
    ) -> Result<GenerationResult, GeminiError> {
        self.record("url", title, url.to_string())?;
        Ok(GenerationResult::succeeded(title, format!("Summary of {}", url)))
    }

    async fn summarize_video(
        &self,
        title: &str,
        video_url: &str,
        _language: &str,
    ) -> Result<GenerationResult, GeminiError> {
        self.record("video", title, video_url.to_string())?;
        Ok(GenerationResult::succeeded(
            format!("[T] {}", title),
            format!("Summary of video {}", video_url),
        ))
    }
}

/// Fetcher returning a fixed content (or failing), logging every call
pub struct FakeFetcher {
    log: CallLog,
    probe: Option<String>,
    content: Option<FetchedContent>,
}

impl FakeFetcher {
    pub fn text(content_type: &str, body: &str) -> Self {
        Self {
            log: CallLog::default(),
            probe: Some(content_type.to_string()),
            content: Some(FetchedContent::new(body.as_bytes().to_vec(), content_type)),
        }
    }

    pub fn file(content_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            log: CallLog::default(),
            probe: Some(content_type.to_string()),
            content: Some(FetchedContent::new(bytes, content_type)),
        }
    }

    pub fn failing() -> Self {
        Self {
            log: CallLog::default(),
            probe: None,
            content: None,
        }
    }

    pub fn with_probe(mut self, content_type: &str) -> Self {
        self.probe = Some(content_type.to_string());
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl ContentFetcher for FakeFetcher {
    async fn probe_content_type(&self, url: &str) -> Result<String, NewsError> {
        self.log.lock().push("probe");
        self.probe
            .clone()
            .ok_or_else(|| NewsError::RequestFailed(format!("no head for {}", url)))
    }

    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError> {
        self.log.lock().push("fetch");
        self.content.clone().ok_or_else(|| {
            FetchError::new(
                format!("http error 404 from url: {}", url),
                FetchedContent::wrapped(url, "text/html", "HTTP Error 404"),
            )
        })
    }
}

/// Scrapper sharing the fetcher's call log
pub struct FakeScrapper {
    log: CallLog,
    markdown: Option<String>,
}

impl FakeScrapper {
    pub fn failing(log: CallLog) -> Self {
        Self {
            log,
            markdown: None,
        }
    }

    pub fn returning(log: CallLog, markdown: &str) -> Self {
        Self {
            log,
            markdown: Some(markdown.to_string()),
        }
    }
}

#[async_trait]
impl ContentScrapper for FakeScrapper {
    async fn scrape(&self, _url: &str) -> Result<String, NewsError> {
        self.log.lock().push("scrape");
        self.markdown
            .clone()
            .ok_or_else(|| NewsError::ScrapeFailed("blocked".to_string()))
    }
}

/// Feed source serving canned feeds by URL
#[derive(Default)]
pub struct FakeFeedSource {
    feeds: HashMap<String, SourceFeed>,
}

impl FakeFeedSource {
    pub fn new(feeds: Vec<SourceFeed>) -> Self {
        Self {
            feeds: feeds.into_iter().map(|f| (f.url.clone(), f)).collect(),
        }
    }
}

#[async_trait]
impl FeedSource for FakeFeedSource {
    async fn fetch_feed(&self, url: &str) -> Result<SourceFeed, NewsError> {
        self.feeds.get(url).cloned().ok_or_else(|| NewsError::ApiError {
            status: 404,
            message: format!("http error from url: '{}'", url),
        })
    }
}
