//! Gemini REST client
//!
//! Owns the HTTP client, the credential pool and the retry policy. The
//! summarization shapes built on top of it live in [`crate::backend`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::{Client, Response};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::GeminiError;
use crate::prompts::SUMMARIZE_FUNCTION_NAME;
use crate::types::{
    ApiErrorResponse, Content, GenerateContentRequest, GenerateContentResponse, SummarizeArgs,
};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const GENERATION_TIMEOUT_SECS: u64 = 60;
const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_SECS: u64 = 5;
const FILE_READY_TIMEOUT_SECS: u64 = 120;
const FILE_POLL_INTERVAL_MS: u64 = 1000;

/// Gemini client configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub model: String,
    /// API root, without a trailing slash
    pub base_url: String,
    /// Deadline of one generation request
    pub generation_timeout: Duration,
    /// Retries granted to transient server errors
    pub max_retries: u32,
    /// Fixed sleep before each retry
    pub retry_delay: Duration,
    /// Deadline for uploaded files to become `ACTIVE`
    pub file_ready_timeout: Duration,
    pub file_poll_interval: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            generation_timeout: Duration::from_secs(GENERATION_TIMEOUT_SECS),
            max_retries: MAX_RETRIES,
            retry_delay: Duration::from_secs(RETRY_DELAY_SECS),
            file_ready_timeout: Duration::from_secs(FILE_READY_TIMEOUT_SECS),
            file_poll_interval: Duration::from_millis(FILE_POLL_INTERVAL_MS),
        }
    }
}

impl GeminiConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Gemini API client with a round-robin credential pool
#[derive(Debug)]
pub struct GeminiClient {
    client: Client,
    api_keys: Vec<String>,
    key_index: AtomicUsize,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a client; blank keys are dropped and an empty pool is rejected
    pub fn new(api_keys: Vec<String>, config: GeminiConfig) -> Result<Self, GeminiError> {
        let api_keys: Vec<String> = api_keys
            .into_iter()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect();

        if api_keys.is_empty() {
            return Err(GeminiError::Config(
                "at least one Gemini API key is required".to_string(),
            ));
        }

        let client = Client::builder().build().map_err(GeminiError::from_reqwest)?;

        Ok(Self {
            client,
            api_keys,
            key_index: AtomicUsize::new(0),
            config,
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub fn api_keys(&self) -> &[String] {
        &self.api_keys
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Next credential of the pool
    pub(crate) fn rotated_api_key(&self) -> &str {
        let index = self.key_index.fetch_add(1, Ordering::Relaxed) % self.api_keys.len();
        &self.api_keys[index]
    }

    /// Call `generateContent`, retrying transient failures with a fixed delay.
    ///
    /// Overloaded and terminal errors are returned immediately.
    pub async fn generate(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let mut remaining = self.config.max_retries;

        loop {
            match self.generate_once(api_key, request).await {
                Err(e) if e.class().is_retryable() && remaining > 0 => {
                    warn!(
                        "Transient Gemini error, retrying in {:?} ({} left): {}",
                        self.config.retry_delay, remaining, e
                    );
                    remaining -= 1;
                    sleep(self.config.retry_delay).await;
                }
                result => return result,
            }
        }
    }

    async fn generate_once(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );

        debug!("Sending generation request to model {}", self.config.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .timeout(self.config.generation_timeout)
            .json(request)
            .send()
            .await
            .map_err(GeminiError::from_reqwest)?;

        check_status(response)
            .await?
            .json::<GenerateContentResponse>()
            .await
            .map_err(GeminiError::from_reqwest)
    }
}

/// Turn a non-success response into [`GeminiError::Api`]
pub(crate) async fn check_status(response: Response) -> Result<Response, GeminiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let error = match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(parsed) => GeminiError::Api {
            status: status.as_u16(),
            status_text: parsed.error.status,
            message: parsed.error.message,
        },
        Err(_) => GeminiError::Api {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            message: body,
        },
    };

    Err(error)
}

fn first_content(response: GenerateContentResponse) -> Result<Content, GeminiError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GeminiError::NoContent(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GeminiError::MalformedResponse("no candidate in response".to_string()))?;

    match candidate.content {
        Some(content) if !content.parts.is_empty() => Ok(content),
        _ => Err(GeminiError::NoContent(
            candidate
                .finish_reason
                .unwrap_or_else(|| "unknown".to_string()),
        )),
    }
}

/// Extract the arguments of the `summarize` function call
pub(crate) fn extract_summarize_args(
    response: GenerateContentResponse,
) -> Result<SummarizeArgs, GeminiError> {
    let content = first_content(response)?;

    let call = content
        .parts
        .into_iter()
        .find_map(|part| part.function_call)
        .ok_or_else(|| {
            GeminiError::MalformedResponse("no function call in generated content".to_string())
        })?;

    if call.name != SUMMARIZE_FUNCTION_NAME {
        return Err(GeminiError::MalformedResponse(format!(
            "unexpected function call: '{}'",
            call.name
        )));
    }

    serde_json::from_value(call.args).map_err(|e| {
        GeminiError::MalformedResponse(format!("failed to parse function call arguments: {}", e))
    })
}

/// Concatenate the text parts of the first candidate.
///
/// Empty text is returned as is; callers substitute the placeholder.
pub(crate) fn extract_text(response: GenerateContentResponse) -> Result<String, GeminiError> {
    let content = first_content(response)?;
    Ok(content.parts.into_iter().filter_map(|part| part.text).collect())
}
