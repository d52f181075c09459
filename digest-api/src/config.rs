//! Environment configuration

use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};
use digest_services::{FeedMeta, SummarizerConfig};

/// Settings of the server and the background summarizer
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_keys: Vec<String>,
    pub feed_urls: Vec<String>,
    /// SQLite file of the cache; `None` keeps the cache in memory
    pub cache_db_path: Option<String>,
    pub firecrawl_api_key: Option<String>,
    pub summarizer: SummarizerConfig,
    /// Items published longer ago than this are not summarized (0 keeps all)
    pub ignore_older_than_days: i64,
    /// Pause between two runs of the background summarizer
    pub fetch_interval: Duration,
    pub port: u16,
    pub feed_meta: FeedMeta,
    /// Only user agents containing this string may read the feed
    pub allowed_user_agent: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_keys = env_list("GEMINI_API_KEYS");
        if api_keys.is_empty() {
            bail!("GEMINI_API_KEYS must contain at least one key");
        }
        let feed_urls = env_list("FEED_URLS");
        if feed_urls.is_empty() {
            bail!("FEED_URLS must contain at least one feed url");
        }

        let mut summarizer = SummarizerConfig::default();
        if let Some(model) = env_opt("GEMINI_MODEL") {
            summarizer.model = model;
        }
        if let Some(language) = env_opt("DESIRED_LANGUAGE") {
            summarizer.desired_language = language;
        }
        summarizer.summarize_interval = Duration::from_secs(env_parse(
            "SUMMARIZE_INTERVAL_SECS",
            summarizer.summarize_interval.as_secs(),
        )?);

        Ok(Self {
            api_keys,
            feed_urls,
            cache_db_path: env_opt("CACHE_DB_PATH"),
            firecrawl_api_key: env_opt("FIRECRAWL_API_KEY"),
            summarizer,
            ignore_older_than_days: env_parse("IGNORE_OLDER_THAN_DAYS", 7)?,
            fetch_interval: Duration::from_secs(env_parse("FETCH_INTERVAL_SECS", 60 * 60)?),
            port: env_parse("PORT", 10101)?,
            feed_meta: FeedMeta {
                title: env_opt("FEED_TITLE").unwrap_or_else(|| "Summarized feeds".to_string()),
                link: env_opt("FEED_LINK").unwrap_or_default(),
                description: env_opt("FEED_DESCRIPTION")
                    .unwrap_or_else(|| "Feed items summarized with Gemini".to_string()),
                author: env_opt("FEED_AUTHOR").unwrap_or_default(),
                email: env_opt("FEED_EMAIL").unwrap_or_default(),
            },
            allowed_user_agent: env_opt("ALLOWED_USER_AGENT"),
        })
    }
}

/// Non-empty value of `name`
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Comma separated values of `name`, blanks dropped
fn env_list(name: &str) -> Vec<String> {
    env_opt(name).map(|v| split_list(&v)).unwrap_or_default()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn env_parse<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env_opt(name) {
        Some(value) => value
            .parse()
            .with_context(|| format!("invalid value for {}: '{}'", name, value)),
        None => Ok(default),
    }
}
