//! Feed Digest Server
//!
//! Summarizes the configured feeds in the background and serves the cache
//! as an RSS feed.

mod config;
mod routes;
mod worker;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    http::{header, Method},
    Router,
};
use digest_services::{DigestService, FeedMeta};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DigestService>,
    pub feed_meta: Arc<FeedMeta>,
    /// Feed readers allowed to fetch `/feed` (all when unset)
    pub allowed_user_agent: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,digest_api=debug")),
        )
        .init();

    info!("Starting Feed Digest server");

    let config = AppConfig::from_env()?;

    let service = match &config.cache_db_path {
        Some(path) => {
            info!("Initializing cache at: {}", path);
            DigestService::with_sqlite(
                config.feed_urls.clone(),
                config.api_keys.clone(),
                config.firecrawl_api_key.clone(),
                config.summarizer.clone(),
                path,
            )
        }
        None => {
            info!("CACHE_DB_PATH not set, caching in memory");
            DigestService::in_memory(
                config.feed_urls.clone(),
                config.api_keys.clone(),
                config.firecrawl_api_key.clone(),
                config.summarizer.clone(),
            )
        }
    }
    .context("Failed to initialize digest service")?;
    let service = Arc::new(service);

    // Sweep before the first run so stale items are not served
    service.delete_old_cached_items();

    let worker_service = Arc::clone(&service);
    let days = config.ignore_older_than_days;
    let period = config.fetch_interval;
    tokio::spawn(async move {
        worker::run_summarizer(worker_service, days, period).await;
    });

    let state = AppState {
        service,
        feed_meta: Arc::new(config.feed_meta.clone()),
        allowed_user_agent: config.allowed_user_agent.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .merge(routes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
