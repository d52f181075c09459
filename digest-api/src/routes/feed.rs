//! Published RSS feed

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::{error, warn};

use crate::AppState;

/// Create feed routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/feed", get(get_feed))
}

/// GET /feed - Cached items (read ones included) as RSS
async fn get_feed(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if let Some(allowed) = &state.allowed_user_agent {
        if !agent.contains(allowed.as_str()) {
            warn!("Dropping access from unwanted agent: {}", agent);
            return StatusCode::FORBIDDEN.into_response();
        }
    }

    let items = state.service.list_cached_items(true);
    match state.service.publish_xml(&state.feed_meta, &items) {
        Ok(xml) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/rss+xml"),
                (header::CACHE_CONTROL, "max-age=60"),
            ],
            xml,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to serve RSS feed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
