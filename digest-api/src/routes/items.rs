//! Cached item endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::debug;

use crate::AppState;

/// Query parameters for marking an item as read
#[derive(Debug, Deserialize)]
pub struct ReadQuery {
    pub guid: String,
}

/// Create item routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_unread))
        .route("/items/read", post(mark_as_read))
}

/// GET /items - Unread cached items, newest first
async fn list_unread(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.list_cached_items(false))
}

/// POST /items/read?guid=... - Mark one cached item as read
async fn mark_as_read(
    State(state): State<AppState>,
    Query(params): Query<ReadQuery>,
) -> impl IntoResponse {
    if state.service.mark_as_read(&params.guid) {
        debug!("Marked {} as read", params.guid);
        StatusCode::NO_CONTENT.into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": format!("no cached item with guid '{}'", params.guid)
            })),
        )
            .into_response()
    }
}
