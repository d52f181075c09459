//! HTTP route definitions

mod feed;
mod health;
mod items;

use axum::Router;

use crate::AppState;

/// Create all routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(feed::routes())
        .merge(items::routes())
        .merge(health::routes())
}
