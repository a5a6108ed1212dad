//! Route configuration for the relay API.

use std::sync::Arc;

use axum::routing::{Router, get, post};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::handlers::{dispatch, index, metrics, ping};
use crate::state::AppState;

/// Create the relay router.
pub fn create_router(state: Arc<AppState>, config: &AppConfig) -> Router {
    let router = Router::new()
        .route("/", get(index))
        .route("/ping", get(ping))
        .route("/metrics", get(metrics))
        .route("/dispatch", post(dispatch))
        .with_state(state)
        .layer(TimeoutLayer::new(config.server_timeout()));

    if config.enable_request_logs {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}
