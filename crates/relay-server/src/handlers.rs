//! HTTP request handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use relay_core::WebhookPayload;
use relay_metrics::PrometheusRegistry;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Query parameters for dispatch.
#[derive(Debug, Default, Deserialize)]
pub struct DispatchQuery {
    /// Room to deliver to. Defaults to the payload's receiver.
    pub room_name: Option<String>,
}

/// Ping response.
#[derive(Debug, Serialize)]
pub struct PingResponse {
    /// Always `pong`.
    pub ping: &'static str,
    /// Build version.
    pub build: &'static str,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
}

/// Dispatch response.
#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    /// Always `dispatched`.
    pub status: &'static str,
    /// Messages sent.
    pub sent: usize,
    /// Messages that failed delivery.
    pub failed: usize,
    /// Alerts skipped because their message could not be composed.
    pub skipped: usize,
}

/// Handle GET / - welcome text.
pub async fn index() -> &'static str {
    "Welcome to alert-relay. POST Alertmanager webhooks to /dispatch.\n"
}

/// Handle GET /ping - liveness probe.
pub async fn ping(State(state): State<Arc<AppState>>) -> Json<PingResponse> {
    Json(PingResponse {
        ping: "pong",
        build: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime_secs(),
    })
}

/// Handle GET /metrics - Prometheus exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, PrometheusRegistry::content_type())],
        state.metrics().encode(),
    )
}

/// Handle POST /dispatch - relay an Alertmanager notification to a room.
///
/// The batch runs on its own task, so a request timeout only abandons the
/// response. Every alert in the batch is still pushed.
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DispatchQuery>,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> ServerResult<Json<DispatchResponse>> {
    let Json(payload) = payload.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;

    let room = query
        .room_name
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| payload.receiver.clone());

    info!(room = %room, count = payload.alerts.len(), status = %payload.status, "received alerts");

    let batch = tokio::spawn(async move { state.notifier().dispatch(&payload, &room).await });
    let summary = batch
        .await
        .map_err(|e| ServerError::Internal(format!("dispatch task failed: {e}")))??;

    Ok(Json(DispatchResponse {
        status: "dispatched",
        sent: summary.sent,
        failed: summary.failed,
        skipped: summary.skipped,
    }))
}
