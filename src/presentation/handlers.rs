// HTTP request handlers
use crate::application::history_service::HistoryOrder;
use crate::domain::dashboard::LiveDashboard;
use crate::error::MonitorError;
use crate::presentation::app_state::AppState;
use crate::presentation::live_stream::sse_from_receiver;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
    #[serde(default)]
    pub order: HistoryOrder,
}

#[derive(Deserialize)]
pub struct AnalyticsQuery {
    pub limit: Option<usize>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current readings and rolling trend
pub async fn live_dashboard(State(state): State<Arc<AppState>>) -> Json<LiveDashboard> {
    let view = state.live.current();
    Json(state.dashboards.live_dashboard(&view, Utc::now()))
}

/// Push a dashboard after every poll cycle
pub async fn stream_live(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rx = state.streaming_service.stream_live();
    sse_from_receiver(rx)
}

/// Clear the rolling window
pub async fn reset_live(State(state): State<Arc<AppState>>) -> StatusCode {
    state.poll_loop.lock().await.reset().await;
    StatusCode::NO_CONTENT
}

/// Historical readings table
pub async fn history(
    Query(query): Query<HistoryQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

    match state.history_service.history(limit, query.order).await {
        Ok(readings) => Json(state.dashboards.history_table(&readings)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Stats cards and chronological charts over the same window
pub async fn analytics(
    Query(query): Query<AnalyticsQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

    match state.history_service.analytics(limit).await {
        Ok((readings, stats)) => Json(state.dashboards.analytics(&readings, &stats)).into_response(),
        Err(e) => error_response(e),
    }
}

fn error_status(err: &MonitorError) -> StatusCode {
    match err {
        MonitorError::InvalidLimit => StatusCode::BAD_REQUEST,
        MonitorError::Fetch(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: MonitorError) -> Response {
    let status = error_status(&err);
    tracing::warn!("Request failed ({}): {}", status, err);

    let body = Json(json!({
        "error": err.to_string(),
        "kind": err.kind(),
    }));
    (status, body).into_response()
}
