// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod error;
mod infrastructure;
mod presentation;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::history_service::HistoryService;
use crate::application::poll_loop::PollLoop;
use crate::application::streaming_service::StreamingDashboardService;
use crate::domain::series_buffer::RollingSeriesBuffer;
use crate::infrastructure::config::{load_monitor_config, load_widgets_config};
use crate::infrastructure::http_sensor_api::HttpSensorApi;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    analytics, health_check, history, live_dashboard, reset_live, stream_live,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("window_monitor=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let monitor_config = load_monitor_config()?;
    let widgets_config = load_widgets_config()?;

    // Sensor API client serves both the live loop and history requests
    let sensor_api = Arc::new(HttpSensorApi::new(&monitor_config.api, widgets_config.channel_ids())?);

    let buffer = RollingSeriesBuffer::new(widgets_config.channel_ids(), monitor_config.poll.capacity)?;
    let mut poll_loop = PollLoop::new(sensor_api.clone(), monitor_config.poll_settings(), buffer);
    poll_loop.start();
    let live = poll_loop.reader();

    // Create services (application layer)
    let dashboards = DashboardService::new(widgets_config, monitor_config.stale_after());
    let history_service = HistoryService::new(sensor_api);
    let streaming_service = StreamingDashboardService::new(live.clone(), dashboards.clone());

    let state = Arc::new(AppState {
        live,
        poll_loop: Arc::new(Mutex::new(poll_loop)),
        dashboards,
        history_service,
        streaming_service,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/api/live", get(live_dashboard))
        .route("/api/live/stream", get(stream_live))
        .route("/api/live/reset", post(reset_live))
        .route("/api/history", get(history))
        .route("/api/analytics", get(analytics))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Start server
    let addr = monitor_config.listen_addr()?;
    tracing::info!("Starting window-monitor on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = state.poll_loop.lock().await.stop().await {
        tracing::error!("Poll loop had halted: {}", e);
    }
    tracing::info!("Shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
