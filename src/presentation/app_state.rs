// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::history_service::HistoryService;
use crate::application::poll_loop::{LiveReader, PollLoop};
use crate::application::streaming_service::StreamingDashboardService;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub live: LiveReader,
    pub poll_loop: Arc<Mutex<PollLoop>>,
    pub dashboards: DashboardService,
    pub history_service: HistoryService,
    pub streaming_service: StreamingDashboardService,
}
