// Streaming dashboard service - Pushes a fresh live dashboard after every poll cycle
use crate::application::dashboard_service::DashboardService;
use crate::application::poll_loop::LiveReader;
use crate::domain::dashboard::LiveDashboard;
use chrono::Utc;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct StreamingDashboardService {
    live: LiveReader,
    dashboards: DashboardService,
}

impl StreamingDashboardService {
    pub fn new(live: LiveReader, dashboards: DashboardService) -> Self {
        Self { live, dashboards }
    }

    /// Sends the current dashboard immediately, then one per published update.
    /// The forwarding task ends when the receiver is dropped or the poll loop goes away.
    pub fn stream_live(&self) -> mpsc::Receiver<LiveDashboard> {
        let (tx, rx) = mpsc::channel(16);
        let mut updates = self.live.subscribe();
        let dashboards = self.dashboards.clone();

        tokio::spawn(async move {
            loop {
                let view = updates.borrow_and_update().clone();
                let dashboard = dashboards.live_dashboard(&view, Utc::now());
                if tx.send(dashboard).await.is_err() {
                    tracing::debug!("Live stream subscriber went away");
                    break;
                }
                if updates.changed().await.is_err() {
                    break;
                }
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::poll_loop::{PollLoop, PollSettings};
    use crate::application::sensor_api::fakes::ScriptedSource;
    use crate::domain::connectivity::Freshness;
    use crate::domain::sample::sample_at;
    use crate::domain::series_buffer::RollingSeriesBuffer;
    use crate::infrastructure::config::{ChannelConfig, WidgetsConfig};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_stream_follows_poll_cycles() {
        let source = Arc::new(ScriptedSource::new([Ok(sample_at(1, &[("temp", 10.0)]))]));
        let settings = PollSettings {
            interval: Duration::from_secs(2),
            request_timeout: Duration::from_millis(500),
        };
        let poll = PollLoop::new(source, settings, RollingSeriesBuffer::new(["temp"], 5).unwrap());
        let widgets = WidgetsConfig {
            title: "Test".to_string(),
            channels: vec![ChannelConfig {
                id: "temp".to_string(),
                title: "Temp".to_string(),
                unit: String::new(),
                precision: 1,
                color: None,
                y_min: None,
                y_max: None,
            }],
        };
        let streaming = StreamingDashboardService::new(
            poll.reader(),
            DashboardService::new(widgets, Duration::from_secs(6)),
        );

        let mut rx = streaming.stream_live();
        let first = rx.recv().await.unwrap();
        assert_eq!(first.freshness, Freshness::Waiting);

        poll.run_cycle().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(second.freshness, Freshness::Live);
        assert_eq!(second.tiles[0].value, 10.0);
    }
}
