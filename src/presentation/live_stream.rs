// Server-sent event streaming of live dashboard updates
use crate::domain::dashboard::LiveDashboard;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use tokio::sync::mpsc;

/// Turn a receiver of dashboards into an SSE response, one `live` event each.
pub fn sse_from_receiver(
    mut rx: mpsc::Receiver<LiveDashboard>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = async_stream::stream! {
        while let Some(dashboard) = rx.recv().await {
            match Event::default().event("live").json_data(&dashboard) {
                Ok(event) => yield Ok::<_, Infallible>(event),
                Err(e) => tracing::warn!("Failed to encode live event: {}", e),
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
