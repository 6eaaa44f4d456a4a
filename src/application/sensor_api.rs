// Ports for reading from the remote sensor API
use crate::domain::sample::Sample;
use crate::domain::stats::StatsSummary;
use crate::error::FetchError;
use async_trait::async_trait;

/// Source of the single most recent reading, polled by the live loop.
#[async_trait]
pub trait SampleSource: Send + Sync {
    async fn fetch_latest(&self) -> Result<Sample, FetchError>;
}

#[async_trait]
pub trait ReadingsRepository: Send + Sync {
    /// Up to `limit` most recent readings, newest first
    async fn recent_readings(&self, limit: usize) -> Result<Vec<Sample>, FetchError>;

    /// Statistics over the same window `recent_readings(limit)` covers
    async fn stats(&self, limit: usize) -> Result<StatsSummary, FetchError>;
}
