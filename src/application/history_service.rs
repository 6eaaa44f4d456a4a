// History service - On-demand, limit-bounded history and analytics fetches
use crate::application::sensor_api::ReadingsRepository;
use crate::domain::sample::Sample;
use crate::domain::stats::StatsSummary;
use crate::error::MonitorError;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryOrder {
    /// As the API returns them
    #[default]
    Newest,
    /// Chronological, for charts
    Oldest,
}

#[derive(Clone)]
pub struct HistoryService {
    repository: Arc<dyn ReadingsRepository>,
}

impl HistoryService {
    pub fn new(repository: Arc<dyn ReadingsRepository>) -> Self {
        Self { repository }
    }

    /// Fetch up to `limit` of the most recent readings.
    ///
    /// Every call goes to the API; nothing is cached or retried.
    pub async fn history(&self, limit: usize, order: HistoryOrder) -> Result<Vec<Sample>, MonitorError> {
        if limit == 0 {
            return Err(MonitorError::InvalidLimit);
        }

        let mut readings = self.repository.recent_readings(limit).await?;
        if readings.len() > limit {
            tracing::debug!("API returned {} readings for limit {}", readings.len(), limit);
            readings.truncate(limit);
        }

        if order == HistoryOrder::Oldest {
            readings.reverse();
        }
        Ok(readings)
    }

    /// Readings (oldest first) and stats over the same window, fetched together.
    pub async fn analytics(&self, limit: usize) -> Result<(Vec<Sample>, StatsSummary), MonitorError> {
        if limit == 0 {
            return Err(MonitorError::InvalidLimit);
        }

        let (readings, stats) = futures::try_join!(
            self.history(limit, HistoryOrder::Oldest),
            async { self.repository.stats(limit).await.map_err(MonitorError::from) },
        )?;

        Ok((readings, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sensor_api::fakes::StoredReadings;
    use crate::domain::sample::sample_at;
    use crate::domain::stats::ChannelStats;
    use crate::error::FetchError;

    fn stored(count: i64) -> StoredReadings {
        let newest_first = (0..count)
            .rev()
            .map(|i| sample_at(i, &[("temperature", i as f64)]).with_validity(i % 7 != 0))
            .collect();
        StoredReadings {
            newest_first,
            stats: StatsSummary {
                count: count as u64,
                channels: [(
                    "temperature".to_string(),
                    ChannelStats {
                        min: 0.0,
                        max: (count - 1) as f64,
                        avg: (count - 1) as f64 / 2.0,
                    },
                )]
                .into_iter()
                .collect(),
            },
            failure: None,
            ignore_limit: false,
        }
    }

    #[tokio::test]
    async fn test_limit_bounds_result() {
        let service = HistoryService::new(Arc::new(stored(80)));
        let readings = service.history(50, HistoryOrder::Newest).await.unwrap();

        assert_eq!(readings.len(), 50);
        assert_eq!(readings[0].value("temperature"), Some(79.0));
    }

    #[tokio::test]
    async fn test_large_limit_returns_what_exists() {
        let service = HistoryService::new(Arc::new(stored(10)));
        let readings = service.history(500, HistoryOrder::Newest).await.unwrap();

        assert_eq!(readings.len(), 10);
    }

    #[tokio::test]
    async fn test_truncates_oversized_response() {
        let mut repo = stored(80);
        repo.ignore_limit = true;
        let service = HistoryService::new(Arc::new(repo));

        let readings = service.history(50, HistoryOrder::Newest).await.unwrap();
        assert_eq!(readings.len(), 50);
        assert_eq!(readings[49].value("temperature"), Some(30.0));
    }

    #[tokio::test]
    async fn test_oldest_order_reverses() {
        let service = HistoryService::new(Arc::new(stored(10)));
        let readings = service.history(3, HistoryOrder::Oldest).await.unwrap();

        let values: Vec<f64> = readings.iter().filter_map(|s| s.value("temperature")).collect();
        assert_eq!(values, vec![7.0, 8.0, 9.0]);
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected() {
        let service = HistoryService::new(Arc::new(stored(10)));
        assert_eq!(
            service.history(0, HistoryOrder::Newest).await.unwrap_err(),
            MonitorError::InvalidLimit
        );
    }

    #[tokio::test]
    async fn test_fetch_error_is_surfaced() {
        let mut repo = stored(10);
        repo.failure = Some(FetchError::Transport("connection refused".to_string()));
        let service = HistoryService::new(Arc::new(repo));

        let err = service.history(10, HistoryOrder::Newest).await.unwrap_err();
        assert!(matches!(err, MonitorError::Fetch(FetchError::Transport(_))));
        assert!(service.analytics(10).await.is_err());
    }

    #[tokio::test]
    async fn test_analytics_pairs_readings_with_stats() {
        let service = HistoryService::new(Arc::new(stored(20)));
        let (readings, stats) = service.analytics(5).await.unwrap();

        assert_eq!(readings.len(), 5);
        assert_eq!(readings[0].value("temperature"), Some(15.0));
        assert_eq!(stats.count, 20);
        assert_eq!(stats.channels["temperature"].max, 19.0);
    }
}
