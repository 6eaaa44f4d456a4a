// HTTP client for the sensor API
use crate::application::sensor_api::{ReadingsRepository, SampleSource};
use crate::domain::sample::Sample;
use crate::domain::stats::StatsSummary;
use crate::error::FetchError;
use crate::infrastructure::api_mapper::{PayloadMapper, ReadingPayload, ReadingsPayload, StatsPayload};
use crate::infrastructure::config::ApiSettings;
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpSensorApi {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
    mapper: PayloadMapper,
}

impl HttpSensorApi {
    /// `channels` are the channel ids every live reading must carry.
    pub fn new(settings: &ApiSettings, channels: Vec<String>) -> Result<Self, FetchError> {
        let timeout = Duration::from_millis(settings.request_timeout_ms);
        // The sensor hub sits on the local network
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout,
            client,
            mapper: PayloadMapper::new(settings.aliases.clone(), channels),
        })
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, limit: Option<usize>) -> Result<T, FetchError> {
        let url = self.endpoint_url(path);
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/json");
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Transport(format!("GET {}: {}", url, e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Malformed(format!("GET {}: {}", url, e))
            }
        })
    }
}

#[async_trait]
impl SampleSource for HttpSensorApi {
    async fn fetch_latest(&self) -> Result<Sample, FetchError> {
        let payload: ReadingPayload = self.get_json("latest", None).await?;
        self.mapper.sample(payload, Utc::now())
    }
}

#[async_trait]
impl ReadingsRepository for HttpSensorApi {
    async fn recent_readings(&self, limit: usize) -> Result<Vec<Sample>, FetchError> {
        let payload: ReadingsPayload = self.get_json("readings", Some(limit)).await?;
        tracing::debug!("Fetched {} readings (limit {})", payload.readings.len(), limit);
        self.mapper.samples(payload, Utc::now())
    }

    async fn stats(&self, limit: usize) -> Result<StatsSummary, FetchError> {
        let payload: StatsPayload = self.get_json("stats", Some(limit)).await?;
        self.mapper.stats(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::net::SocketAddr;

    #[derive(Deserialize)]
    struct LimitQuery {
        limit: usize,
    }

    async fn latest() -> Json<Value> {
        Json(json!({
            "temp": 70.5,
            "humidity": 44.0,
            "air_quality": 280,
            "timestamp": 98765,
            "recommendation": "CLOSE",
            "reason": "Humidity rising"
        }))
    }

    async fn readings(Query(query): Query<LimitQuery>) -> Json<Value> {
        let stored = 10;
        let rows: Vec<Value> = (0..stored.min(query.limit))
            .map(|i| {
                json!({
                    "timestamp": format!("2024-05-01T12:00:{:02}", 59 - i),
                    "temperature": 70.0 + i as f64,
                    "humidity": 40.0,
                    "air_quality": 300,
                    "is_valid": true
                })
            })
            .collect();
        Json(json!({ "readings": rows }))
    }

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn api_for(addr: SocketAddr) -> HttpSensorApi {
        let channels = ["temperature", "humidity", "air_quality"].map(String::from).to_vec();
        HttpSensorApi::new(
            &ApiSettings {
                base_url: format!("http://{}/api/", addr),
                request_timeout_ms: 1000,
                aliases: HashMap::from([("temp".to_string(), "temperature".to_string())]),
            },
            channels,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_latest() {
        let addr = serve(Router::new().route("/api/latest", get(latest))).await;
        let sample = api_for(addr).fetch_latest().await.unwrap();

        assert_eq!(sample.value("temperature"), Some(70.5));
        assert_eq!(sample.recommendation.unwrap().label, "CLOSE");
    }

    #[tokio::test]
    async fn test_recent_readings_passes_limit() {
        let addr = serve(Router::new().route("/api/readings", get(readings))).await;
        let api = api_for(addr);

        assert_eq!(api.recent_readings(3).await.unwrap().len(), 3);
        assert_eq!(api.recent_readings(500).await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let router = Router::new().route(
            "/api/stats",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "sensor offline") }),
        );
        let addr = serve(router).await;

        let err = api_for(addr).stats(100).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Status {
                status: 503,
                body: "sensor offline".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let router = Router::new().route("/api/latest", get(|| async { "<html>oops</html>" }));
        let addr = serve(router).await;

        let err = api_for(addr).fetch_latest().await.unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = api_for(addr).fetch_latest().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
