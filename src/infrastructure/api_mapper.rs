// Mapper from sensor API JSON payloads to domain types
use crate::domain::sample::Sample;
use crate::domain::stats::{ChannelStats, StatsSummary};
use crate::error::FetchError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One reading as sent by `/latest` or inside `/readings`.
///
/// Channel values are picked out of the remaining fields by name.
#[derive(Debug, Deserialize)]
pub struct ReadingPayload {
    /// Either an ISO-8601 string or the device's uptime in milliseconds
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
    /// Wall-clock time stamped by the serial bridge
    #[serde(default)]
    pub server_time: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub is_valid: Option<bool>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ReadingsPayload {
    #[serde(default)]
    pub readings: Vec<ReadingPayload>,
}

#[derive(Debug, Deserialize)]
pub struct StatsPayload {
    #[serde(default)]
    pub count: u64,
    #[serde(flatten)]
    pub channels: BTreeMap<String, serde_json::Value>,
}

/// Maps payloads onto a fixed set of declared channels.
#[derive(Debug, Clone)]
pub struct PayloadMapper {
    aliases: HashMap<String, String>,
    channels: BTreeSet<String>,
}

impl PayloadMapper {
    pub fn new<I, S>(aliases: HashMap<String, String>, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            aliases,
            channels: channels.into_iter().map(Into::into).collect(),
        }
    }

    fn channel_name(&self, field: &str) -> String {
        self.aliases
            .get(field)
            .cloned()
            .unwrap_or_else(|| field.to_string())
    }

    /// Map a live reading. Every declared channel must be present.
    pub fn sample(&self, payload: ReadingPayload, received_at: DateTime<Utc>) -> Result<Sample, FetchError> {
        self.map_reading(payload, received_at, true)
    }

    /// Map stored readings. Rows may lack some channels.
    pub fn samples(&self, payload: ReadingsPayload, received_at: DateTime<Utc>) -> Result<Vec<Sample>, FetchError> {
        payload
            .readings
            .into_iter()
            .map(|reading| self.map_reading(reading, received_at, false))
            .collect()
    }

    fn map_reading(
        &self,
        payload: ReadingPayload,
        received_at: DateTime<Utc>,
        require_all: bool,
    ) -> Result<Sample, FetchError> {
        let timestamp = resolve_timestamp(payload.server_time.as_deref(), payload.timestamp.as_ref(), received_at)?;

        let mut channels = BTreeMap::new();
        for (field, value) in payload.fields {
            let name = self.channel_name(&field);
            if !self.channels.contains(&name) {
                tracing::trace!("Ignoring undeclared field {}", field);
                continue;
            }
            let Some(number) = value.as_f64() else {
                tracing::trace!("Ignoring non-numeric value for {}", field);
                continue;
            };
            if channels.insert(name.clone(), number).is_some() {
                return Err(FetchError::Malformed(format!(
                    "field {:?} maps onto channel {:?} twice",
                    field, name
                )));
            }
        }

        if require_all && channels.len() < self.channels.len() {
            let missing: Vec<&str> = self
                .channels
                .iter()
                .filter(|name| !channels.contains_key(*name))
                .map(String::as_str)
                .collect();
            return Err(FetchError::Malformed(format!(
                "reading lacks channels: {}",
                missing.join(", ")
            )));
        }

        let mut sample = Sample::new(timestamp, channels);
        if let Some(label) = payload.recommendation {
            sample = sample.with_recommendation(label, payload.reason.unwrap_or_default());
        }
        if let Some(is_valid) = payload.is_valid {
            sample = sample.with_validity(is_valid);
        }
        Ok(sample)
    }

    pub fn stats(&self, payload: StatsPayload) -> Result<StatsSummary, FetchError> {
        let mut channels = BTreeMap::new();
        for (field, value) in payload.channels {
            // no rows yet: the API reports null aggregates
            if value.is_null() {
                continue;
            }
            let name = self.channel_name(&field);
            if !self.channels.contains(&name) {
                tracing::trace!("Ignoring stats for undeclared field {}", field);
                continue;
            }
            let stats: ChannelStats = serde_json::from_value(value).map_err(|e| {
                FetchError::Malformed(format!("stats for {:?}: {}", field, e))
            })?;
            channels.insert(name, stats);
        }

        Ok(StatsSummary {
            count: payload.count,
            channels,
        })
    }
}

/// Bridge time wins; a numeric device timestamp is uptime, not wall-clock,
/// so the receipt time stands in for it.
fn resolve_timestamp(
    server_time: Option<&str>,
    timestamp: Option<&serde_json::Value>,
    received_at: DateTime<Utc>,
) -> Result<DateTime<Utc>, FetchError> {
    if let Some(raw) = server_time {
        return parse_timestamp(raw);
    }
    match timestamp {
        Some(serde_json::Value::String(raw)) => parse_timestamp(raw),
        _ => Ok(received_at),
    }
}

/// Accepts RFC 3339 or a naive ISO-8601 timestamp, which is read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, FetchError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| FetchError::Malformed(format!("timestamp {:?}: {}", raw, e)))
}
