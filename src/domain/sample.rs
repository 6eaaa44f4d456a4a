// Sensor sample domain model
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Open/close advice computed upstream, carried verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub label: String,
    pub reason: String,
}

/// One timestamped multi-channel observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub channels: BTreeMap<String, f64>,
    pub recommendation: Option<Recommendation>,
    pub is_valid: Option<bool>,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, channels: BTreeMap<String, f64>) -> Self {
        Self {
            timestamp,
            channels,
            recommendation: None,
            is_valid: None,
        }
    }

    pub fn with_recommendation(mut self, label: impl Into<String>, reason: impl Into<String>) -> Self {
        self.recommendation = Some(Recommendation {
            label: label.into(),
            reason: reason.into(),
        });
        self
    }

    pub fn with_validity(mut self, is_valid: bool) -> Self {
        self.is_valid = Some(is_valid);
        self
    }

    pub fn value(&self, channel: &str) -> Option<f64> {
        self.channels.get(channel).copied()
    }
}

#[cfg(test)]
pub(crate) fn sample_at(secs: i64, values: &[(&str, f64)]) -> Sample {
    let timestamp = DateTime::from_timestamp(secs, 0).unwrap();
    let channels = values
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect();
    Sample::new(timestamp, channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_keep_metadata() {
        let sample = sample_at(10, &[("temperature", 71.5)])
            .with_recommendation("OPEN", "Cool outside air")
            .with_validity(false);

        assert_eq!(sample.value("temperature"), Some(71.5));
        assert_eq!(sample.value("humidity"), None);
        assert_eq!(sample.recommendation.unwrap().label, "OPEN");
        assert_eq!(sample.is_valid, Some(false));
    }
}
