// Connectivity and staleness tracking for the live view
use super::sample::Sample;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Whether the live view has data, and whether it is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Nothing has arrived since the loop started.
    Waiting,
    Live,
    /// Data arrived once but the last success is older than expected.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub kind: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectivityState {
    pub latest: Option<Sample>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<FailureRecord>,
    pub consecutive_failures: u32,
}

impl ConnectivityState {
    pub fn record_success(&mut self, sample: Sample, at: DateTime<Utc>) {
        self.latest = Some(sample);
        self.last_success_at = Some(at);
        self.last_error = None;
        self.consecutive_failures = 0;
    }

    /// Keeps the previous sample so the view degrades instead of blanking.
    pub fn record_failure(&mut self, kind: &str, message: String, at: DateTime<Utc>) {
        self.last_error = Some(FailureRecord {
            kind: kind.to_string(),
            message,
            at,
        });
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    pub fn freshness(&self, now: DateTime<Utc>, stale_after: Duration) -> Freshness {
        let Some(last_success) = self.last_success_at else {
            return Freshness::Waiting;
        };

        let age = now.signed_duration_since(last_success);
        match age.to_std() {
            Ok(age) if age > stale_after => Freshness::Stale,
            _ => Freshness::Live,
        }
    }
}
