// Aggregate statistics as reported by the sensor API
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// Per-channel min/max/avg over the requested window, consumed verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSummary {
    pub count: u64,
    pub channels: BTreeMap<String, ChannelStats>,
}
