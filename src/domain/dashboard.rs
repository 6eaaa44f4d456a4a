// Page-level view models served to the dashboard
use super::connectivity::Freshness;
use super::sample::Recommendation;
use super::telemetry::{ChartData, TileData};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Current readings, advice and the rolling trend for the live page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveDashboard {
    pub title: String,
    /// Bumps on every poll cycle and reset
    pub poll_cycle: u64,
    pub freshness: Freshness,
    pub tiles: Vec<TileData>,
    pub recommendation: Option<Recommendation>,
    pub last_update: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub charts: Vec<ChartData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnHeader {
    pub id: String,
    pub title: String,
    pub unit: String,
    pub precision: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub timestamp: DateTime<Utc>,
    /// One cell per column; `None` when the reading lacks that channel.
    pub cells: Vec<Option<f64>>,
    pub is_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryTable {
    pub columns: Vec<ColumnHeader>,
    pub rows: Vec<HistoryRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    pub id: String,
    pub title: String,
    pub unit: String,
    pub precision: u32,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsPage {
    pub title: String,
    pub count: u64,
    pub stats: Vec<StatCard>,
    pub charts: Vec<ChartData>,
}
