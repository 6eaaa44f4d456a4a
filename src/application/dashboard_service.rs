// Dashboard service - Builds chart/tile/table view models from live and historical data
use crate::application::poll_loop::LiveView;
use crate::domain::dashboard::{
    AnalyticsPage, ColumnHeader, HistoryRow, HistoryTable, LiveDashboard, StatCard,
};
use crate::domain::sample::Sample;
use crate::domain::stats::StatsSummary;
use crate::domain::telemetry::{ChartData, SeriesData, TileData, TimeSeriesPoint};
use crate::infrastructure::config::{ChannelConfig, WidgetsConfig};
use chrono::{DateTime, Utc};
use std::time::Duration;

#[derive(Clone)]
pub struct DashboardService {
    widgets_config: WidgetsConfig,
    stale_after: Duration,
}

impl DashboardService {
    pub fn new(widgets_config: WidgetsConfig, stale_after: Duration) -> Self {
        Self {
            widgets_config,
            stale_after,
        }
    }

    pub fn live_dashboard(&self, view: &LiveView, now: DateTime<Utc>) -> LiveDashboard {
        let connectivity = &view.connectivity;

        // No sample yet means no tiles, never zero-filled ones
        let tiles = connectivity
            .latest
            .as_ref()
            .map(|sample| self.tiles(sample))
            .unwrap_or_default();

        let charts = self
            .widgets_config
            .channels
            .iter()
            .filter_map(|channel| {
                let values = view.snapshot.channel(&channel.id)?;
                let points = view
                    .snapshot
                    .timestamps
                    .iter()
                    .zip(values)
                    .map(|(ts, value)| TimeSeriesPoint::new(ts.timestamp_millis(), *value))
                    .collect();
                Some(self.chart(channel, points))
            })
            .collect();

        LiveDashboard {
            title: self.widgets_config.title.clone(),
            poll_cycle: view.cycle,
            freshness: connectivity.freshness(now, self.stale_after),
            tiles,
            recommendation: connectivity
                .latest
                .as_ref()
                .and_then(|sample| sample.recommendation.clone()),
            last_update: connectivity.last_success_at,
            error: connectivity
                .last_error
                .as_ref()
                .map(|failure| failure.message.clone()),
            charts,
        }
    }

    /// Table rows in the order given, one column per configured channel.
    pub fn history_table(&self, readings: &[Sample]) -> HistoryTable {
        let columns = self
            .widgets_config
            .channels
            .iter()
            .map(|c| ColumnHeader {
                id: c.id.clone(),
                title: c.title.clone(),
                unit: c.unit.clone(),
                precision: c.precision,
            })
            .collect();

        let rows = readings
            .iter()
            .map(|reading| HistoryRow {
                timestamp: reading.timestamp,
                cells: self
                    .widgets_config
                    .channels
                    .iter()
                    .map(|c| reading.value(&c.id))
                    .collect(),
                is_valid: reading.is_valid.unwrap_or(true),
            })
            .collect();

        HistoryTable { columns, rows }
    }

    /// `readings` must already be oldest first.
    pub fn analytics(&self, readings: &[Sample], stats: &StatsSummary) -> AnalyticsPage {
        let stat_cards = self
            .widgets_config
            .channels
            .iter()
            .filter_map(|c| {
                let s = stats.channels.get(&c.id)?;
                Some(StatCard {
                    id: c.id.clone(),
                    title: c.title.clone(),
                    unit: c.unit.clone(),
                    precision: c.precision,
                    min: s.min,
                    max: s.max,
                    avg: s.avg,
                })
            })
            .collect();

        let charts = self
            .widgets_config
            .channels
            .iter()
            .map(|channel| {
                let points = readings
                    .iter()
                    .filter_map(|r| {
                        r.value(&channel.id)
                            .map(|v| TimeSeriesPoint::new(r.timestamp.timestamp_millis(), v))
                    })
                    .collect();
                self.chart(channel, points)
            })
            .filter(|chart| chart.point_count() > 0)
            .collect();

        AnalyticsPage {
            title: format!("{} Analytics", self.widgets_config.title),
            count: stats.count,
            stats: stat_cards,
            charts,
        }
    }

    fn tiles(&self, sample: &Sample) -> Vec<TileData> {
        self.widgets_config
            .channels
            .iter()
            .filter_map(|c| {
                let value = sample.value(&c.id)?;
                Some(TileData::new(
                    c.id.clone(),
                    c.title.clone(),
                    c.unit.clone(),
                    value,
                    c.precision,
                ))
            })
            .collect()
    }

    fn chart(&self, channel: &ChannelConfig, points: Vec<TimeSeriesPoint>) -> ChartData {
        let series = SeriesData::new(
            channel.id.clone(),
            channel.title.clone(),
            channel.color.clone(),
            points,
        );

        let unit = if channel.unit.is_empty() {
            None
        } else {
            Some(channel.unit.clone())
        };

        ChartData::new(
            channel.id.clone(),
            format!("{} Trend", channel.title),
            unit,
            channel.y_min,
            channel.y_max,
            Some(channel.precision),
            vec![series],
        )
    }
}
