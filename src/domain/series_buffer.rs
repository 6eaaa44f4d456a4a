// Fixed-capacity multi-channel rolling window
use super::sample::Sample;
use crate::error::MonitorError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// One appended sample, values indexed like `RollingSeriesBuffer::channels`.
#[derive(Debug, Clone)]
struct Row {
    timestamp: DateTime<Utc>,
    values: Box<[f64]>,
}

/// Holds the most recent `capacity` samples for a fixed channel set.
///
/// Every channel is stored in the same row, so appending and evicting
/// always move all channels together and their lengths cannot diverge.
#[derive(Debug, Clone)]
pub struct RollingSeriesBuffer {
    capacity: usize,
    channels: Vec<String>,
    rows: VecDeque<Row>,
}

/// Owned copy of a buffer's contents, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSnapshot {
    pub capacity: usize,
    pub timestamps: Vec<DateTime<Utc>>,
    pub channels: BTreeMap<String, Vec<f64>>,
}

impl SeriesSnapshot {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.channels.get(name).map(Vec::as_slice)
    }
}

impl RollingSeriesBuffer {
    pub fn new<I, S>(channels: I, capacity: usize) -> Result<Self, MonitorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if capacity == 0 {
            return Err(MonitorError::InvalidCapacity);
        }

        let mut channels: Vec<String> = channels.into_iter().map(Into::into).collect();
        channels.sort();
        channels.dedup();
        if channels.is_empty() {
            return Err(MonitorError::EmptyChannelSet);
        }

        Ok(Self {
            capacity,
            channels,
            rows: VecDeque::with_capacity(capacity),
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append one sample, evicting the oldest rows past capacity.
    ///
    /// The sample must carry exactly the declared channels. On mismatch
    /// the buffer is left as it was.
    pub fn append(&mut self, sample: &Sample) -> Result<(), MonitorError> {
        let values = self.project(sample)?;

        self.rows.push_back(Row {
            timestamp: sample.timestamp,
            values,
        });
        while self.rows.len() > self.capacity {
            self.rows.pop_front();
        }

        Ok(())
    }

    pub fn snapshot(&self) -> SeriesSnapshot {
        let timestamps = self.rows.iter().map(|row| row.timestamp).collect();
        let channels = self
            .channels
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values = self.rows.iter().map(|row| row.values[idx]).collect();
                (name.clone(), values)
            })
            .collect();

        SeriesSnapshot {
            capacity: self.capacity,
            timestamps,
            channels,
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    fn project(&self, sample: &Sample) -> Result<Box<[f64]>, MonitorError> {
        let missing: Vec<String> = self
            .channels
            .iter()
            .filter(|name| !sample.channels.contains_key(*name))
            .cloned()
            .collect();
        let unexpected: Vec<String> = sample
            .channels
            .keys()
            .filter(|name| self.channels.binary_search(*name).is_err())
            .cloned()
            .collect();

        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(MonitorError::SchemaMismatch {
                missing,
                unexpected,
            });
        }

        // channels is sorted and the sample map is a BTreeMap with the same keys
        Ok(sample.channels.values().copied().collect())
    }
}
