//! Read-only facade for the presentation layer.
//!
//! Every query returns an owned copy taken under the store's read lock;
//! nothing reachable from a [`MonitorView`] can mutate monitor state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use contracts::{DeviceStatus, LogEntry, PageResult, SensorId, SensorReading, TransportState};
use serde::Serialize;

use crate::buffer::BufferStats;
use crate::engine::{CoreStatsSnapshot, Shared};

/// One plotted point of a chart series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Per-sensor line of a dashboard snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSummary {
    pub sensor_id: SensorId,
    pub buffer: BufferStats,
    pub latest: Option<SensorReading>,
}

/// Everything a dashboard refresh needs, taken in one pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub status: DeviceStatus,
    pub transport: TransportState,
    pub sensors: Vec<SensorSummary>,
    pub log_tail: Vec<LogEntry>,
    pub stats: CoreStatsSnapshot,
}

/// Cloneable read handle over the telemetry core
#[derive(Debug, Clone)]
pub struct MonitorView {
    shared: Arc<Shared>,
}

impl MonitorView {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Current device status
    pub fn status(&self) -> DeviceStatus {
        self.shared.status.get()
    }

    /// Status lamp text: `"Active"` or `"Exploded"`
    pub fn status_label(&self) -> &'static str {
        self.status().label()
    }

    /// Zero-based page of a sensor's series
    pub fn page(&self, sensor_id: &str, page_index: usize, page_size: usize) -> PageResult {
        self.shared.store.page(sensor_id, page_index, page_size)
    }

    /// Page using the configured table size
    pub fn page_default(&self, sensor_id: &str, page_index: usize) -> PageResult {
        self.page(sensor_id, page_index, self.shared.config.page_size)
    }

    /// Full series, oldest first
    pub fn series(&self, sensor_id: &str) -> Vec<SensorReading> {
        self.shared.store.snapshot(sensor_id)
    }

    /// Downsampled numeric series for plotting
    ///
    /// Keeps every n-th buffered reading (n = chart reduction factor),
    /// then skips those without a numeric `field`. No interpolation.
    pub fn chart_series(&self, sensor_id: &str, field: &str) -> Vec<ChartPoint> {
        let step = self.shared.config.chart_reduction_factor.max(1);
        self.shared.store.with_series(sensor_id, |readings| {
            readings
                .iter()
                .step_by(step)
                .filter_map(|r| {
                    r.number(field).value().map(|value| ChartPoint {
                        timestamp: r.timestamp,
                        value,
                    })
                })
                .collect()
        })
    }

    /// Diagnostic log, oldest first
    pub fn log_tail(&self) -> Vec<LogEntry> {
        self.shared.log.snapshot()
    }

    /// Known sensors, sorted
    pub fn sensor_ids(&self) -> Vec<SensorId> {
        self.shared.store.sensor_ids()
    }

    pub fn transport_state(&self) -> TransportState {
        self.shared.transport.get()
    }

    pub fn stats(&self) -> CoreStatsSnapshot {
        self.shared
            .stats
            .snapshot(self.shared.ingestion.as_deref())
    }

    pub fn buffer_stats(&self, sensor_id: &str) -> Option<BufferStats> {
        self.shared.store.buffer_stats(sensor_id)
    }

    pub fn page_size(&self) -> usize {
        self.shared.config.page_size
    }

    /// Status, per-sensor summaries, log and counters in one value
    pub fn dashboard(&self) -> DashboardSnapshot {
        let sensors = self
            .sensor_ids()
            .into_iter()
            .map(|sensor_id| {
                let (buffer, latest) = self
                    .shared
                    .store
                    .with_buffer(&sensor_id, |buffer| (buffer.stats(), buffer.latest().cloned()))
                    .unwrap_or_default();
                SensorSummary {
                    sensor_id,
                    buffer,
                    latest,
                }
            })
            .collect();

        DashboardSnapshot {
            status: self.status(),
            transport: self.transport_state(),
            sensors,
            log_tail: self.log_tail(),
            stats: self.stats(),
        }
    }
}
