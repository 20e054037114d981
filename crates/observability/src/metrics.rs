//! Monitor metrics
//!
//! Thin helpers over the `metrics` facade. Without an installed recorder
//! every call is a no-op, so the core can record unconditionally.

use std::fmt;

use metrics::{counter, gauge};

/// A reading was appended to a sensor's series
pub fn record_reading_stored(sensor_id: &str, depth: usize) {
    counter!(
        "mine_monitor_readings_stored_total",
        "sensor_id" => sensor_id.to_string()
    )
    .increment(1);

    gauge!(
        "mine_monitor_series_depth",
        "sensor_id" => sensor_id.to_string()
    )
    .set(depth as f64);
}

/// A payload failed parsing; `kind` is the parse error label
pub fn record_parse_rejected(kind: &'static str) {
    counter!("mine_monitor_payloads_rejected_total", "kind" => kind).increment(1);
}

/// The process-wide device status changed
pub fn record_device_status(alarm: bool) {
    gauge!("mine_monitor_device_alarm").set(if alarm { 1.0 } else { 0.0 });
    counter!("mine_monitor_status_transitions_total").increment(1);
}

/// Transport state as its numeric code
pub fn record_transport_state(code: u8) {
    gauge!("mine_monitor_transport_state").set(f64::from(code));
}

/// Per-tick throughput aggregator
///
/// Fed with cumulative counters at every refresh tick; keeps running
/// statistics of the per-second rates between ticks.
#[derive(Debug, Clone, Default)]
pub struct ThroughputAggregator {
    last_received: u64,
    last_stored: u64,
    ticks: u64,
    received_rate: RunningStats,
    stored_rate: RunningStats,
}

impl ThroughputAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one tick; `elapsed_secs` is the time since the previous tick
    pub fn update(&mut self, received_total: u64, stored_total: u64, elapsed_secs: f64) {
        if elapsed_secs > 0.0 {
            let received = received_total.saturating_sub(self.last_received);
            let stored = stored_total.saturating_sub(self.last_stored);
            self.received_rate.push(received as f64 / elapsed_secs);
            self.stored_rate.push(stored as f64 / elapsed_secs);
        }
        self.last_received = received_total;
        self.last_stored = stored_total;
        self.ticks += 1;
    }

    pub fn summary(&self) -> ThroughputSummary {
        ThroughputSummary {
            ticks: self.ticks,
            received_per_sec: StatsSummary::from(&self.received_rate),
            stored_per_sec: StatsSummary::from(&self.stored_rate),
        }
    }
}

/// Throughput summary
#[derive(Debug, Clone, Default)]
pub struct ThroughputSummary {
    pub ticks: u64,
    pub received_per_sec: StatsSummary,
    pub stored_per_sec: StatsSummary,
}

impl fmt::Display for ThroughputSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Refresh ticks: {}", self.ticks)?;
        writeln!(f, "Received/s: {}", self.received_per_sec)?;
        write!(f, "Stored/s: {}", self.stored_per_sec)
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.2}, max={:.2}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
