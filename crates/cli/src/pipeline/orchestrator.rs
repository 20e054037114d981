//! Monitor orchestrator - wires transport, core and dashboard refresh.
//!
//! Runs against a real broker when the `mqtt` feature is enabled, or
//! against the built-in generator when simulation is turned on.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{fields, MessageSource, MonitorBlueprint, SensorReading};
use ingestion::{BackpressureConfig, IngestionPipeline, SimulatedSource};
use observability::ThroughputAggregator;
use telemetry_core::{CoreConfig, DashboardSnapshot, MonitorView, TelemetryCore};
use tracing::{debug, info, warn};

use super::MonitorStats;

/// How long the core may take to drain the queue after shutdown
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

const MOTION_COLUMNS: [&str; 4] = [fields::VIBRATION, fields::AX, fields::AY, fields::AZ];
const SOUND_COLUMNS: [&str; 2] = [fields::CATEGORIE, fields::DECIBELS];
const LIGHT_COLUMNS: [&str; 1] = [fields::LUX];

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Loaded and validated configuration
    pub blueprint: MonitorBlueprint,

    /// Dashboard refresh interval
    pub refresh_interval: Duration,

    /// Stop after this long (None = until shutdown)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main monitor orchestrator
pub struct Monitor {
    config: MonitorConfig,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    /// Run until `shutdown` resolves or the timeout elapses
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<MonitorStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Transport
        let mut ingestion =
            IngestionPipeline::with_config(BackpressureConfig::from_broker(&blueprint.broker));
        let source = build_source(blueprint)?;
        info!(source = %source.name(), "Message source configured");
        ingestion.register_source(source, None);

        // Core
        let core =
            TelemetryCore::for_pipeline(CoreConfig::from_blueprint(blueprint), &mut ingestion);
        let view = core.view();
        let ingestion_rx = ingestion
            .take_receiver()
            .context("Failed to get ingestion receiver")?;
        let core_handle = tokio::spawn(core.run(ingestion_rx));

        ingestion.start_all();
        info!(
            topics = ?blueprint.broker.topics,
            alarm_threshold = blueprint.classifier.alarm_threshold,
            "Monitor running"
        );

        // Dashboard refresh loop
        let mut throughput = ThroughputAggregator::new();
        let mut ticker = tokio::time::interval(self.config.refresh_interval);
        let mut last_tick = Instant::now();

        let timeout = self.config.timeout;
        let deadline = async move {
            match timeout {
                Some(t) => tokio::time::sleep(t).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = view.dashboard();
                    throughput.update(
                        snapshot.stats.messages_received,
                        snapshot.stats.readings_stored,
                        last_tick.elapsed().as_secs_f64(),
                    );
                    last_tick = Instant::now();
                    render_dashboard(&view, &snapshot);
                }
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping monitor...");
                    break;
                }
                _ = &mut deadline => {
                    info!(timeout_secs = timeout.map(|t| t.as_secs()), "Monitor timeout reached");
                    break;
                }
            }
        }

        // Shutdown: stop sources, close the queue, let the core drain
        info!("Shutting down monitor...");
        ingestion.shutdown();

        let core_stats = match tokio::time::timeout(DRAIN_TIMEOUT, core_handle).await {
            Ok(Ok(stats)) => stats,
            Ok(Err(e)) => {
                warn!(error = %e, "Telemetry core task failed");
                view.stats()
            }
            Err(_) => {
                warn!("Telemetry core did not drain in time");
                view.stats()
            }
        };

        let stats = MonitorStats {
            duration: start_time.elapsed(),
            core: core_stats,
            ingestion: ingestion.metrics().snapshot(),
            sensors: view.sensor_ids().len(),
            final_status: view.status(),
            throughput: throughput.summary(),
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            rate = format!("{:.2}", stats.readings_per_sec()),
            "Monitor shutdown complete"
        );

        Ok(stats)
    }
}

/// Pick the message source for this run
fn build_source(blueprint: &MonitorBlueprint) -> Result<Box<dyn MessageSource>> {
    if blueprint.simulation.enabled {
        info!(
            sensor_id = %blueprint.simulation.sensor_id,
            interval_ms = blueprint.simulation.interval_ms,
            "Running in SIMULATION mode (no broker required)"
        );
        return Ok(Box::new(SimulatedSource::new(blueprint.simulation.clone())));
    }

    #[cfg(feature = "mqtt")]
    return mqtt_source(blueprint);

    #[cfg(not(feature = "mqtt"))]
    anyhow::bail!("Built without MQTT support; rerun with --simulate");
}

#[cfg(feature = "mqtt")]
fn mqtt_source(blueprint: &MonitorBlueprint) -> Result<Box<dyn MessageSource>> {
    info!(uri = %blueprint.broker.uri, client_id = %blueprint.broker.client_id, "Connecting to broker");
    let source = ingestion::MqttSource::new(blueprint.broker.clone())
        .with_context(|| format!("Invalid broker configuration '{}'", blueprint.broker.uri))?;
    Ok(Box::new(source))
}

/// Log one dashboard refresh
fn render_dashboard(view: &MonitorView, snapshot: &DashboardSnapshot) {
    observability::record_transport_state(snapshot.transport.as_u8());

    info!(
        status = snapshot.status.label(),
        transport = ?snapshot.transport,
        sensors = snapshot.sensors.len(),
        received = snapshot.stats.messages_received,
        stored = snapshot.stats.readings_stored,
        rejected = snapshot.stats.rejected(),
        dropped = snapshot.stats.channel_dropped,
        "Dashboard refresh"
    );

    for sensor in &snapshot.sensors {
        let page_size = view.page_size().max(1);
        let last_page = sensor.buffer.len.saturating_sub(1) / page_size;
        let page = view.page_default(&sensor.sensor_id, last_page);

        info!(
            sensor_id = %sensor.sensor_id,
            readings = sensor.buffer.len,
            page = format!("{}/{}", page.page_index + 1, page.total_pages),
            out_of_order = sensor.buffer.out_of_order,
            evicted = sensor.buffer.evicted,
            "Sensor series"
        );

        for reading in &page.items {
            debug!(sensor_id = %sensor.sensor_id, "{}", format_row(reading));
        }
    }

    for entry in snapshot.log_tail.iter().rev().take(3) {
        debug!(
            received_at = %entry.received_at.format("%H:%M:%S%.3f"),
            topic = %entry.topic,
            payload = %entry.raw_payload,
            "Raw message"
        );
    }
}

/// Table row for one reading; absent columns show the missing sentinel
fn format_row(reading: &SensorReading) -> String {
    let cells: Vec<String> = columns_for(reading)
        .iter()
        .map(|name| format!("{name}={}", reading.display(name)))
        .collect();

    format!(
        "{} | {}",
        reading.timestamp.format("%Y-%m-%d %H:%M:%S"),
        cells.join(" ")
    )
}

/// Table layout by sensor kind, inferred from the fields present
fn columns_for(reading: &SensorReading) -> Vec<&str> {
    let has_any = |names: &[&str]| names.iter().any(|n| reading.field(n).is_some());

    if has_any(&MOTION_COLUMNS) {
        MOTION_COLUMNS.to_vec()
    } else if has_any(&SOUND_COLUMNS) {
        SOUND_COLUMNS.to_vec()
    } else if has_any(&LIGHT_COLUMNS) {
        LIGHT_COLUMNS.to_vec()
    } else {
        reading.fields.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use contracts::FieldValue;

    fn at_noon() -> SensorReading {
        SensorReading::new("gyro".into(), Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_motion_row_marks_missing_axes() {
        let reading = at_noon().with_number(fields::VIBRATION, 812.0).with_number(fields::AX, 0.5);
        assert_eq!(
            format_row(&reading),
            "2024-05-01 12:00:00 | vibration=812.00 ax=0.50 ay=— az=—"
        );
    }

    #[test]
    fn test_columns_by_sensor_kind() {
        let sound = at_noon().with_field(fields::CATEGORIE, FieldValue::Text("loud".into()));
        assert_eq!(columns_for(&sound), vec![fields::CATEGORIE, fields::DECIBELS]);

        let light = at_noon().with_number(fields::LUX, 300.0);
        assert_eq!(columns_for(&light), vec![fields::LUX]);

        let other = at_noon().with_number("humidity", 40.0);
        assert_eq!(columns_for(&other), vec!["humidity"]);
    }

    #[tokio::test]
    async fn test_simulated_run_until_timeout() {
        let mut blueprint = MonitorBlueprint::default();
        blueprint.simulation.enabled = true;
        blueprint.simulation.interval_ms = 10;

        let monitor = Monitor::new(MonitorConfig {
            blueprint,
            refresh_interval: Duration::from_millis(50),
            timeout: Some(Duration::from_millis(300)),
            metrics_port: None,
        });

        let stats = monitor.run(std::future::pending()).await.unwrap();
        assert!(stats.core.readings_stored > 0);
        assert_eq!(stats.core.rejected(), 0);
        assert_eq!(stats.sensors, 1);
        assert!(stats.throughput.ticks > 0);
    }
}
