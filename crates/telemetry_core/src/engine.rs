//! Telemetry core: the single writer of all monitor state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_channel::Receiver;
use contracts::{DeviceStatus, MonitorBlueprint, RawMessage, SensorId, TransportStateCell};
use ingestion::{IngestionMetrics, IngestionPipeline};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::buffer::AppendOutcome;
use crate::classifier::{classify, StatusCell};
use crate::log_ring::DiagnosticLog;
use crate::parser::parse;
use crate::store::SensorStore;
use crate::view::MonitorView;
use crate::ParseError;

/// Core configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CoreConfig {
    /// Readings kept per sensor
    pub series_capacity: usize,
    /// Raw messages kept in the diagnostic log
    pub log_capacity: usize,
    /// Axis magnitude above which a reading raises the alarm
    pub alarm_threshold: f64,
    /// Page size of the default table view
    pub page_size: usize,
    /// Keep every n-th reading for chart series
    pub chart_reduction_factor: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::from_blueprint(&MonitorBlueprint::default())
    }
}

impl CoreConfig {
    pub fn from_blueprint(blueprint: &MonitorBlueprint) -> Self {
        Self {
            series_capacity: blueprint.store.series_capacity,
            log_capacity: blueprint.store.log_capacity,
            alarm_threshold: blueprint.classifier.alarm_threshold,
            page_size: blueprint.view.page_size,
            chart_reduction_factor: blueprint.view.chart_reduction_factor,
        }
    }
}

/// Result of ingesting one raw message
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Parsed, classified and appended
    Stored {
        sensor_id: SensorId,
        status: DeviceStatus,
        append: AppendOutcome,
    },
    /// Kept in the diagnostic log only
    Rejected(ParseError),
}

impl IngestOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }
}

/// Running counters of the core
#[derive(Debug, Default)]
pub struct CoreStats {
    messages_received: AtomicU64,
    readings_stored: AtomicU64,
    rejected_malformed: AtomicU64,
    rejected_missing_identity: AtomicU64,
    rejected_invalid_timestamp: AtomicU64,
    status_transitions: AtomicU64,
}

impl CoreStats {
    fn record_rejected(&self, error: &ParseError) {
        let counter = match error {
            ParseError::Malformed { .. } => &self.rejected_malformed,
            ParseError::MissingIdentity { .. } => &self.rejected_missing_identity,
            ParseError::InvalidTimestamp { .. } => &self.rejected_invalid_timestamp,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy; `channel_dropped` comes from the ingestion queue
    pub fn snapshot(&self, ingestion: Option<&IngestionMetrics>) -> CoreStatsSnapshot {
        CoreStatsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            readings_stored: self.readings_stored.load(Ordering::Relaxed),
            rejected_malformed: self.rejected_malformed.load(Ordering::Relaxed),
            rejected_missing_identity: self.rejected_missing_identity.load(Ordering::Relaxed),
            rejected_invalid_timestamp: self.rejected_invalid_timestamp.load(Ordering::Relaxed),
            status_transitions: self.status_transitions.load(Ordering::Relaxed),
            channel_dropped: ingestion.map_or(0, |m| m.snapshot().messages_dropped),
        }
    }
}

/// Counters as seen by readers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoreStatsSnapshot {
    pub messages_received: u64,
    pub readings_stored: u64,
    pub rejected_malformed: u64,
    pub rejected_missing_identity: u64,
    pub rejected_invalid_timestamp: u64,
    pub status_transitions: u64,
    pub channel_dropped: u64,
}

impl CoreStatsSnapshot {
    pub fn rejected(&self) -> u64 {
        self.rejected_malformed + self.rejected_missing_identity + self.rejected_invalid_timestamp
    }
}

/// State shared between the core and its views
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) config: CoreConfig,
    pub(crate) store: SensorStore,
    pub(crate) log: Arc<DiagnosticLog>,
    /// False when a pipeline tap feeds the log ahead of the queue
    pub(crate) log_on_ingest: bool,
    pub(crate) status: StatusCell,
    pub(crate) stats: CoreStats,
    pub(crate) transport: TransportStateCell,
    pub(crate) ingestion: Option<Arc<IngestionMetrics>>,
}

/// Telemetry core
///
/// Owns the write side of the store, the diagnostic log and the status
/// cell. Deliberately not `Clone`: exactly one task ingests, any number of
/// [`MonitorView`]s read.
#[derive(Debug)]
pub struct TelemetryCore {
    shared: Arc<Shared>,
}

impl TelemetryCore {
    /// Create a standalone core; `ingest` records every message in the log
    pub fn new(config: CoreConfig, transport: TransportStateCell) -> Self {
        let log = Arc::new(DiagnosticLog::new(config.log_capacity));
        Self::build(config, log, true, transport, None)
    }

    /// Create a core wired to a pipeline's transport state and queue metrics
    ///
    /// The diagnostic log is attached to the pipeline as a tap, so it sees
    /// every inbound message, including those the queue drops. Call before
    /// [`IngestionPipeline::start_all`].
    pub fn for_pipeline(config: CoreConfig, pipeline: &mut IngestionPipeline) -> Self {
        let log = Arc::new(DiagnosticLog::new(config.log_capacity));
        pipeline.add_tap(log.clone());
        Self::build(
            config,
            log,
            false,
            pipeline.transport_state(),
            Some(pipeline.metrics()),
        )
    }

    fn build(
        config: CoreConfig,
        log: Arc<DiagnosticLog>,
        log_on_ingest: bool,
        transport: TransportStateCell,
        ingestion: Option<Arc<IngestionMetrics>>,
    ) -> Self {
        info!(
            series_capacity = config.series_capacity,
            log_capacity = config.log_capacity,
            alarm_threshold = config.alarm_threshold,
            "Telemetry core created"
        );

        Self {
            shared: Arc::new(Shared {
                store: SensorStore::new(config.series_capacity),
                log,
                log_on_ingest,
                status: StatusCell::new(),
                stats: CoreStats::default(),
                transport,
                ingestion,
                config,
            }),
        }
    }

    /// Read-only handle for the presentation layer
    pub fn view(&self) -> MonitorView {
        MonitorView::new(Arc::clone(&self.shared))
    }

    pub fn config(&self) -> &CoreConfig {
        &self.shared.config
    }

    /// Process one raw message
    ///
    /// Log first (unless a pipeline tap already did), then parse. A
    /// rejected message changes nothing but the log and the counters.
    pub fn ingest(&mut self, message: &RawMessage) -> IngestOutcome {
        let shared = &self.shared;
        shared.stats.messages_received.fetch_add(1, Ordering::Relaxed);
        if shared.log_on_ingest {
            shared.log.record_message(message);
        }

        let reading = match parse(&message.payload) {
            Ok(reading) => reading,
            Err(error) => {
                shared.stats.record_rejected(&error);
                observability::record_parse_rejected(error.kind());
                debug!(
                    topic = %message.topic,
                    kind = error.kind(),
                    error = %error,
                    "Payload rejected"
                );
                return IngestOutcome::Rejected(error);
            }
        };

        let status = classify(&reading, shared.config.alarm_threshold);
        let previous = shared.status.apply(status);
        if previous != status {
            shared.stats.status_transitions.fetch_add(1, Ordering::Relaxed);
            observability::record_device_status(status.is_alarm());
            if status.is_alarm() {
                warn!(
                    sensor_id = %reading.sensor_id,
                    threshold = shared.config.alarm_threshold,
                    "Device status changed to {}",
                    status
                );
            } else {
                info!(sensor_id = %reading.sensor_id, "Device status changed to {}", status);
            }
        }

        let sensor_id = reading.sensor_id.clone();
        let append = shared.store.append(reading);
        shared.stats.readings_stored.fetch_add(1, Ordering::Relaxed);
        observability::record_reading_stored(&sensor_id, append.len);

        if append.out_of_order {
            debug!(sensor_id = %sensor_id, "Out-of-order reading re-sorted");
        }

        IngestOutcome::Stored {
            sensor_id,
            status,
            append,
        }
    }

    /// Consume the queue until every sender is gone
    ///
    /// Messages are processed strictly in arrival order.
    #[instrument(name = "telemetry_core_run", skip_all)]
    pub async fn run(mut self, rx: Receiver<RawMessage>) -> CoreStatsSnapshot {
        info!("Telemetry core consuming");

        while let Ok(message) = rx.recv().await {
            self.ingest(&message);
        }

        let stats = self.view().stats();
        info!(
            received = stats.messages_received,
            stored = stats.readings_stored,
            rejected = stats.rejected(),
            "Ingestion queue closed, telemetry core stopped"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{fields, TransportState};

    fn core() -> TelemetryCore {
        TelemetryCore::new(
            CoreConfig::default(),
            TransportStateCell::new(TransportState::Connected),
        )
    }

    fn motion(sensor: &str, ts: &str, az: f64) -> RawMessage {
        RawMessage::new(
            "sensors/gyro",
            format!(r#"{{"sensorId":"{sensor}","timestamp":"{ts}","ax":0.1,"ay":0.2,"az":{az}}}"#),
        )
    }

    #[test]
    fn test_default_config_matches_blueprint_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.series_capacity, 500);
        assert_eq!(config.log_capacity, 100);
        assert_eq!(config.alarm_threshold, 2.0);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.chart_reduction_factor, 10);
    }

    #[test]
    fn test_ingest_stores_and_classifies() {
        let mut core = core();
        let view = core.view();

        let outcome = core.ingest(&motion("gyro-1", "2024-05-01T10:00:00Z", 2.5));
        match outcome {
            IngestOutcome::Stored {
                sensor_id,
                status,
                append,
            } => {
                assert_eq!(sensor_id, "gyro-1");
                assert_eq!(status, DeviceStatus::Alarm);
                assert_eq!(append.len, 1);
            }
            IngestOutcome::Rejected(e) => panic!("unexpected rejection: {e}"),
        }
        assert_eq!(view.status(), DeviceStatus::Alarm);

        core.ingest(&motion("gyro-2", "2024-05-01T10:00:01Z", 1.0));
        assert_eq!(view.status(), DeviceStatus::Normal);
        assert_eq!(view.stats().status_transitions, 2);
        assert_eq!(view.series("gyro-1")[0].number(fields::AZ).value(), Some(2.5));
    }

    #[test]
    fn test_rejected_message_is_logged_once() {
        let mut core = core();
        let view = core.view();
        core.ingest(&motion("gyro-1", "2024-05-01T10:00:00Z", 0.0));
        let before = view.series("gyro-1");

        let outcome = core.ingest(&RawMessage::new("sensors/gyro", "{not json"));
        assert!(matches!(
            outcome,
            IngestOutcome::Rejected(ParseError::Malformed { .. })
        ));

        assert_eq!(view.log_tail().len(), 2);
        assert_eq!(view.log_tail()[1].raw_payload, "{not json");
        assert_eq!(view.series("gyro-1"), before);
        assert_eq!(view.sensor_ids().len(), 1);

        let stats = view.stats();
        assert_eq!(stats.messages_received, 2);
        assert_eq!(stats.readings_stored, 1);
        assert_eq!(stats.rejected_malformed, 1);
        assert_eq!(stats.rejected(), 1);
    }

    #[test]
    fn test_rejections_are_counted_by_kind() {
        let mut core = core();
        core.ingest(&RawMessage::new("t", r#"{"timestamp":0}"#));
        core.ingest(&RawMessage::new("t", r#"{"sensorId":"a","timestamp":"soon"}"#));
        core.ingest(&RawMessage::new("t", "[]"));

        let stats = core.view().stats();
        assert_eq!(stats.rejected_missing_identity, 1);
        assert_eq!(stats.rejected_invalid_timestamp, 1);
        assert_eq!(stats.rejected_malformed, 1);
        assert_eq!(stats.readings_stored, 0);
        assert_eq!(stats.channel_dropped, 0);
    }

    #[test]
    fn test_pipeline_core_leaves_logging_to_tap() {
        let mut pipeline = IngestionPipeline::new(4);
        let mut core = TelemetryCore::for_pipeline(CoreConfig::default(), &mut pipeline);

        let outcome = core.ingest(&motion("gyro-1", "2024-05-01T10:00:00Z", 0.0));
        assert!(outcome.is_stored());

        let view = core.view();
        assert!(view.log_tail().is_empty());
        assert_eq!(view.stats().messages_received, 1);
    }

    #[tokio::test]
    async fn test_run_drains_queue_in_order() {
        let core = core();
        let view = core.view();
        let (tx, rx) = async_channel::bounded(16);

        for i in 0..5 {
            tx.send(motion("gyro-1", &format!("2024-05-01T10:00:0{i}Z"), 0.0))
                .await
                .unwrap();
        }
        tx.close();

        let stats = core.run(rx).await;
        assert_eq!(stats.readings_stored, 5);
        assert_eq!(view.series("gyro-1").len(), 5);
        assert_eq!(view.log_tail().len(), 5);
    }
}
