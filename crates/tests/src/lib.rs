//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - configuration → core wiring
//! - simulated source → queue → core → view (no broker required)
//! - queue backpressure as seen from the view

#[cfg(test)]
mod contract_tests {
    use contracts::{ConfigVersion, MonitorBlueprint};
    use telemetry_core::CoreConfig;

    #[test]
    fn test_config_flows_into_core() {
        let toml = r#"
            version = "V1"

            [store]
            series_capacity = 42

            [classifier]
            alarm_threshold = 1.5

            [view]
            page_size = 7
        "#;

        let blueprint =
            config_loader::ConfigLoader::load_from_str(toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        assert_eq!(blueprint.version, ConfigVersion::V1);

        let core = CoreConfig::from_blueprint(&blueprint);
        assert_eq!(core.series_capacity, 42);
        assert_eq!(core.alarm_threshold, 1.5);
        assert_eq!(core.page_size, 7);
        assert_eq!(core.log_capacity, MonitorBlueprint::default().store.log_capacity);
    }

    #[test]
    fn test_sample_config_is_valid() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/monitor.toml");
        let blueprint = config_loader::ConfigLoader::load_from_path(&path).unwrap();

        let defaults = MonitorBlueprint::default();
        assert_eq!(blueprint.broker.uri, defaults.broker.uri);
        assert_eq!(blueprint.store.series_capacity, defaults.store.series_capacity);
        assert_eq!(blueprint.simulation.topic, defaults.simulation.topic);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use contracts::{
        DeviceStatus, DropPolicy, MessageCallback, MessageSource, RawMessage, SimulationConfig,
        TransportState, TransportStateCell,
    };
    use ingestion::{BackpressureConfig, IngestionPipeline, SimulatedSource};
    use telemetry_core::{CoreConfig, TelemetryCore};

    /// Replays a fixed list of payloads synchronously on start
    struct ScriptedSource {
        payloads: Vec<&'static str>,
        running: AtomicBool,
    }

    impl ScriptedSource {
        fn new(payloads: Vec<&'static str>) -> Self {
            Self {
                payloads,
                running: AtomicBool::new(false),
            }
        }
    }

    impl MessageSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        fn start(&self, callback: MessageCallback, state: TransportStateCell) {
            self.running.store(true, Ordering::SeqCst);
            state.set(TransportState::Connected);
            for payload in &self.payloads {
                callback(RawMessage::new("sensors/scripted", *payload));
            }
        }

        fn stop(&self) {
            self.running.store(false, Ordering::SeqCst);
        }

        fn is_running(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }
    }

    fn pipeline_with(payloads: Vec<&'static str>, config: BackpressureConfig) -> IngestionPipeline {
        let mut pipeline = IngestionPipeline::with_config(config);
        pipeline.register_source(Box::new(ScriptedSource::new(payloads)), None);
        pipeline
    }

    /// End-to-end: SimulatedSource → IngestionPipeline → TelemetryCore → MonitorView
    #[tokio::test]
    async fn test_e2e_simulated_monitor() {
        let simulation = SimulationConfig {
            enabled: true,
            interval_ms: 5,
            ..Default::default()
        };
        let sensor_id = simulation.sensor_id.clone();

        let mut pipeline = IngestionPipeline::new(64);
        pipeline.register_source(
            Box::new(SimulatedSource::new(simulation).with_seed(7)),
            None,
        );

        let core = TelemetryCore::for_pipeline(CoreConfig::default(), &mut pipeline);
        let view = core.view();
        let handle = tokio::spawn(core.run(pipeline.take_receiver().unwrap()));

        pipeline.start_all();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(view.transport_state(), TransportState::Connected);

        pipeline.shutdown();
        let stats = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("core should drain after shutdown")
            .unwrap();

        let series = view.series(&sensor_id);
        assert!(!series.is_empty());
        assert_eq!(stats.readings_stored as usize, series.len());
        assert_eq!(stats.rejected(), 0);
        assert!(series.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(view.sensor_ids().len(), 1);
        let inbound = pipeline.metrics().snapshot().messages_received as usize;
        assert_eq!(view.log_tail().len(), inbound.min(100));
    }

    /// Malformed traffic reaches the log only; status follows the last valid reading
    #[tokio::test]
    async fn test_e2e_mixed_traffic() {
        let mut pipeline = pipeline_with(
            vec![
                r#"{"sensorId":"gyro-1","timestamp":"2024-05-01T10:00:00Z","ax":0.1,"ay":0.1,"az":2.5}"#,
                "not json at all",
                r#"{"sensorId":"mic-1","timestamp":"2024-05-01T10:00:00Z","decibels":80,"categorie":"loud"}"#,
                r#"{"timestamp":"2024-05-01T10:00:01Z","ax":9.0}"#,
                r#"{"sensorId":"gyro-1","timestamp":"2024-05-01T09:59:59Z","ax":0.2,"ay":0.0,"az":0.4}"#,
            ],
            BackpressureConfig::default(),
        );

        let core = TelemetryCore::for_pipeline(CoreConfig::default(), &mut pipeline);
        let view = core.view();
        let rx = pipeline.take_receiver().unwrap();

        pipeline.start_all();
        pipeline.shutdown();
        let stats = core.run(rx).await;

        assert_eq!(stats.messages_received, 5);
        assert_eq!(stats.readings_stored, 3);
        assert_eq!(stats.rejected_malformed, 1);
        assert_eq!(stats.rejected_missing_identity, 1);
        assert_eq!(view.log_tail().len(), 5);

        // Last valid reading was below threshold, and the mic reading never alarms
        assert_eq!(view.status(), DeviceStatus::Normal);
        assert_eq!(view.status_label(), "Active");

        // Out-of-order arrival re-sorted within its own buffer only
        let gyro = view.series("gyro-1");
        assert_eq!(gyro.len(), 2);
        assert!(gyro[0].timestamp < gyro[1].timestamp);
        assert_eq!(view.series("mic-1").len(), 1);
        assert_eq!(view.buffer_stats("gyro-1").map(|s| s.out_of_order), Some(1));
    }

    #[tokio::test]
    async fn test_e2e_drop_newest_is_counted() {
        let mut pipeline = pipeline_with(
            vec![
                r#"{"sensorId":"a","timestamp":1}"#,
                r#"{"sensorId":"a","timestamp":2}"#,
                r#"{"sensorId":"a","timestamp":3}"#,
                r#"{"sensorId":"a","timestamp":4}"#,
            ],
            BackpressureConfig::new(2, DropPolicy::DropNewest),
        );

        let core = TelemetryCore::for_pipeline(CoreConfig::default(), &mut pipeline);
        let view = core.view();
        let rx = pipeline.take_receiver().unwrap();

        pipeline.start_all();
        pipeline.shutdown();
        let stats = core.run(rx).await;

        assert_eq!(stats.readings_stored, 2);
        assert_eq!(stats.channel_dropped, 2);
        assert_eq!(stats.messages_received, 2);
        // Dropped messages still reach the diagnostic log
        assert_eq!(view.log_tail().len(), 4);
        let kept: Vec<i64> = view
            .series("a")
            .iter()
            .map(|r| r.timestamp.timestamp_millis())
            .collect();
        assert_eq!(kept, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_e2e_drop_oldest_keeps_latest() {
        let mut pipeline = pipeline_with(
            vec![
                r#"{"sensorId":"a","timestamp":1}"#,
                r#"{"sensorId":"a","timestamp":2}"#,
                r#"{"sensorId":"a","timestamp":3}"#,
                r#"{"sensorId":"a","timestamp":4}"#,
            ],
            BackpressureConfig::new(2, DropPolicy::DropOldest),
        );

        let core = TelemetryCore::for_pipeline(CoreConfig::default(), &mut pipeline);
        let view = core.view();
        let rx = pipeline.take_receiver().unwrap();

        pipeline.start_all();
        pipeline.shutdown();
        core.run(rx).await;

        let kept: Vec<i64> = view
            .series("a")
            .iter()
            .map(|r| r.timestamp.timestamp_millis())
            .collect();
        assert_eq!(kept, vec![3, 4]);
        assert_eq!(view.stats().channel_dropped, 2);
        assert_eq!(view.log_tail().len(), 4);
    }

    /// The log sees every inbound message, bounded by its own capacity
    #[tokio::test]
    async fn test_e2e_log_sees_every_inbound_message() {
        let payloads = vec![
            r#"{"sensorId":"a","timestamp":1}"#,
            r#"{"sensorId":"a","timestamp":2}"#,
            "garbage",
            r#"{"sensorId":"a","timestamp":4}"#,
            r#"{"sensorId":"a","timestamp":5}"#,
            r#"{"sensorId":"a","timestamp":6}"#,
        ];

        for (log_capacity, policy) in [
            (3, DropPolicy::DropNewest),
            (3, DropPolicy::DropOldest),
            (10, DropPolicy::DropNewest),
        ] {
            let mut pipeline =
                pipeline_with(payloads.clone(), BackpressureConfig::new(2, policy));
            let config = CoreConfig {
                log_capacity,
                ..CoreConfig::default()
            };
            let core = TelemetryCore::for_pipeline(config, &mut pipeline);
            let view = core.view();
            let rx = pipeline.take_receiver().unwrap();

            pipeline.start_all();
            pipeline.shutdown();
            let stats = core.run(rx).await;

            assert_eq!(stats.messages_received, 2);
            let logged: Vec<String> =
                view.log_tail().into_iter().map(|e| e.raw_payload).collect();
            let expected = &payloads[payloads.len() - payloads.len().min(log_capacity)..];
            assert_eq!(logged, expected, "policy {policy:?}, log capacity {log_capacity}");
        }
    }
}
