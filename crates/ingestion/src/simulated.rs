//! Simulated motion sensor
//!
//! Publishes one motion reading per interval without a broker, shaped like
//! real gyroscope traffic: `vibration` in `[0, vibration_max)` and each
//! axis in `[-axis_span / 2, axis_span / 2)`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use contracts::{
    fields, MessageCallback, MessageSource, RawMessage, SimulationConfig, TransportState,
    TransportStateCell,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace, warn};

/// Simulated sensor source
pub struct SimulatedSource {
    name: String,
    config: SimulationConfig,
    seed: Option<u64>,
    running: Arc<AtomicBool>,
}

impl SimulatedSource {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            name: format!("simulated:{}", config.sensor_id),
            config,
            seed: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Deterministic readings, for tests
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Build one JSON payload in the wire format sensors publish
fn generate_payload(config: &SimulationConfig, rng: &mut StdRng) -> serde_json::Result<Vec<u8>> {
    let mut axis = || (rng.random::<f64>() - 0.5) * config.axis_span;
    let (ax, ay, az) = (axis(), axis(), axis());
    let vibration = rng.random::<f64>() * config.vibration_max;

    let mut record = serde_json::Map::new();
    record.insert("sensorId".into(), config.sensor_id.clone().into());
    record.insert("timestamp".into(), Utc::now().to_rfc3339().into());
    record.insert(fields::VIBRATION.into(), vibration.into());
    record.insert(fields::AX.into(), ax.into());
    record.insert(fields::AY.into(), ay.into());
    record.insert(fields::AZ.into(), az.into());
    serde_json::to_vec(&record)
}

impl MessageSource for SimulatedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, callback: MessageCallback, state: TransportStateCell) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let config = self.config.clone();
        let name = self.name.clone();
        let running = self.running.clone();
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        state.set(TransportState::Connected);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.interval());
            debug!(source = %name, interval_ms = config.interval_ms, "simulated source started");

            while running.load(Ordering::Relaxed) {
                ticker.tick().await;
                if !running.load(Ordering::Relaxed) {
                    break;
                }

                match generate_payload(&config, &mut rng) {
                    Ok(payload) => {
                        callback(RawMessage::new(config.topic.clone(), payload));
                        trace!(source = %name, "simulated reading published");
                    }
                    Err(e) => warn!(source = %name, error = %e, "failed to encode simulated reading"),
                }
            }

            state.set(TransportState::Disconnected);
            debug!(source = %name, "simulated source stopped");
        });
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> SimulationConfig {
        SimulationConfig {
            enabled: true,
            interval_ms: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_payload_ranges() {
        let config = config();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let payload = generate_payload(&config, &mut rng).unwrap();
            let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
            assert_eq!(value["sensorId"], "gyro-1");
            assert!(value["timestamp"].is_string());

            let vibration = value["vibration"].as_f64().unwrap();
            assert!((0.0..2000.0).contains(&vibration));
            for axis in ["ax", "ay", "az"] {
                let v = value[axis].as_f64().unwrap();
                assert!((-5.0..5.0).contains(&v), "{axis} = {v}");
            }
        }
    }

    #[tokio::test]
    async fn test_source_publishes_until_stopped() {
        let source = SimulatedSource::new(config()).with_seed(1);
        let (tx, rx) = async_channel::unbounded();
        let state = TransportStateCell::default();

        source.start(
            Arc::new(move |message| {
                let _ = tx.try_send(message);
            }),
            state.clone(),
        );
        assert!(source.is_running());
        assert_eq!(state.get(), TransportState::Connected);

        for _ in 0..3 {
            let message = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(message.topic, "sensors/simulated");
        }

        source.stop();
        assert!(!source.is_running());
    }
}
