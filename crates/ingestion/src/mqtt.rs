//! MQTT message source
//!
//! Wraps a rumqttc event loop. The loop owns reconnection: on any
//! connection error it reports `Reconnecting`, waits the configured
//! interval and polls again, which makes rumqttc dial the broker anew.
//! Topic filters are re-subscribed on every ConnAck.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contracts::{
    BrokerConfig, MessageCallback, MessageSource, RawMessage, TransportState, TransportStateCell,
};
use metrics::counter;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, TransportError};

/// Request queue depth between client handle and event loop
const REQUEST_CAPACITY: usize = 16;

/// Sensor data is at-least-once; redeliveries after a reconnect are
/// appended again by the core.
const SUBSCRIBE_QOS: QoS = QoS::AtLeastOnce;

/// MQTT broker source
pub struct MqttSource {
    name: String,
    config: BrokerConfig,
    host: String,
    port: u16,
    running: Arc<AtomicBool>,
    client: Mutex<Option<AsyncClient>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MqttSource {
    /// Build a source for `config`; fails only on an unusable endpoint
    pub fn new(config: BrokerConfig) -> Result<Self> {
        let endpoint = config
            .endpoint()
            .map_err(|e| TransportError::InvalidEndpoint {
                message: e.to_string(),
            })?;

        Ok(Self {
            name: format!("mqtt:{}:{}", endpoint.host, endpoint.port),
            config,
            host: endpoint.host,
            port: endpoint.port,
            running: Arc::new(AtomicBool::new(false)),
            client: Mutex::new(None),
            task: Mutex::new(None),
        })
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.config.client_id, &self.host, self.port);
        options.set_keep_alive(self.config.keep_alive());
        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            options.set_credentials(username, password);
        }
        options
    }
}

impl MessageSource for MqttSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "mqtt_source_start", skip(self, callback, state), fields(source = %self.name))]
    fn start(&self, callback: MessageCallback, state: TransportStateCell) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        state.set(TransportState::Connecting);
        let (client, eventloop) = AsyncClient::new(self.options(), REQUEST_CAPACITY);

        let worker = EventLoopWorker {
            name: self.name.clone(),
            endpoint: format!("{}:{}", self.host, self.port),
            client: client.clone(),
            topics: self.config.topics.clone(),
            reconnect_interval: self.config.reconnect_interval(),
            running: self.running.clone(),
            state,
            callback,
        };

        info!(topics = ?self.config.topics, "connecting to broker");
        let handle = tokio::spawn(worker.run(eventloop));

        if let Ok(mut slot) = self.client.lock() {
            *slot = Some(client);
        }
        if let Ok(mut slot) = self.task.lock() {
            *slot = Some(handle);
        }
    }

    fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(client) = self.client.lock().ok().and_then(|mut c| c.take()) {
            if let Err(e) = client.try_disconnect() {
                debug!(source = %self.name, error = %e, "disconnect request not queued");
            }
        }
        if let Some(task) = self.task.lock().ok().and_then(|mut t| t.take()) {
            task.abort();
        }
        info!(source = %self.name, "mqtt source stopped");
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

/// Everything the event-loop task needs, moved into it
struct EventLoopWorker {
    name: String,
    endpoint: String,
    client: AsyncClient,
    topics: Vec<String>,
    reconnect_interval: Duration,
    running: Arc<AtomicBool>,
    state: TransportStateCell,
    callback: MessageCallback,
}

impl EventLoopWorker {
    async fn run(self, mut eventloop: EventLoop) {
        while self.running.load(Ordering::Relaxed) {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    (self.callback)(RawMessage::new(publish.topic, publish.payload));
                }
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    let previous = self.state.set(TransportState::Connected);
                    info!(source = %self.name, ?previous, "broker connected");
                    self.subscribe_all();
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    self.state.set(TransportState::Reconnecting);
                    warn!(source = %self.name, "broker sent disconnect");
                }
                Ok(_) => {}
                Err(e) => {
                    if !self.running.load(Ordering::Relaxed) {
                        break;
                    }
                    self.state.set(TransportState::Reconnecting);
                    counter!("mine_monitor_transport_errors_total", "source" => self.name.clone())
                        .increment(1);
                    let err = TransportError::Connection {
                        endpoint: self.endpoint.clone(),
                        message: e.to_string(),
                    };
                    warn!(
                        source = %self.name,
                        error = %err,
                        retry_in_secs = self.reconnect_interval.as_secs(),
                        "broker connection lost, retrying"
                    );
                    tokio::time::sleep(self.reconnect_interval).await;
                }
            }
        }

        self.state.set(TransportState::Disconnected);
        debug!(source = %self.name, "mqtt event loop exited");
    }

    fn subscribe_all(&self) {
        for topic in &self.topics {
            // try_subscribe: an awaiting subscribe could block on the very
            // event loop this task is responsible for polling.
            match self.client.try_subscribe(topic.as_str(), SUBSCRIBE_QOS) {
                Ok(()) => debug!(source = %self.name, topic = %topic, "subscribed"),
                Err(e) => {
                    let err = TransportError::Subscribe {
                        topic: topic.clone(),
                        message: e.to_string(),
                    };
                    warn!(source = %self.name, error = %err, "subscription not queued");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_bad_endpoint() {
        let config = BrokerConfig {
            uri: "http://broker".into(),
            ..Default::default()
        };
        assert!(matches!(
            MqttSource::new(config),
            Err(TransportError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_name_carries_endpoint() {
        let config = BrokerConfig {
            uri: "mqtt://broker.mine.local:1884".into(),
            ..Default::default()
        };
        let source = MqttSource::new(config).unwrap();
        assert_eq!(source.name(), "mqtt:broker.mine.local:1884");
        assert!(!source.is_running());
    }

    #[tokio::test]
    async fn test_unreachable_broker_reports_reconnecting() {
        let config = BrokerConfig {
            // Port 1 on loopback refuses connections immediately.
            uri: "mqtt://127.0.0.1:1".into(),
            reconnect_interval_secs: 1,
            ..Default::default()
        };
        let source = MqttSource::new(config).unwrap();
        let state = TransportStateCell::default();
        source.start(Arc::new(|_| {}), state.clone());

        let mut observed = state.get();
        for _ in 0..50 {
            observed = state.get();
            if observed == TransportState::Reconnecting {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        source.stop();
        assert_eq!(observed, TransportState::Reconnecting);
    }
}
