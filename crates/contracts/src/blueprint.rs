//! MonitorBlueprint - config loader output
//!
//! Describes the complete monitor configuration: broker connection, buffer
//! bounds, alarm threshold, view defaults and the optional simulated fleet.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ContractError;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete monitor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorBlueprint {
    #[serde(default)]
    pub version: ConfigVersion,

    #[serde(default)]
    pub broker: BrokerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub view: ViewConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Broker connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker endpoint, `mqtt://host:port` or `tcp://host:port`
    #[serde(default = "default_broker_uri")]
    pub uri: String,

    /// MQTT client id
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Topic filters to subscribe to (re-issued on every reconnect)
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Delay between reconnect attempts
    #[serde(default = "default_reconnect_interval_secs")]
    pub reconnect_interval_secs: u64,

    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    /// Capacity of the queue between transport and consumer
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// What to drop when that queue is full
    #[serde(default)]
    pub drop_policy: DropPolicy,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            uri: default_broker_uri(),
            client_id: default_client_id(),
            topics: default_topics(),
            username: None,
            password: None,
            reconnect_interval_secs: default_reconnect_interval_secs(),
            keep_alive_secs: default_keep_alive_secs(),
            channel_capacity: default_channel_capacity(),
            drop_policy: DropPolicy::default(),
        }
    }
}

impl BrokerConfig {
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.reconnect_interval_secs)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// Split `uri` into host and port
    pub fn endpoint(&self) -> Result<BrokerEndpoint, ContractError> {
        BrokerEndpoint::parse(&self.uri)
    }
}

/// Host and port of the broker, parsed from `mqtt://host[:port]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
}

impl BrokerEndpoint {
    /// Default MQTT port when the URI omits one
    pub const DEFAULT_PORT: u16 = 1883;

    pub fn parse(uri: &str) -> Result<Self, ContractError> {
        let invalid = |message: String| ContractError::config_validation("broker.uri", message);

        let rest = ["mqtt://", "tcp://"]
            .iter()
            .find_map(|scheme| uri.strip_prefix(scheme))
            .ok_or_else(|| invalid(format!("unsupported scheme in '{uri}', expected mqtt:// or tcp://")))?;

        let authority = rest.trim_end_matches('/');
        let parse_port = |port: &str| {
            port.parse::<u16>()
                .map_err(|_| invalid(format!("invalid port '{port}'")))
        };

        // `[v6addr]` or `[v6addr]:port`; the brackets are not part of the host
        let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
            let (host, after) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid(format!("unterminated IPv6 host in '{uri}'")))?;
            let port = match after {
                "" => Self::DEFAULT_PORT,
                _ => match after.strip_prefix(':') {
                    Some(port) => parse_port(port)?,
                    None => {
                        return Err(invalid(format!(
                            "unexpected '{after}' after IPv6 host in '{uri}'"
                        )))
                    }
                },
            };
            (host, port)
        } else {
            match authority.rsplit_once(':') {
                Some((host, _)) if host.contains(':') => {
                    return Err(invalid(format!(
                        "IPv6 host in '{uri}' must be enclosed in brackets"
                    )))
                }
                Some((host, port)) => (host, parse_port(port)?),
                None => (authority, Self::DEFAULT_PORT),
            }
        };

        if host.is_empty() || host.contains('/') {
            return Err(invalid(format!("missing or malformed host in '{uri}'")));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

fn default_broker_uri() -> String {
    "mqtt://localhost:1883".to_string()
}

fn default_client_id() -> String {
    "mine-monitor".to_string()
}

fn default_topics() -> Vec<String> {
    vec!["sensors/#".to_string()]
}

fn default_reconnect_interval_secs() -> u64 {
    5
}

fn default_keep_alive_secs() -> u64 {
    30
}

fn default_channel_capacity() -> usize {
    256
}

/// Drop policy when the ingestion queue is full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Evict the oldest queued message to make room
    DropOldest,
    /// Discard the incoming message
    #[default]
    DropNewest,
}

/// In-memory retention bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum readings kept per sensor
    #[serde(default = "default_series_capacity")]
    pub series_capacity: usize,

    /// Maximum diagnostic log entries
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            series_capacity: default_series_capacity(),
            log_capacity: default_log_capacity(),
        }
    }
}

fn default_series_capacity() -> usize {
    500
}

fn default_log_capacity() -> usize {
    100
}

/// Alarm classification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Absolute acceleration above which a reading raises the alarm
    #[serde(default = "default_alarm_threshold")]
    pub alarm_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            alarm_threshold: default_alarm_threshold(),
        }
    }
}

fn default_alarm_threshold() -> f64 {
    2.0
}

/// Presentation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Rows per table page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Keep every n-th reading when producing chart points
    #[serde(default = "default_chart_reduction_factor")]
    pub chart_reduction_factor: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            chart_reduction_factor: default_chart_reduction_factor(),
        }
    }
}

fn default_page_size() -> usize {
    10
}

fn default_chart_reduction_factor() -> usize {
    10
}

/// Simulated motion sensor, used instead of a broker for demos and tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_simulated_sensor_id")]
    pub sensor_id: String,

    /// Topic stamped on generated messages
    #[serde(default = "default_simulated_topic")]
    pub topic: String,

    #[serde(default = "default_simulated_interval_ms")]
    pub interval_ms: u64,

    /// Vibration is drawn from `[0, vibration_max)`
    #[serde(default = "default_vibration_max")]
    pub vibration_max: f64,

    /// Each axis is drawn from `[-axis_span / 2, axis_span / 2)`
    #[serde(default = "default_axis_span")]
    pub axis_span: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sensor_id: default_simulated_sensor_id(),
            topic: default_simulated_topic(),
            interval_ms: default_simulated_interval_ms(),
            vibration_max: default_vibration_max(),
            axis_span: default_axis_span(),
        }
    }
}

impl SimulationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_simulated_sensor_id() -> String {
    "gyro-1".to_string()
}

fn default_simulated_topic() -> String {
    "sensors/simulated".to_string()
}

fn default_simulated_interval_ms() -> u64 {
    1000
}

fn default_vibration_max() -> f64 {
    2000.0
}

fn default_axis_span() -> f64 {
    10.0
}
