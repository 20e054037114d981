//! # Ingestion Pipeline
//!
//! Broker transport side of the monitor.
//!
//! Responsibilities:
//! - Register message sources (MQTT broker or simulated fleet)
//! - Own reconnect/backoff below the subscribe API
//! - Backpressure management and drop policy
//! - Hand raw messages to the single consumer via async-channel
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{IngestionPipeline, MqttSource};
//!
//! let mut pipeline = IngestionPipeline::new(256);
//! pipeline.register_source(Box::new(MqttSource::new(blueprint.broker.clone())?), None);
//!
//! pipeline.start_all();
//! let rx = pipeline.take_receiver().unwrap();
//! while let Ok(message) = rx.recv().await {
//!     // Parse and store
//! }
//! ```
//!
//! ## Without a broker
//!
//! ```ignore
//! use ingestion::SimulatedSource;
//!
//! let source = SimulatedSource::new(blueprint.simulation.clone());
//! pipeline.register_source(Box::new(source), None);
//! ```

mod config;
mod error;
#[cfg(feature = "mqtt")]
mod mqtt;
mod pipeline;
mod send;
mod simulated;
mod source_adapter;

// Re-exports
pub use config::{BackpressureConfig, DropPolicy, IngestionMetrics, MetricsSnapshot};
pub use contracts::RawMessage;
pub use error::{Result, TransportError};
#[cfg(feature = "mqtt")]
pub use mqtt::MqttSource;
pub use pipeline::IngestionPipeline;
pub use simulated::SimulatedSource;
