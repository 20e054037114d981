//! # Telemetry Core
//!
//! Ingestion and state-management core of the mine monitor.
//!
//! Responsibilities:
//! - Parse and validate raw payloads into `SensorReading`
//! - Classify each reading into the process-wide `DeviceStatus`
//! - Keep a bounded, timestamp-ordered series per sensor
//! - Keep a bounded diagnostic log of every raw message
//! - Serve immutable snapshots to the presentation layer
//!
//! ## Usage Example
//!
//! ```ignore
//! use telemetry_core::{CoreConfig, TelemetryCore};
//!
//! // The diagnostic log is attached to the pipeline as a tap
//! let core = TelemetryCore::for_pipeline(CoreConfig::from_blueprint(&blueprint), &mut pipeline);
//! let view = core.view();
//!
//! // Single writer: the consumer task owns the core
//! tokio::spawn(core.run(pipeline.take_receiver().unwrap()));
//! pipeline.start_all();
//!
//! // Any number of readers
//! println!("{}", view.status_label());
//! let page = view.page("gyro-1", 0, 10);
//! ```

mod buffer;
mod classifier;
mod engine;
mod error;
mod log_ring;
mod parser;
mod store;
mod view;

// Re-exports
pub use buffer::{AppendOutcome, BufferStats, SeriesBuffer};
pub use classifier::{classify, StatusCell, ALARM_AXES};
pub use engine::{CoreConfig, CoreStats, CoreStatsSnapshot, IngestOutcome, TelemetryCore};
pub use error::ParseError;
pub use log_ring::DiagnosticLog;
pub use parser::parse;
pub use store::SensorStore;
pub use view::{ChartPoint, DashboardSnapshot, MonitorView, SensorSummary};

// Re-export contracts types
pub use contracts::{DeviceStatus, LogEntry, PageResult, SensorReading, TransportState};
