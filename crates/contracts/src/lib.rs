//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the monitor.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Reading timestamps come from the producer (`timestamp` wire field) and
//!   are normalized to UTC instants
//! - `received_at` on raw messages and log entries is the local wall clock

mod blueprint;
mod error;
mod log;
mod message;
mod message_source;
mod page;
mod reading;
mod sensor_id;
mod status;

pub use blueprint::*;
pub use error::*;
pub use log::LogEntry;
pub use message::*;
pub use message_source::{MessageCallback, MessageSource, MessageTap};
pub use page::PageResult;
pub use reading::*;
pub use sensor_id::SensorId;
pub use status::{DeviceStatus, TransportState, TransportStateCell};
