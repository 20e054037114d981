//! Derived status enums surfaced to the presentation layer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Process-wide device status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    #[default]
    Normal,
    Alarm,
}

impl DeviceStatus {
    /// Label shown on the dashboard status lamp
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Active",
            Self::Alarm => "Exploded",
        }
    }

    pub fn is_alarm(self) -> bool {
        matches!(self, Self::Alarm)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Connection state of the broker transport
///
/// Informational only; it never changes the device status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    #[default]
    Connecting,
    Connected,
    Reconnecting,
    Disconnected,
}

impl TransportState {
    /// Compact encoding for atomic storage
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Connected => 1,
            Self::Reconnecting => 2,
            Self::Disconnected => 3,
        }
    }

    /// Inverse of [`TransportState::as_u8`]; unknown codes map to `Disconnected`
    pub fn from_u8(code: u8) -> Self {
        match code {
            0 => Self::Connecting,
            1 => Self::Connected,
            2 => Self::Reconnecting,
            _ => Self::Disconnected,
        }
    }
}

/// Shared, lock-free holder of the current [`TransportState`]
///
/// Written by the transport, read by the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct TransportStateCell(Arc<AtomicU8>);

impl TransportStateCell {
    pub fn new(initial: TransportState) -> Self {
        Self(Arc::new(AtomicU8::new(initial.as_u8())))
    }

    pub fn get(&self) -> TransportState {
        TransportState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Store `state`, returning the previous value
    pub fn set(&self, state: TransportState) -> TransportState {
        TransportState::from_u8(self.0.swap(state.as_u8(), Ordering::AcqRel))
    }
}
