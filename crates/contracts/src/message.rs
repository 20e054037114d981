//! RawMessage - transport output
//!
//! One pub/sub delivery, untouched by parsing.

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Raw message as delivered by the broker
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Topic the message was published on
    pub topic: String,

    /// Payload bytes (zero-copy from the transport)
    pub payload: Bytes,

    /// Local wall-clock time of arrival
    pub received_at: DateTime<Utc>,
}

impl RawMessage {
    /// Stamp a payload with the current time
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at: Utc::now(),
        }
    }

    /// Payload rendered as text, replacing invalid UTF-8 sequences
    pub fn payload_lossy(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_lossy_keeps_invalid_bytes_visible() {
        let msg = RawMessage::new("sensors/gyro", vec![b'o', b'k', 0xff]);
        assert_eq!(msg.payload_lossy(), "ok\u{fffd}");
    }
}
