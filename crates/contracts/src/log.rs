//! LogEntry - diagnostic log record

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::RawMessage;

/// One raw message as seen by the diagnostic log, parsed or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Local wall-clock time of arrival
    pub received_at: DateTime<Utc>,

    pub topic: String,

    /// Payload text; invalid UTF-8 is replaced, never rejected
    pub raw_payload: String,
}

impl LogEntry {
    pub fn new(
        received_at: DateTime<Utc>,
        topic: impl Into<String>,
        raw_payload: impl Into<String>,
    ) -> Self {
        Self {
            received_at,
            topic: topic.into(),
            raw_payload: raw_payload.into(),
        }
    }
}

impl From<&RawMessage> for LogEntry {
    fn from(msg: &RawMessage) -> Self {
        Self::new(msg.received_at, msg.topic.clone(), msg.payload_lossy())
    }
}
