//! Diagnostic log: the last N raw messages, parsed or not.
//!
//! Backed by an overwriting heap ring buffer; independent of the series
//! buffers, so a flood of malformed traffic never touches sensor history.

use std::fmt;

use chrono::{DateTime, Utc};
use contracts::{LogEntry, MessageTap, RawMessage};
use parking_lot::Mutex;
use ringbuf::{traits::*, HeapRb};

pub struct DiagnosticLog {
    ring: Mutex<HeapRb<LogEntry>>,
    capacity: usize,
}

impl fmt::Debug for DiagnosticLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticLog")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl DiagnosticLog {
    /// Create an empty log; a zero capacity is raised to 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Mutex::new(HeapRb::new(capacity)),
            capacity,
        }
    }

    /// Record a payload stamped with the current time
    pub fn record(&self, topic: impl Into<String>, raw_payload: impl Into<String>) {
        self.record_at(Utc::now(), topic, raw_payload);
    }

    pub fn record_at(
        &self,
        received_at: DateTime<Utc>,
        topic: impl Into<String>,
        raw_payload: impl Into<String>,
    ) {
        self.push(LogEntry::new(received_at, topic, raw_payload));
    }

    /// Record a transport message, keeping its arrival stamp
    pub fn record_message(&self, message: &RawMessage) {
        self.push(LogEntry::from(message));
    }

    fn push(&self, entry: LogEntry) {
        // Full ring: the oldest entry is overwritten
        self.ring.lock().push_overwrite(entry);
    }

    /// Owned copy of all entries, oldest first
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.ring.lock().iter().cloned().collect()
    }

    /// Newest entry, if any
    pub fn latest(&self) -> Option<LogEntry> {
        self.ring.lock().iter().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.ring.lock().occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl MessageTap for DiagnosticLog {
    fn observe(&self, message: &RawMessage) {
        self.record_message(message);
    }
}
