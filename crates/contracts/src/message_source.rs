//! MessageSource trait - broker transport abstraction
//!
//! Decouples the ingestion pipeline from the concrete pub/sub client so the
//! MQTT transport and the simulated fleet are driven the same way.

use std::sync::Arc;

use crate::{RawMessage, TransportStateCell};

/// Callback invoked once per delivered message, in arrival order
pub type MessageCallback = Arc<dyn Fn(RawMessage) + Send + Sync>;

/// Observer of every inbound message, called on the transport side before
/// the message is queued
///
/// Taps see messages the queue later drops or evicts. Implementations must
/// not block: they run on the transport's delivery path.
pub trait MessageTap: Send + Sync {
    fn observe(&self, message: &RawMessage);
}

/// Pub/sub message source
///
/// Implementations own their connection and its reconnect policy. After a
/// reconnect they keep invoking the same callback; nothing is replayed or
/// deduplicated on their side.
pub trait MessageSource: Send + Sync {
    /// Human-readable source name (logging, metrics)
    fn name(&self) -> &str;

    /// Start delivering messages to `callback`, publishing connection
    /// changes into `state`
    ///
    /// Repeated calls while running are idempotent.
    fn start(&self, callback: MessageCallback, state: TransportStateCell);

    /// Stop delivery and release the connection
    fn stop(&self);

    /// Whether the source is currently delivering
    fn is_running(&self) -> bool;
}
