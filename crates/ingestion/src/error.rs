//! Transport error types

use thiserror::Error;

/// Transport error
///
/// Never fatal to the core: connection problems are logged and retried by
/// the source that owns the connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Broker endpoint could not be derived from configuration
    #[error("invalid broker endpoint: {message}")]
    InvalidEndpoint {
        /// Error message
        message: String,
    },

    /// Connection refused, timed out or rejected by the broker
    #[error("connection to {endpoint} failed: {message}")]
    Connection {
        /// host:port
        endpoint: String,
        /// Error message
        message: String,
    },

    /// Subscription request could not be queued
    #[error("subscribe to '{topic}' failed: {message}")]
    Subscribe {
        /// Topic filter
        topic: String,
        /// Error message
        message: String,
    },

    /// Consumer side of the ingestion channel is gone
    #[error("ingestion channel closed for source {source_name}")]
    ChannelClosed {
        /// Source name
        source_name: String,
    },
}

/// Transport Result type alias
pub type Result<T> = std::result::Result<T, TransportError>;
