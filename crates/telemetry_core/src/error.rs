//! Parse error types

use thiserror::Error;

/// Why a raw payload was rejected
///
/// Contained at the message boundary: the message is dropped from the data
/// path but stays visible in the diagnostic log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Not decodable as a structured record
    #[error("malformed payload: {reason}")]
    Malformed { reason: String },

    /// `sensorId` or `timestamp` absent or empty
    #[error("missing identity field '{field}'")]
    MissingIdentity { field: &'static str },

    /// `timestamp` present but not a recognizable instant
    #[error("invalid timestamp '{raw}'")]
    InvalidTimestamp { raw: String },
}

impl ParseError {
    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "malformed",
            Self::MissingIdentity { .. } => "missing_identity",
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
        }
    }
}
