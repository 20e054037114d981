//! SensorReading - parser output
//!
//! A validated sensor event: identity, producer timestamp and a loose,
//! schema-less field map. Field schemas differ per sensor kind, so values
//! are only ever read through accessors that report absence explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::SensorId;

/// Rendered in place of a field the reading does not carry
pub const MISSING_SENTINEL: &str = "—";

/// Well-known field names of the sensor fleet
pub mod fields {
    /// Motion sensor: vibration magnitude (mg)
    pub const VIBRATION: &str = "vibration";
    /// Motion sensor: acceleration, x axis
    pub const AX: &str = "ax";
    /// Motion sensor: acceleration, y axis
    pub const AY: &str = "ay";
    /// Motion sensor: acceleration, z axis
    pub const AZ: &str = "az";
    /// Sound sensor: level in decibels
    pub const DECIBELS: &str = "decibels";
    /// Sound sensor: category label
    pub const CATEGORIE: &str = "categorie";
    /// Light sensor: illuminance
    pub const LUX: &str = "lux";
}

/// A single field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n:.2}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Result of a numeric field lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldLookup {
    /// Field present and numeric (or a numeric string)
    Present(f64),
    /// Field absent from the reading
    Missing,
    /// Field present but not interpretable as a number
    NotNumeric,
}

impl FieldLookup {
    /// Numeric value, if any
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Present(v) => Some(v),
            Self::Missing | Self::NotNumeric => None,
        }
    }
}

/// Validated sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Sensor identity (never empty)
    pub sensor_id: SensorId,

    /// Producer timestamp, normalized to UTC
    pub timestamp: DateTime<Utc>,

    /// Sensor-specific fields
    pub fields: BTreeMap<String, FieldValue>,
}

impl SensorReading {
    /// Create a reading without fields
    pub fn new(sensor_id: SensorId, timestamp: DateTime<Utc>) -> Self {
        Self {
            sensor_id,
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Builder-style numeric field insertion
    pub fn with_number(self, name: impl Into<String>, value: f64) -> Self {
        self.with_field(name, FieldValue::Number(value))
    }

    /// Raw field access
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Numeric field access, distinguishing absence from bad data
    pub fn number(&self, name: &str) -> FieldLookup {
        match self.fields.get(name) {
            None => FieldLookup::Missing,
            Some(FieldValue::Number(n)) if n.is_finite() => FieldLookup::Present(*n),
            Some(FieldValue::Number(_)) => FieldLookup::NotNumeric,
            Some(FieldValue::Text(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map_or(FieldLookup::NotNumeric, FieldLookup::Present),
        }
    }

    /// Table cell text for a field; absent fields render as [`MISSING_SENTINEL`]
    pub fn display(&self, name: &str) -> String {
        self.fields
            .get(name)
            .map_or_else(|| MISSING_SENTINEL.to_string(), ToString::to_string)
    }
}
