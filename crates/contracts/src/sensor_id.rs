//! SensorId - cheap-to-clone, never-empty sensor identity
//!
//! One id is created per inbound message and cloned into the store key,
//! the reading itself and every snapshot, so it wraps an `Arc<str>`.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Sensor identifier, trimmed and guaranteed non-empty when built via
/// [`SensorId::parse`] or deserialization.
///
/// # Examples
/// ```
/// use contracts::SensorId;
///
/// let id = SensorId::parse("  gyro-1 ").unwrap();
/// assert_eq!(id, "gyro-1");
/// assert!(SensorId::parse("   ").is_none());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorId(Arc<str>);

impl SensorId {
    /// Validate and normalize a wire identity
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(Arc::from(trimmed)))
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for SensorId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        &self.0
    }
}

// Lets `HashMap<SensorId, _>` be queried with a plain `&str`.
impl Borrow<str> for SensorId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Infallible conversion for trusted literals (tests, configuration defaults).
impl From<&str> for SensorId {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for SensorId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensorId({:?})", &*self.0)
    }
}

impl PartialEq<str> for SensorId {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for SensorId {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl Serialize for SensorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SensorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| de::Error::custom("sensor id must not be empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_trims_and_rejects_blank() {
        assert_eq!(SensorId::parse(" lux-2\n").unwrap().as_str(), "lux-2");
        assert!(SensorId::parse("").is_none());
        assert!(SensorId::parse(" \t ").is_none());
    }

    #[test]
    fn test_clone_shares_allocation() {
        let a = SensorId::from("sound-1");
        let b = a.clone();
        assert_eq!(a.as_str().as_ptr(), b.as_str().as_ptr());
    }

    #[test]
    fn test_lookup_by_str() {
        let mut map: HashMap<SensorId, u32> = HashMap::new();
        map.insert("gyro".into(), 7);
        assert_eq!(map.get("gyro"), Some(&7));
    }

    #[test]
    fn test_deserialize_rejects_empty() {
        let ok: SensorId = serde_json::from_str("\"gyro\"").unwrap();
        assert_eq!(ok, "gyro");
        assert!(serde_json::from_str::<SensorId>("\"  \"").is_err());
    }
}
