//! Event parser: raw payload bytes → validated [`SensorReading`]
//!
//! Pure function, no side effects. Callers record the raw message in the
//! diagnostic log before parsing, so a rejected payload stays visible there.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use contracts::{FieldValue, SensorId, SensorReading};
use serde_json::{Map, Value};

use crate::ParseError;

/// Wire key of the sensor identity
const SENSOR_ID_KEY: &str = "sensorId";
/// Wire key of the producer timestamp
const TIMESTAMP_KEY: &str = "timestamp";

/// Naive layouts accepted as UTC when the producer omits an offset
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse and validate one payload
///
/// - `sensorId`: non-empty string (numbers are accepted and stringified)
/// - `timestamp`: RFC 3339, naive ISO-8601 (as UTC) or epoch milliseconds
/// - every other top-level key: numbers and strings kept, booleans as 0/1,
///   nulls, arrays and objects skipped
pub fn parse(raw: &[u8]) -> Result<SensorReading, ParseError> {
    let value: Value = serde_json::from_slice(raw).map_err(|e| ParseError::Malformed {
        reason: e.to_string(),
    })?;

    let Value::Object(mut object) = value else {
        return Err(ParseError::Malformed {
            reason: format!("expected a JSON object, got {}", json_kind(&value)),
        });
    };

    let sensor_id = take_sensor_id(&mut object)?;
    let timestamp = take_timestamp(&mut object)?;

    let fields: BTreeMap<String, FieldValue> = object
        .into_iter()
        .filter_map(|(key, value)| to_field(value).map(|v| (key, v)))
        .collect();

    Ok(SensorReading {
        sensor_id,
        timestamp,
        fields,
    })
}

fn take_sensor_id(object: &mut Map<String, Value>) -> Result<SensorId, ParseError> {
    let missing = ParseError::MissingIdentity {
        field: SENSOR_ID_KEY,
    };

    match object.remove(SENSOR_ID_KEY) {
        Some(Value::String(s)) => SensorId::parse(&s).ok_or(missing),
        Some(Value::Number(n)) => SensorId::parse(&n.to_string()).ok_or(missing),
        _ => Err(missing),
    }
}

fn take_timestamp(object: &mut Map<String, Value>) -> Result<DateTime<Utc>, ParseError> {
    match object.remove(TIMESTAMP_KEY) {
        None | Some(Value::Null) => Err(ParseError::MissingIdentity {
            field: TIMESTAMP_KEY,
        }),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ParseError::MissingIdentity {
            field: TIMESTAMP_KEY,
        }),
        Some(Value::String(s)) => parse_timestamp_str(s.trim())
            .ok_or(ParseError::InvalidTimestamp { raw: s }),
        Some(Value::Number(n)) => {
            epoch_millis(&n).ok_or_else(|| ParseError::InvalidTimestamp { raw: n.to_string() })
        }
        Some(other) => Err(ParseError::InvalidTimestamp {
            raw: other.to_string(),
        }),
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn epoch_millis(n: &serde_json::Number) -> Option<DateTime<Utc>> {
    if let Some(ms) = n.as_i64() {
        return Utc.timestamp_millis_opt(ms).single();
    }

    let ms = n.as_f64().filter(|v| v.is_finite())?;
    let nanos = ms * 1_000_000.0;
    if nanos.abs() > i64::MAX as f64 {
        return None;
    }
    Some(Utc.timestamp_nanos(nanos as i64))
}

fn to_field(value: Value) -> Option<FieldValue> {
    match value {
        Value::Number(n) => n.as_f64().map(FieldValue::Number),
        Value::String(s) => Some(FieldValue::Text(s)),
        Value::Bool(b) => Some(FieldValue::Number(if b { 1.0 } else { 0.0 })),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{fields, FieldLookup};

    #[test]
    fn test_parse_motion_reading() {
        let raw = br#"{"sensorId":"gyro-1","timestamp":"2024-05-01T10:00:00Z","vibration":812.5,"ax":0.4,"ay":-1.2,"az":2.5}"#;
        let reading = parse(raw).unwrap();

        assert_eq!(reading.sensor_id, "gyro-1");
        assert_eq!(reading.timestamp.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert_eq!(reading.number(fields::AZ), FieldLookup::Present(2.5));
        assert_eq!(reading.number(fields::VIBRATION), FieldLookup::Present(812.5));
        assert!(reading.field("sensorId").is_none());
        assert!(reading.field("timestamp").is_none());
    }

    #[test]
    fn test_parse_sound_reading_keeps_text() {
        let raw = br#"{"sensorId":"mic","timestamp":"2024-05-01T10:00:00+02:00","categorie":"loud","decibels":"87.1"}"#;
        let reading = parse(raw).unwrap();

        assert_eq!(reading.timestamp.to_rfc3339(), "2024-05-01T08:00:00+00:00");
        assert_eq!(reading.display(fields::CATEGORIE), "loud");
        assert_eq!(reading.number(fields::DECIBELS), FieldLookup::Present(87.1));
        assert_eq!(reading.number(fields::AX), FieldLookup::Missing);
    }

    #[test]
    fn test_timestamp_forms() {
        let naive = parse(br#"{"sensorId":"a","timestamp":"2024-05-01T10:00:00.250"}"#).unwrap();
        assert_eq!(naive.timestamp.timestamp_millis(), 1_714_557_600_250);

        let spaced = parse(br#"{"sensorId":"a","timestamp":"2024-05-01 10:00:00"}"#).unwrap();
        assert_eq!(spaced.timestamp.timestamp_millis(), 1_714_557_600_000);

        let millis = parse(br#"{"sensorId":"a","timestamp":1714557600000}"#).unwrap();
        assert_eq!(millis.timestamp.timestamp_millis(), 1_714_557_600_000);

        let fractional = parse(br#"{"sensorId":"a","timestamp":1714557600000.5}"#).unwrap();
        assert_eq!(fractional.timestamp.timestamp_millis(), 1_714_557_600_000);
    }

    #[test]
    fn test_malformed_payloads() {
        let payloads: [&[u8]; 5] = [b"not json", b"", b"[1,2]", b"42", b"{\"sensorId\":"];
        for raw in payloads {
            let err = parse(raw).unwrap_err();
            assert_eq!(err.kind(), "malformed", "payload {:?}", raw);
        }
    }

    #[test]
    fn test_missing_identity() {
        let cases: [(&[u8], &str); 5] = [
            (br#"{"timestamp":"2024-05-01T10:00:00Z"}"#, "sensorId"),
            (br#"{"sensorId":"  ","timestamp":"2024-05-01T10:00:00Z"}"#, "sensorId"),
            (br#"{"sensorId":true,"timestamp":"2024-05-01T10:00:00Z"}"#, "sensorId"),
            (br#"{"sensorId":"a"}"#, "timestamp"),
            (br#"{"sensorId":"a","timestamp":""}"#, "timestamp"),
        ];

        for (raw, expected) in cases {
            assert_eq!(
                parse(raw).unwrap_err(),
                ParseError::MissingIdentity { field: expected }
            );
        }
    }

    #[test]
    fn test_numeric_sensor_id_is_accepted() {
        let reading = parse(br#"{"sensorId":17,"timestamp":0}"#).unwrap();
        assert_eq!(reading.sensor_id, "17");
    }

    #[test]
    fn test_invalid_timestamp() {
        let err = parse(br#"{"sensorId":"a","timestamp":"yesterday"}"#).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidTimestamp {
                raw: "yesterday".into()
            }
        );

        let err = parse(br#"{"sensorId":"a","timestamp":[1]}"#).unwrap_err();
        assert_eq!(err.kind(), "invalid_timestamp");
    }

    #[test]
    fn test_unsupported_values_are_skipped() {
        let raw = br#"{"sensorId":"a","timestamp":0,"lux":null,"tags":["x"],"meta":{"k":1},"on":true}"#;
        let reading = parse(raw).unwrap();

        assert!(reading.field(fields::LUX).is_none());
        assert!(reading.field("tags").is_none());
        assert!(reading.field("meta").is_none());
        assert_eq!(reading.number("on"), FieldLookup::Present(1.0));
    }
}
