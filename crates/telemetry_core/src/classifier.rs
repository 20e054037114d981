//! Device status classification
//!
//! Stateless per reading; the process-wide status is whatever the most
//! recently applied reading said. No debounce, no decay.

use std::sync::atomic::{AtomicBool, Ordering};

use contracts::{fields, DeviceStatus, SensorReading};

/// Acceleration axes compared against the alarm threshold
pub const ALARM_AXES: [&str; 3] = [fields::AX, fields::AY, fields::AZ];

/// Alarm iff any axis magnitude is strictly greater than `threshold`
///
/// Absent or non-numeric axes count as 0 here, so non-motion sensors
/// always classify as `Normal`.
pub fn classify(reading: &SensorReading, threshold: f64) -> DeviceStatus {
    let alarm = ALARM_AXES
        .iter()
        .map(|axis| reading.number(axis).value().unwrap_or(0.0))
        .any(|v| v.abs() > threshold);

    if alarm {
        DeviceStatus::Alarm
    } else {
        DeviceStatus::Normal
    }
}

/// Process-wide device status
///
/// Written only by the consumer task, read by any number of views.
#[derive(Debug, Default)]
pub struct StatusCell(AtomicBool);

impl StatusCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> DeviceStatus {
        if self.0.load(Ordering::Acquire) {
            DeviceStatus::Alarm
        } else {
            DeviceStatus::Normal
        }
    }

    /// Overwrite the status, returning the previous one
    pub fn apply(&self, status: DeviceStatus) -> DeviceStatus {
        if self.0.swap(status.is_alarm(), Ordering::AcqRel) {
            DeviceStatus::Alarm
        } else {
            DeviceStatus::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::FieldValue;

    fn motion(ax: f64, ay: f64, az: f64) -> SensorReading {
        SensorReading::new("gyro".into(), Utc::now())
            .with_number(fields::AX, ax)
            .with_number(fields::AY, ay)
            .with_number(fields::AZ, az)
    }

    #[test]
    fn test_threshold_is_strict() {
        assert_eq!(classify(&motion(2.0, -2.0, 2.0), 2.0), DeviceStatus::Normal);
        assert_eq!(classify(&motion(0.0, 0.0, 2.0001), 2.0), DeviceStatus::Alarm);
        assert_eq!(classify(&motion(0.0, -2.5, 0.0), 2.0), DeviceStatus::Alarm);
    }

    #[test]
    fn test_non_motion_readings_are_normal() {
        let sound = SensorReading::new("mic".into(), Utc::now())
            .with_number(fields::DECIBELS, 120.0)
            .with_field(fields::CATEGORIE, FieldValue::Text("loud".into()));
        assert_eq!(classify(&sound, 2.0), DeviceStatus::Normal);

        let garbage = SensorReading::new("gyro".into(), Utc::now())
            .with_field(fields::AX, FieldValue::Text("n/a".into()));
        assert_eq!(classify(&garbage, 2.0), DeviceStatus::Normal);
    }

    #[test]
    fn test_last_applied_wins() {
        let cell = StatusCell::new();
        assert_eq!(cell.get(), DeviceStatus::Normal);

        let previous = cell.apply(classify(&motion(0.0, 0.0, 2.5), 2.0));
        assert_eq!(previous, DeviceStatus::Normal);
        assert_eq!(cell.get(), DeviceStatus::Alarm);

        let previous = cell.apply(classify(&motion(0.1, 0.2, 0.3), 2.0));
        assert_eq!(previous, DeviceStatus::Alarm);
        assert_eq!(cell.get(), DeviceStatus::Normal);
    }
}
