//! SensorSample - Ingestion output
//!
//! One accelerometer + GPS reading published by the sensing agent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accelerometer reading (raw agent units)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Accelerometer {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// GPS fix
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Gps {
    /// Latitude (degrees)
    pub latitude: f64,

    /// Longitude (degrees)
    pub longitude: f64,
}

/// Sensor sample
///
/// Immutable once constructed; every field is required on the wire, unknown
/// fields are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorSample {
    /// Accelerometer reading
    pub accelerometer: Accelerometer,

    /// GPS fix
    pub gps: Gps,

    /// Agent-side capture time
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl SensorSample {
    /// Create a new sample
    pub fn new(accelerometer: Accelerometer, gps: Gps, timestamp: DateTime<Utc>) -> Self {
        Self {
            accelerometer,
            gps,
            timestamp,
        }
    }

    /// Vertical acceleration, the classification signal
    #[inline]
    pub fn vertical(&self) -> f64 {
        self.accelerometer.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "accelerometer": {"x": 1.0, "y": -2.5, "z": 16500},
        "gps": {"latitude": 50.4501, "longitude": 30.5234},
        "timestamp": "2024-02-27T10:00:00.123456"
    }"#;

    #[test]
    fn test_deserialize_sample() {
        let sample: SensorSample = serde_json::from_str(PAYLOAD).unwrap();
        assert_eq!(sample.accelerometer.y, -2.5);
        assert_eq!(sample.vertical(), 16500.0);
        assert_eq!(sample.gps.latitude, 50.4501);
    }

    #[test]
    fn test_reject_missing_field() {
        let payload = r#"{
            "accelerometer": {"x": 1.0, "y": 2.0},
            "gps": {"latitude": 0.0, "longitude": 0.0},
            "timestamp": "2024-02-27T10:00:00"
        }"#;
        assert!(serde_json::from_str::<SensorSample>(payload).is_err());
    }

    #[test]
    fn test_reject_unknown_field() {
        let payload = r#"{
            "accelerometer": {"x": 1.0, "y": 2.0, "z": 3.0},
            "gps": {"latitude": 0.0, "longitude": 0.0, "altitude": 120.0},
            "timestamp": "2024-02-27T10:00:00"
        }"#;
        assert!(serde_json::from_str::<SensorSample>(payload).is_err());
    }

    #[test]
    fn test_reject_stringly_numbers() {
        let payload = r#"{
            "accelerometer": {"x": "1.0", "y": 2.0, "z": 3.0},
            "gps": {"latitude": 0.0, "longitude": 0.0},
            "timestamp": "2024-02-27T10:00:00"
        }"#;
        assert!(serde_json::from_str::<SensorSample>(payload).is_err());
    }

    #[test]
    fn test_serialize_timestamp_rfc3339() {
        let sample: SensorSample = serde_json::from_str(PAYLOAD).unwrap();
        let json = serde_json::to_value(sample).unwrap();
        assert_eq!(json["timestamp"], "2024-02-27T10:00:00.123456Z");
    }
}
