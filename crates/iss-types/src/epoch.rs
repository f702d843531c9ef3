//! A single trajectory sample: timestamp, position, and velocity.
//!
//! On the wire an [`Epoch`] keeps the origin's field names so clients see
//! the same keys the OEM document uses:
//!
//! ```json
//! {
//!   "EPOCH": "2025-104T12:00:00.000Z",
//!   "X": {"value": -4215.1, "units": "km"},
//!   "Y": {"value": 3562.9, "units": "km"},
//!   "Z": {"value": 4175.8, "units": "km"},
//!   "X_DOT": {"value": -2.3085, "units": "km/s"},
//!   "Y_DOT": {"value": 4.5299, "units": "km/s"},
//!   "Z_DOT": {"value": 5.7341, "units": "km/s"}
//! }
//! ```
//!
//! Any additional fields carried by the source are kept in
//! [`Epoch::extra`] and flattened back into the same object.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::timestamp::Timestamp;

/// Unit of the position components.
pub const POSITION_UNITS: &str = "km";

/// Unit of the velocity components.
pub const VELOCITY_UNITS: &str = "km/s";

/// Three Cartesian components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vector3 {
    /// Build a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean magnitude, `sqrt(x^2 + y^2 + z^2)`.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// One timestamped state-vector sample.
///
/// Immutable once built. The store never edits an epoch in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EpochRecord", into = "EpochRecord")]
pub struct Epoch {
    /// When the sample was taken (UTC).
    pub timestamp: Timestamp,
    /// Position in km.
    pub position: Vector3,
    /// Velocity in km/s.
    pub velocity: Vector3,
    /// Source fields with no typed counterpart, passed through as-is.
    pub extra: BTreeMap<String, Value>,
}

impl Epoch {
    /// Build an epoch with no extra fields.
    pub const fn new(timestamp: Timestamp, position: Vector3, velocity: Vector3) -> Self {
        Self {
            timestamp,
            position,
            velocity,
            extra: BTreeMap::new(),
        }
    }

    /// Magnitude of the velocity vector in km/s.
    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }
}

/// A scalar with its unit annotation.
#[derive(Serialize, Deserialize)]
struct Quantity {
    value: f64,
    units: String,
}

impl Quantity {
    fn new(value: f64, units: &str) -> Self {
        Self {
            value,
            units: units.to_owned(),
        }
    }
}

/// Flat wire form of an [`Epoch`] using the origin's field names.
#[derive(Serialize, Deserialize)]
struct EpochRecord {
    #[serde(rename = "EPOCH")]
    epoch: Timestamp,
    #[serde(rename = "X")]
    x: Quantity,
    #[serde(rename = "Y")]
    y: Quantity,
    #[serde(rename = "Z")]
    z: Quantity,
    #[serde(rename = "X_DOT")]
    x_dot: Quantity,
    #[serde(rename = "Y_DOT")]
    y_dot: Quantity,
    #[serde(rename = "Z_DOT")]
    z_dot: Quantity,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl From<Epoch> for EpochRecord {
    fn from(epoch: Epoch) -> Self {
        let Epoch {
            timestamp,
            position,
            velocity,
            extra,
        } = epoch;
        Self {
            epoch: timestamp,
            x: Quantity::new(position.x, POSITION_UNITS),
            y: Quantity::new(position.y, POSITION_UNITS),
            z: Quantity::new(position.z, POSITION_UNITS),
            x_dot: Quantity::new(velocity.x, VELOCITY_UNITS),
            y_dot: Quantity::new(velocity.y, VELOCITY_UNITS),
            z_dot: Quantity::new(velocity.z, VELOCITY_UNITS),
            extra,
        }
    }
}

impl From<EpochRecord> for Epoch {
    fn from(record: EpochRecord) -> Self {
        Self {
            timestamp: record.epoch,
            position: Vector3::new(record.x.value, record.y.value, record.z.value),
            velocity: Vector3::new(record.x_dot.value, record.y_dot.value, record.z_dot.value),
            extra: record.extra,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::lossy_float_literal,
    clippy::excessive_precision
)]
mod tests {
    use super::*;

    fn sample() -> Epoch {
        Epoch::new(
            "2025-104T12:00:00.000Z".parse().unwrap(),
            Vector3::new(-4215.1, 3562.9, 4175.8),
            Vector3::new(-2.308_531_832_528_580_2, 4.529_965_028_925_209_6, 5.734_111_658_501_38),
        )
    }

    #[test]
    fn speed_is_velocity_norm() {
        let speed = sample().speed();
        let expected = (2.308_531_832_528_580_2_f64.powi(2)
            + 4.529_965_028_925_209_6_f64.powi(2)
            + 5.734_111_658_501_38_f64.powi(2))
        .sqrt();
        assert!((speed - expected).abs() < 1e-12);
        assert!((speed - 7.6186).abs() < 1e-4);
    }

    #[test]
    fn zero_vector_has_zero_norm() {
        assert!(Vector3::default().norm().abs() < f64::EPSILON);
    }

    #[test]
    fn serializes_with_origin_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["EPOCH"], "2025-104T12:00:00.000Z");
        assert_eq!(json["X"]["units"], "km");
        assert_eq!(json["Z_DOT"]["units"], "km/s");
        assert!((json["Y"]["value"].as_f64().unwrap() - 3562.9).abs() < 1e-9);
    }

    #[test]
    fn extra_fields_survive_serde() {
        let mut epoch = sample();
        epoch
            .extra
            .insert("MASS".to_owned(), serde_json::json!({"value": "473413.0", "units": "kg"}));
        let json = serde_json::to_value(&epoch).unwrap();
        assert_eq!(json["MASS"]["units"], "kg");

        let back: Epoch = serde_json::from_value(json).unwrap();
        assert_eq!(back, epoch);
    }

    #[test]
    fn rejects_record_with_bad_timestamp() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["EPOCH"] = serde_json::json!("2025-04-14T12:00:00Z");
        assert!(serde_json::from_value::<Epoch>(json).is_err());
    }
}
