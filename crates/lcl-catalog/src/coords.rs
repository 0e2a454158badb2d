use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Stored in both coordinate fields when a listing has no location.
pub const COORDINATE_UNSET: i32 = i32::MAX;

/// Fixed-point values at or beyond this magnitude mean "unset".
pub const COORDINATE_LIMIT: i64 = 2_000_000_000;

/// Fixed-point scale: degrees × 10^7.
pub const COORDINATE_SCALE: f64 = 10_000_000.0;

/// A location in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Validate degrees and build a location.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CodecError> {
        check_degrees(latitude, 90.0)?;
        check_degrees(longitude, 180.0)?;
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Read fixed-point fields. Either axis out of range yields `None`.
    pub fn from_fixed(latitude: i32, longitude: i32) -> Option<Self> {
        if !is_set(latitude) || !is_set(longitude) {
            return None;
        }
        Some(Self {
            latitude: f64::from(latitude) / COORDINATE_SCALE,
            longitude: f64::from(longitude) / COORDINATE_SCALE,
        })
    }

    /// Fixed-point `(latitude, longitude)`.
    pub fn to_fixed(&self) -> (i32, i32) {
        (to_fixed(self.latitude), to_fixed(self.longitude))
    }
}

fn is_set(value: i32) -> bool {
    i64::from(value).abs() < COORDINATE_LIMIT
}

// |degrees| <= 180 keeps the product well inside i32.
fn to_fixed(degrees: f64) -> i32 {
    (degrees * COORDINATE_SCALE).round() as i32
}

fn check_degrees(value: f64, limit: f64) -> Result<(), CodecError> {
    if !value.is_finite() || value.abs() > limit {
        return Err(CodecError::InvalidCoordinate { value, limit });
    }
    Ok(())
}
