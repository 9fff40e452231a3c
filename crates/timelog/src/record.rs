//! Decoded time log records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use taskdata_common::PositionStatus;

/// Position of one record, as far as the header provides it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Position {
    /// Degrees north
    pub lat: Option<f64>,
    /// Degrees east
    pub lon: Option<f64>,
    /// Metres
    pub altitude: Option<f64>,
    pub status: Option<PositionStatus>,
    pub pdop: Option<f64>,
    pub hdop: Option<f64>,
    pub satellites: Option<u8>,
    pub gps_time: Option<DateTime<Utc>>,
}

impl Position {
    /// A position can be placed on a map: both coordinates present, finite
    /// and within range, and a status (if any) that reports a usable fix.
    pub fn is_valid(&self) -> bool {
        let (Some(lat), Some(lon)) = (self.lat, self.lon) else {
            return false;
        };
        if !lat.is_finite() || !lon.is_finite() {
            return false;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return false;
        }
        self.status.map_or(true, |status| status.is_usable())
    }

    /// `(lon, lat)` of a valid position.
    pub fn lon_lat(&self) -> Option<(f64, f64)> {
        if self.is_valid() {
            Some((self.lon?, self.lat?))
        } else {
            None
        }
    }
}

/// One timestamped, positioned sample of a device's logged values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeLogRecord {
    pub time: DateTime<Utc>,
    pub position: Position,
    /// Raw values keyed by value key.
    pub values: BTreeMap<String, f64>,
}

impl TimeLogRecord {
    pub fn is_valid(&self) -> bool {
        self.position.is_valid()
    }

    pub fn value(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }
}
