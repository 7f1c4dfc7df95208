// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Raw location samples as delivered by the location service.

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// geo points are (x = longitude, y = latitude).
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// Great-circle distance in metres.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        Haversine.distance(self.to_point(), other.to_point())
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(c: Coordinate) -> Self {
        geo::Coord {
            x: c.longitude,
            y: c.latitude,
        }
    }
}

/// One geolocation sample. Transient: never persisted on its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    /// Unix timestamp (milliseconds)
    pub timestamp_ms: i64,
    /// Device-reported instantaneous speed (m/s)
    pub speed_mps: f64,
    /// Device-reported horizontal accuracy radius (metres)
    pub horizontal_accuracy: f64,
}

impl LocationFix {
    pub fn new(coordinate: Coordinate, timestamp_ms: i64, speed_mps: f64) -> Self {
        Self {
            coordinate,
            timestamp_ms,
            speed_mps,
            horizontal_accuracy: 5.0,
        }
    }

    /// Seconds from `earlier` to this fix. Negative if out of order.
    pub fn secs_since(&self, earlier: &LocationFix) -> f64 {
        (self.timestamp_ms - earlier.timestamp_ms) as f64 / 1000.0
    }

    pub fn distance_to(&self, other: &LocationFix) -> f64 {
        self.coordinate.distance_to(&other.coordinate)
    }
}
