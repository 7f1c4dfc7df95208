// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run session record and live snapshot models.

use crate::config::DistanceUnit;
use crate::models::Coordinate;
use chrono::{DateTime, Utc};
use geo::LineString;
use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One tracked activity from start to finish.
///
/// Mutated on every tick while live; once `end_time` is set it is never
/// modified again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RunSession {
    /// Session ID (start time in Unix milliseconds)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    /// Minutes per distance unit (0 until known)
    pub average_pace: f64,
    /// Units per hour, from total distance over elapsed time
    pub average_speed: f64,
    /// Peak reported speed, units per hour
    pub max_speed: f64,
    /// Recorded polyline vertices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route: Vec<Coordinate>,
    pub is_active: bool,
}

impl RunSession {
    /// Fresh, active session starting at `start_time`.
    pub fn begin(start_time: DateTime<Utc>) -> Self {
        Self {
            id: start_time.timestamp_millis().max(0) as u64,
            start_time,
            end_time: None,
            distance_meters: 0.0,
            duration_seconds: 0.0,
            average_pace: 0.0,
            average_speed: 0.0,
            max_speed: 0.0,
            route: Vec::new(),
            is_active: true,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn distance_in(&self, unit: DistanceUnit) -> f64 {
        unit.from_meters(self.distance_meters)
    }

    /// Copy of this session without its route.
    pub fn without_route(&self) -> Self {
        Self {
            route: Vec::new(),
            ..self.clone()
        }
    }

    pub fn route_line(&self) -> LineString<f64> {
        self.route.iter().copied().map(geo::Coord::from).collect()
    }

    /// Route as an encoded polyline (precision 5).
    pub fn encoded_route(&self) -> Result<String, String> {
        polyline::encode_coordinates(self.route_line(), 5).map_err(|e| e.to_string())
    }

    /// Route as a GeoJSON `LineString` geometry.
    pub fn route_geojson(&self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::from(&self.route_line()))
    }
}

/// Lifecycle state of the session machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum SessionPhase {
    #[default]
    Idle,
    Running,
    Paused,
    Finished,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Running => "running",
            SessionPhase::Paused => "paused",
            SessionPhase::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Live view of the tracker published on every tick and transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub session: Option<RunSession>,
    /// Latest accepted reported speed, units per hour
    pub current_speed: f64,
    /// Moving average of recent reported speeds, units per hour
    pub smoothed_speed: f64,
    /// Minutes per unit at the current speed
    pub current_pace: f64,
}
