// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route polyline recording.
//!
//! Runs its own, coarser inclusion test on accepted fixes so the drawn path
//! stays sparse while the distance accumulator still sees every fix.

use crate::config::RouteConfig;
use crate::models::{Coordinate, LocationFix};

#[derive(Debug, Clone)]
pub struct RouteRecorder {
    config: RouteConfig,
    points: Vec<Coordinate>,
    last: Option<LocationFix>,
}

impl RouteRecorder {
    pub fn new(config: RouteConfig) -> Self {
        Self {
            config,
            points: Vec::new(),
            last: None,
        }
    }

    /// Append the fix as a vertex if it is far enough from the previous
    /// vertex in both space and time. Returns `true` if appended.
    pub fn offer(&mut self, fix: &LocationFix) -> bool {
        if let Some(last) = &self.last {
            let far_enough = fix.distance_to(last) > self.config.min_distance_meters;
            let late_enough = fix.secs_since(last) > self.config.min_interval_secs;
            if !(far_enough && late_enough) {
                return false;
            }
        }
        self.points.push(fix.coordinate);
        self.last = Some(*fix);
        true
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn reset(&mut self) {
        self.points.clear();
        self.last = None;
    }
}
