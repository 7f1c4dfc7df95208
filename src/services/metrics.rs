// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Distance and speed accumulation over accepted fixes.

use crate::config::{DistanceUnit, MetricsConfig};
use std::collections::VecDeque;

/// Running total of displacement between consecutive accepted fixes.
#[derive(Debug, Clone, Default)]
pub struct DistanceAccumulator {
    total_meters: f64,
    segments: usize,
}

impl DistanceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one displacement. Negative or non-finite values are ignored.
    pub fn add(&mut self, meters: f64) {
        if meters.is_finite() && meters > 0.0 {
            self.total_meters += meters;
            self.segments += 1;
        }
    }

    pub fn total_meters(&self) -> f64 {
        self.total_meters
    }

    pub fn segments(&self) -> usize {
        self.segments
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Minutes per unit at `speed` units/hour, or `previous` when too slow to be
/// meaningful.
pub fn pace_from_speed(speed_per_hour: f64, floor: f64, previous: f64) -> f64 {
    if speed_per_hour > floor {
        60.0 / speed_per_hour
    } else {
        previous
    }
}

/// Average speed in units/hour from total distance and elapsed seconds.
pub fn average_speed(distance_meters: f64, elapsed_secs: f64, unit: DistanceUnit) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    unit.from_meters(distance_meters) / (elapsed_secs / 3600.0)
}

/// Current, smoothed and peak speed tracking.
///
/// The moving average over the last few readings is informational only; the
/// session's authoritative average comes from [`average_speed`].
#[derive(Debug, Clone)]
pub struct SpeedEstimator {
    unit: DistanceUnit,
    pace_floor: f64,
    window: VecDeque<f64>,
    capacity: usize,
    current_mps: f64,
    peak_mps: f64,
    pace: f64,
}

impl SpeedEstimator {
    pub fn new(config: &MetricsConfig, unit: DistanceUnit) -> Self {
        let capacity = config.speed_window.max(1);
        Self {
            unit,
            pace_floor: config.pace_speed_floor,
            window: VecDeque::with_capacity(capacity),
            capacity,
            current_mps: 0.0,
            peak_mps: 0.0,
            pace: 0.0,
        }
    }

    /// Record the reported speed of a fix that passed the speed gate.
    pub fn record(&mut self, speed_mps: f64) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(speed_mps);
        self.current_mps = speed_mps;
        self.peak_mps = self.peak_mps.max(speed_mps);
        self.pace = pace_from_speed(self.current_speed(), self.pace_floor, self.pace);
    }

    /// Latest reported speed, units/hour.
    pub fn current_speed(&self) -> f64 {
        self.unit.per_hour_from_mps(self.current_mps)
    }

    /// Mean of the buffered readings, units/hour.
    pub fn smoothed_speed(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let mean = self.window.iter().sum::<f64>() / self.window.len() as f64;
        self.unit.per_hour_from_mps(mean)
    }

    pub fn peak_speed(&self) -> f64 {
        self.unit.per_hour_from_mps(self.peak_mps)
    }

    /// Instantaneous pace in minutes/unit (0 until the first usable reading).
    pub fn current_pace(&self) -> f64 {
        self.pace
    }

    pub fn pace_floor(&self) -> f64 {
        self.pace_floor
    }

    pub fn readings(&self) -> usize {
        self.window.len()
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.current_mps = 0.0;
        self.peak_mps = 0.0;
        self.pace = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_ignores_bad_values() {
        let mut acc = DistanceAccumulator::new();
        acc.add(10.0);
        acc.add(-5.0);
        acc.add(f64::NAN);
        acc.add(0.0);
        acc.add(2.5);

        assert_eq!(acc.total_meters(), 12.5);
        assert_eq!(acc.segments(), 2);
    }

    #[test]
    fn test_window_is_bounded() {
        let config = MetricsConfig {
            speed_window: 3,
            pace_speed_floor: 0.5,
        };
        let mut est = SpeedEstimator::new(&config, DistanceUnit::Kilometers);
        for speed in [1.0, 2.0, 3.0, 4.0, 5.0] {
            est.record(speed);
        }

        assert_eq!(est.readings(), 3);
        // mean of 3, 4, 5 m/s = 4 m/s = 14.4 km/h
        assert!((est.smoothed_speed() - 14.4).abs() < 1e-9);
        assert!((est.peak_speed() - 18.0).abs() < 1e-9);
        assert!((est.current_speed() - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_peak_never_decreases() {
        let mut est = SpeedEstimator::new(&MetricsConfig::default(), DistanceUnit::Miles);
        est.record(5.0);
        est.record(2.0);

        assert_eq!(est.peak_speed(), DistanceUnit::Miles.per_hour_from_mps(5.0));
    }

    #[test]
    fn test_pace_holds_below_floor() {
        let mut est = SpeedEstimator::new(&MetricsConfig::default(), DistanceUnit::Kilometers);
        // 2.5 m/s = 9 km/h -> 6.67 min/km
        est.record(2.5);
        let pace = est.current_pace();
        assert!((pace - 60.0 / 9.0).abs() < 1e-9);

        // 0.1 m/s = 0.36 km/h, under the floor: pace keeps its value
        est.record(0.1);
        assert_eq!(est.current_pace(), pace);
    }

    #[test]
    fn test_average_speed_and_pace_are_consistent() {
        // 5 km in 25 minutes = 12 km/h = 5 min/km
        let speed = average_speed(5000.0, 1500.0, DistanceUnit::Kilometers);
        assert!((speed - 12.0).abs() < 1e-9);
        assert!((pace_from_speed(speed, 0.5, 0.0) - 5.0).abs() < 1e-9);
        assert_eq!(average_speed(100.0, 0.0, DistanceUnit::Kilometers), 0.0);
    }
}
