// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rejection of noisy, stale and teleporting location fixes.

use crate::config::FilterConfig;
use crate::models::LocationFix;
use std::fmt;

/// Why a fix was dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    /// Arrived sooner than `min_interval_secs` after the last accepted fix
    TooSoon { elapsed_secs: f64 },
    /// Moved less than `min_distance_meters`
    TooClose { distance_meters: f64 },
    /// Reported speed outside the accepted range
    SpeedOutOfRange { speed_mps: f64 },
    /// Moved far more than the reported speed allows
    Teleport { ratio: f64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::TooSoon { elapsed_secs } => write!(f, "too soon ({elapsed_secs:.2}s)"),
            RejectReason::TooClose { distance_meters } => {
                write!(f, "too close ({distance_meters:.2}m)")
            }
            RejectReason::SpeedOutOfRange { speed_mps } => {
                write!(f, "speed out of range ({speed_mps:.2}m/s)")
            }
            RejectReason::Teleport { ratio } => write!(f, "teleport (ratio {ratio:.1})"),
        }
    }
}

/// Outcome of checking one fix against the last accepted fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixDecision {
    /// `distance_meters` is the displacement from the previous accepted fix
    /// (0 for the first fix)
    Accept { distance_meters: f64 },
    Reject(RejectReason),
}

impl FixDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FixDecision::Accept { .. })
    }
}

/// Decide whether `fix` should be accepted given the last accepted fix.
///
/// The first fix of a session has nothing to compare against and is always
/// accepted.
pub fn check_fix(
    config: &FilterConfig,
    last: Option<&LocationFix>,
    fix: &LocationFix,
) -> FixDecision {
    let Some(last) = last else {
        return FixDecision::Accept {
            distance_meters: 0.0,
        };
    };

    let elapsed_secs = fix.secs_since(last);
    if elapsed_secs < config.min_interval_secs {
        return FixDecision::Reject(RejectReason::TooSoon { elapsed_secs });
    }

    let distance_meters = fix.distance_to(last);
    if distance_meters < config.min_distance_meters {
        return FixDecision::Reject(RejectReason::TooClose { distance_meters });
    }

    let speed_mps = fix.speed_mps;
    if !(config.min_speed_mps..=config.max_speed_mps).contains(&speed_mps) {
        return FixDecision::Reject(RejectReason::SpeedOutOfRange { speed_mps });
    }

    let expected_meters = speed_mps * elapsed_secs;
    if expected_meters > 0.0 {
        let ratio = distance_meters / expected_meters;
        if ratio > config.max_distance_ratio {
            return FixDecision::Reject(RejectReason::Teleport { ratio });
        }
    }

    FixDecision::Accept { distance_meters }
}

/// Stateful filter remembering the last accepted fix.
#[derive(Debug, Clone)]
pub struct FixFilter {
    config: FilterConfig,
    last_accepted: Option<LocationFix>,
}

impl FixFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            last_accepted: None,
        }
    }

    /// Check `fix` and, if accepted, make it the new reference.
    ///
    /// Rejected fixes are dropped silently and leave the reference unchanged.
    pub fn offer(&mut self, fix: &LocationFix) -> FixDecision {
        let decision = check_fix(&self.config, self.last_accepted.as_ref(), fix);
        match decision {
            FixDecision::Accept { .. } => self.last_accepted = Some(*fix),
            FixDecision::Reject(reason) => {
                tracing::debug!(
                    timestamp_ms = fix.timestamp_ms,
                    reason = %reason,
                    "Fix rejected"
                );
            }
        }
        decision
    }

    pub fn last_accepted(&self) -> Option<&LocationFix> {
        self.last_accepted.as_ref()
    }

    /// Forget the reference fix (new session).
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}
