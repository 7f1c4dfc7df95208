// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gem rewards for finished sessions.

use crate::config::RewardConfig;
use crate::models::RewardLedger;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Itemized gem award.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    pub base: u64,
    pub speed_bonus: u64,
    pub distance_bonus: u64,
    pub streak_bonus: u64,
}

impl RewardBreakdown {
    pub fn total(&self) -> u64 {
        self.base + self.speed_bonus + self.distance_bonus + self.streak_bonus
    }
}

/// Compute the award for a session without touching the ledger.
///
/// - `distance_units`: session distance in the configured unit
/// - `average_speed`: units/hour
/// - `ledger`: read for the streak check only
pub fn calculate_reward(
    config: &RewardConfig,
    distance_units: f64,
    average_speed: f64,
    ledger: &RewardLedger,
    today: NaiveDate,
) -> RewardBreakdown {
    let speed_over = (average_speed - config.speed_bonus_floor).max(0.0);
    let speed_bonus = (speed_over.min(config.speed_bonus_cap as f64)) as u64;

    let distance_bonus = if distance_units.is_finite() && distance_units > 0.0 {
        distance_units.floor() as u64
    } else {
        0
    };

    let streak_bonus = if ledger.streak_active(today) {
        config.streak_bonus
    } else {
        0
    };

    RewardBreakdown {
        base: config.base_gems,
        speed_bonus,
        distance_bonus,
        streak_bonus,
    }
}

/// Compute the award and credit it to `ledger`.
///
/// The streak is judged against the ledger as it was before this award; the
/// daily counters are reset before crediting if the day has changed.
pub fn award(
    config: &RewardConfig,
    distance_units: f64,
    average_speed: f64,
    ledger: &mut RewardLedger,
    today: NaiveDate,
) -> RewardBreakdown {
    let breakdown = calculate_reward(config, distance_units, average_speed, ledger, today);
    ledger.credit(breakdown.total(), today);
    tracing::info!(
        gems = breakdown.total(),
        speed_bonus = breakdown.speed_bonus,
        distance_bonus = breakdown.distance_bonus,
        streak_bonus = breakdown.streak_bonus,
        total_gems = ledger.total_gems,
        "Gems awarded"
    );
    breakdown
}
