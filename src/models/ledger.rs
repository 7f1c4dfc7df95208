// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user gem balance and daily progress.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Gem balance and daily counters for one user.
///
/// Stored at: `users/{user_id}/ledger`
///
/// Daily counters are reset lazily: the first write on a new calendar day
/// zeroes them before applying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RewardLedger {
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_gems: u64,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub gems_earned_today: u64,
    /// User-calendar date of the last award
    #[serde(default)]
    pub last_reward_date: Option<NaiveDate>,
    #[serde(default)]
    pub daily_seconds_completed: f64,
    #[serde(default = "default_daily_minutes_goal")]
    pub daily_minutes_goal: u32,
    /// Day the daily counters belong to (falls back to `last_reward_date`)
    #[serde(default)]
    pub counters_date: Option<NaiveDate>,
}

fn default_daily_minutes_goal() -> u32 {
    30
}

impl Default for RewardLedger {
    fn default() -> Self {
        Self {
            total_gems: 0,
            gems_earned_today: 0,
            last_reward_date: None,
            daily_seconds_completed: 0.0,
            daily_minutes_goal: default_daily_minutes_goal(),
            counters_date: None,
        }
    }
}

impl RewardLedger {
    pub fn with_goal(daily_minutes_goal: u32) -> Self {
        Self {
            daily_minutes_goal,
            ..Self::default()
        }
    }

    /// Zero the daily counters if they were last written before `today`.
    ///
    /// Returns `true` if a reset happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        let counters_date = self.counters_date.or(self.last_reward_date);
        if counters_date == Some(today) {
            return false;
        }
        self.gems_earned_today = 0;
        self.daily_seconds_completed = 0.0;
        self.counters_date = Some(today);
        true
    }

    /// Whether the last award was today or yesterday.
    pub fn streak_active(&self, today: NaiveDate) -> bool {
        match self.last_reward_date {
            Some(last) => last == today || today.checked_sub_days(Days::new(1)) == Some(last),
            None => false,
        }
    }

    /// Add an award, resetting the daily counters first on a new day.
    pub fn credit(&mut self, gems: u64, today: NaiveDate) {
        self.roll_over(today);
        self.total_gems = self.total_gems.saturating_add(gems);
        self.gems_earned_today = self.gems_earned_today.saturating_add(gems);
        self.last_reward_date = Some(today);
    }

    /// Deduct `amount` gems.
    ///
    /// Returns `false` and leaves the ledger untouched if the balance is
    /// insufficient.
    pub fn spend(&mut self, amount: u64) -> bool {
        match self.total_gems.checked_sub(amount) {
            Some(remaining) => {
                self.total_gems = remaining;
                true
            }
            None => false,
        }
    }

    /// Return gems without counting them as earned today.
    pub fn refund(&mut self, amount: u64) {
        self.total_gems = self.total_gems.saturating_add(amount);
    }

    /// Record active seconds toward today's goal.
    pub fn add_daily_seconds(&mut self, seconds: f64, today: NaiveDate) {
        self.roll_over(today);
        self.daily_seconds_completed += seconds.max(0.0);
    }

    /// Fraction of the daily goal completed, clamped to `[0, 1]`.
    pub fn daily_goal_progress(&self) -> f64 {
        let goal_secs = f64::from(self.daily_minutes_goal) * 60.0;
        if goal_secs <= 0.0 {
            return 1.0;
        }
        (self.daily_seconds_completed / goal_secs).clamp(0.0, 1.0)
    }
}
