// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Achievement definitions and their evaluated state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Which history aggregate an achievement measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum AchievementCategory {
    /// Longest single session, in units
    Distance,
    /// Fastest average pace of any session, minutes per unit (lower is better)
    Pace,
    /// Consecutive days with a completed session, ending today
    Streak,
    /// Number of completed sessions
    Sessions,
    /// Total distance over all sessions, in units
    Lifetime,
}

impl AchievementCategory {
    /// Pace is the only category where a smaller value is an improvement.
    pub fn lower_is_better(self) -> bool {
        matches!(self, AchievementCategory::Pace)
    }
}

/// Static description of an achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub title: String,
    pub category: AchievementCategory,
    pub target: f64,
}

impl AchievementDefinition {
    pub fn new(id: &str, title: &str, category: AchievementCategory, target: f64) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            category,
            target,
        }
    }
}

/// Built-in achievement catalogue.
pub fn default_definitions() -> Vec<AchievementDefinition> {
    use AchievementCategory::*;
    vec![
        AchievementDefinition::new("first_run", "First Steps", Sessions, 1.0),
        AchievementDefinition::new("ten_runs", "Regular", Sessions, 10.0),
        AchievementDefinition::new("fifty_runs", "Dedicated", Sessions, 50.0),
        AchievementDefinition::new("one_unit", "Going the Distance", Distance, 1.0),
        AchievementDefinition::new("five_units", "Five Strong", Distance, 5.0),
        AchievementDefinition::new("half_marathon", "Half Marathon", Distance, 13.1),
        AchievementDefinition::new("pace_ten", "Quick Feet", Pace, 10.0),
        AchievementDefinition::new("pace_eight", "Speed Demon", Pace, 8.0),
        AchievementDefinition::new("streak_three", "On a Roll", Streak, 3.0),
        AchievementDefinition::new("streak_seven", "Week Warrior", Streak, 7.0),
        AchievementDefinition::new("lifetime_fifty", "Fifty Club", Lifetime, 50.0),
        AchievementDefinition::new("lifetime_hundred", "Centurion", Lifetime, 100.0),
    ]
}

/// Evaluated state of one achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub category: AchievementCategory,
    pub target: f64,
    pub current: f64,
    /// In `[0, 1]`
    pub progress: f64,
    pub is_unlocked: bool,
    /// Set once, on the first unlock
    pub unlocked_date: Option<DateTime<Utc>>,
}
