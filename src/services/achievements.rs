// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Achievement evaluation over the completed-session history.
//!
//! Every run recomputes all aggregates from scratch; the only state carried
//! between runs is the set of already-unlocked ids (with their dates), which
//! keeps unlocking monotonic and idempotent.

use crate::config::DistanceUnit;
use crate::db::user_store::UnlockedAchievements;
use crate::models::{Achievement, AchievementCategory, AchievementDefinition, RunSession};
use crate::time_utils::local_date;
use chrono::{DateTime, Days, NaiveDate, Utc};
use std::collections::HashSet;

/// Longest streak the backward scan will count.
pub const MAX_STREAK_DAYS: u32 = 365;

/// Aggregates over a session history, in the configured unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryAggregates {
    pub best_distance: f64,
    /// Fastest average pace, minutes per unit
    pub best_pace: Option<f64>,
    pub day_streak: u32,
    pub session_count: u32,
    pub lifetime_distance: f64,
}

impl HistoryAggregates {
    /// Compute aggregates over finalized sessions in `history`.
    pub fn from_history(
        history: &[RunSession],
        unit: DistanceUnit,
        today: NaiveDate,
        utc_offset_minutes: i32,
    ) -> Self {
        let mut aggregates = Self::default();
        let mut active_days = HashSet::new();

        for session in history.iter().filter(|s| s.is_finalized()) {
            let distance = session.distance_in(unit);
            aggregates.session_count += 1;
            aggregates.lifetime_distance += distance;
            aggregates.best_distance = aggregates.best_distance.max(distance);
            if distance > 0.0 && session.average_pace > 0.0 {
                aggregates.best_pace = Some(match aggregates.best_pace {
                    Some(best) => best.min(session.average_pace),
                    None => session.average_pace,
                });
            }
            active_days.insert(local_date(session.start_time, utc_offset_minutes));
        }

        aggregates.day_streak = day_streak(&active_days, today);
        aggregates
    }

    fn value_for(&self, category: AchievementCategory) -> f64 {
        match category {
            AchievementCategory::Distance => self.best_distance,
            AchievementCategory::Pace => self.best_pace.unwrap_or(0.0),
            AchievementCategory::Streak => f64::from(self.day_streak),
            AchievementCategory::Sessions => f64::from(self.session_count),
            AchievementCategory::Lifetime => self.lifetime_distance,
        }
    }
}

/// Count consecutive days with activity, scanning back from `today`.
///
/// Stops at the first day without activity, or after [`MAX_STREAK_DAYS`].
pub fn day_streak(active_days: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = today;
    while streak < MAX_STREAK_DAYS && active_days.contains(&day) {
        streak += 1;
        match day.checked_sub_days(Days::new(1)) {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

/// Whether `current` meets `target` for the category, and how close it is.
fn progress_for(category: AchievementCategory, current: f64, target: f64) -> (bool, f64) {
    if category.lower_is_better() {
        if current <= 0.0 {
            return (false, 0.0);
        }
        let met = current <= target;
        (met, (target / current).min(1.0))
    } else {
        if target <= 0.0 {
            return (true, 1.0);
        }
        let met = current >= target;
        (met, (current / target).clamp(0.0, 1.0))
    }
}

/// Inputs that do not come from the history itself.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext {
    pub unit: DistanceUnit,
    pub today: NaiveDate,
    pub utc_offset_minutes: i32,
    /// Timestamp given to achievements unlocked by this run
    pub now: DateTime<Utc>,
}

/// Result of one evaluator run.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub aggregates: HistoryAggregates,
    /// Every defined achievement with its current state
    pub achievements: Vec<Achievement>,
    /// Achievements that crossed their target for the first time in this run
    pub newly_unlocked: Vec<Achievement>,
}

impl Evaluation {
    /// Unlock dates to persist for the next run.
    pub fn unlocked(&self) -> UnlockedAchievements {
        self.achievements
            .iter()
            .filter_map(|a| a.unlocked_date.map(|date| (a.id.clone(), date)))
            .collect()
    }
}

/// Evaluate all `definitions` against `history`.
///
/// `previously_unlocked` holds ids unlocked by earlier runs; they stay
/// unlocked with their first unlock date regardless of the history.
pub fn evaluate(
    definitions: &[AchievementDefinition],
    history: &[RunSession],
    previously_unlocked: &UnlockedAchievements,
    ctx: &EvaluationContext,
) -> Evaluation {
    let aggregates =
        HistoryAggregates::from_history(history, ctx.unit, ctx.today, ctx.utc_offset_minutes);

    let mut achievements = Vec::with_capacity(definitions.len());
    let mut newly_unlocked = Vec::new();

    for def in definitions {
        let current = aggregates.value_for(def.category);
        let (met, progress) = progress_for(def.category, current, def.target);

        let (is_unlocked, unlocked_date) = match previously_unlocked.get(&def.id) {
            Some(date) => (true, Some(*date)),
            None if met => (true, Some(ctx.now)),
            None => (false, None),
        };

        let achievement = Achievement {
            id: def.id.clone(),
            title: def.title.clone(),
            category: def.category,
            target: def.target,
            current,
            progress,
            is_unlocked,
            unlocked_date,
        };

        if is_unlocked && !previously_unlocked.contains_key(&def.id) {
            tracing::info!(achievement = %def.id, current, "Achievement unlocked");
            newly_unlocked.push(achievement.clone());
        }
        achievements.push(achievement);
    }

    Evaluation {
        aggregates,
        achievements,
        newly_unlocked,
    }
}
