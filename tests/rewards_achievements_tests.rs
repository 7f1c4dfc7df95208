// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reward and achievement regression tests.
//!
//! IMPORTANT: If these fail, users will see wrong gem balances or lose
//! (or re-receive) achievements.

use chrono::{DateTime, Days, Duration, NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use stride_tracker::config::{Config, DistanceUnit, RewardConfig};
use stride_tracker::db::user_store::UnlockedAchievements;
use stride_tracker::db::{MemoryStore, UserStore};
use stride_tracker::models::achievement::default_definitions;
use stride_tracker::models::{RewardLedger, RunSession};
use stride_tracker::services::achievements::{evaluate, EvaluationContext, HistoryAggregates};
use stride_tracker::services::rewards::{award, calculate_reward};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 20).unwrap()
}

fn noon(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
}

fn days_ago(n: u64) -> NaiveDate {
    today().checked_sub_days(Days::new(n)).unwrap()
}

/// A finished session on `day` covering `miles` at a 9 min/mile pace.
fn run_on(day: NaiveDate, miles: f64) -> RunSession {
    let start = noon(day);
    let mut session = RunSession::begin(start);
    session.distance_meters = miles * 1609.34;
    session.duration_seconds = miles * 9.0 * 60.0;
    session.average_speed = 60.0 / 9.0;
    session.average_pace = 9.0;
    session.end_time = Some(start + Duration::seconds(session.duration_seconds as i64));
    session.is_active = false;
    session
}

fn ctx_at(now: DateTime<Utc>) -> EvaluationContext {
    EvaluationContext {
        unit: DistanceUnit::Miles,
        today: now.date_naive(),
        utc_offset_minutes: 0,
        now,
    }
}

// ─── Rewards ─────────────────────────────────────────────────────

#[test]
fn test_one_mile_at_eight_with_streak_is_eighteen_gems() {
    let mut ledger = RewardLedger {
        total_gems: 40,
        gems_earned_today: 12,
        last_reward_date: Some(days_ago(1)),
        ..RewardLedger::default()
    };
    let distance = DistanceUnit::Miles.from_meters(1609.34);

    let preview = calculate_reward(&RewardConfig::default(), distance, 8.0, &ledger, today());
    let breakdown = award(&RewardConfig::default(), distance, 8.0, &mut ledger, today());

    assert_eq!(preview, breakdown);
    assert_eq!(breakdown.total(), 18);
    assert_eq!(ledger.total_gems, 58);
    // Yesterday's 12 were reset before crediting
    assert_eq!(ledger.gems_earned_today, 18);
    assert_eq!(ledger.last_reward_date, Some(today()));
}

#[test]
fn test_reward_is_deterministic() {
    let ledger = RewardLedger {
        last_reward_date: Some(days_ago(1)),
        ..RewardLedger::default()
    };
    let config = RewardConfig::default();

    let a = calculate_reward(&config, 3.2, 9.5, &ledger, today());
    let b = calculate_reward(&config, 3.2, 9.5, &ledger, today());

    assert_eq!(a, b);
    assert_eq!(a.total(), 10 + 3 + 3 + 5);
}

#[test]
fn test_spend_without_balance_does_not_mutate() {
    let mut ledger = RewardLedger {
        total_gems: 9,
        gems_earned_today: 9,
        last_reward_date: Some(today()),
        ..RewardLedger::default()
    };
    let before = ledger.clone();

    assert!(!ledger.spend(10));
    assert_eq!(ledger, before);

    assert!(ledger.spend(9));
    assert_eq!(ledger.total_gems, 0);
}

// ─── Achievements ────────────────────────────────────────────────

#[test]
fn test_streak_with_gap() {
    let history: Vec<RunSession> = [0, 1, 2, 4]
        .into_iter()
        .map(|n| run_on(days_ago(n), 1.0))
        .collect();

    let aggregates = HistoryAggregates::from_history(&history, DistanceUnit::Miles, today(), 0);

    assert_eq!(aggregates.day_streak, 3);
    assert_eq!(aggregates.session_count, 4);
}

#[test]
fn test_streak_uses_local_calendar_day() {
    // 23:30 UTC is already the next day at UTC+2
    let late = Utc.with_ymd_and_hms(2024, 6, 19, 23, 30, 0).unwrap();
    let mut session = run_on(days_ago(1), 1.0);
    session.id = late.timestamp_millis() as u64;
    session.start_time = late;

    let utc = HistoryAggregates::from_history(&[session.clone()], DistanceUnit::Miles, today(), 0);
    let plus_two =
        HistoryAggregates::from_history(&[session], DistanceUnit::Miles, today(), 120);

    assert_eq!(utc.day_streak, 0);
    assert_eq!(plus_two.day_streak, 1);
}

#[test]
fn test_unlocks_are_monotonic_over_superset_history() {
    let definitions = default_definitions();
    let first_history = vec![run_on(days_ago(1), 1.5)];
    let first = evaluate(
        &definitions,
        &first_history,
        &UnlockedAchievements::new(),
        &ctx_at(noon(days_ago(1))),
    );
    let unlocked = first.unlocked();
    assert!(unlocked.contains_key("first_run"));
    assert!(unlocked.contains_key("one_unit"));

    let mut superset = first_history.clone();
    superset.insert(0, run_on(today(), 0.3));
    let second = evaluate(&definitions, &superset, &unlocked, &ctx_at(noon(today())));

    for (id, date) in &unlocked {
        let achievement = second.achievements.iter().find(|a| &a.id == id).unwrap();
        assert!(achievement.is_unlocked, "{} was re-locked", id);
        assert_eq!(achievement.unlocked_date, Some(*date), "{} date changed", id);
    }
    assert!(second.newly_unlocked.iter().all(|a| !unlocked.contains_key(&a.id)));
}

#[test]
fn test_unlock_survives_history_that_no_longer_qualifies() {
    let definitions = default_definitions();
    let mut unlocked = UnlockedAchievements::new();
    let date = noon(days_ago(30));
    unlocked.insert("half_marathon".to_string(), date);

    let evaluation = evaluate(
        &definitions,
        &[run_on(today(), 2.0)],
        &unlocked,
        &ctx_at(noon(today())),
    );
    let half = evaluation
        .achievements
        .iter()
        .find(|a| a.id == "half_marathon")
        .unwrap();

    assert!(half.is_unlocked);
    assert_eq!(half.unlocked_date, Some(date));
    assert!((half.current - 2.0).abs() < 1e-9);
    assert!(half.progress < 1.0);
}

#[test]
fn test_evaluation_is_idempotent() {
    let definitions = default_definitions();
    let history: Vec<RunSession> = (0..3).map(|n| run_on(days_ago(n), 2.0)).collect();
    let ctx = ctx_at(noon(today()));

    let first = evaluate(&definitions, &history, &UnlockedAchievements::new(), &ctx);
    let second = evaluate(&definitions, &history, &first.unlocked(), &ctx);

    assert!(!first.newly_unlocked.is_empty());
    assert!(second.newly_unlocked.is_empty());
    assert_eq!(first.achievements, second.achievements);
    assert!(first.unlocked().contains_key("streak_three"));
}

#[test]
fn test_progress_is_clamped_and_pace_is_lower_better() {
    let definitions = default_definitions();
    let evaluation = evaluate(
        &definitions,
        &[run_on(today(), 0.5)],
        &UnlockedAchievements::new(),
        &ctx_at(noon(today())),
    );

    for achievement in &evaluation.achievements {
        assert!((0.0..=1.0).contains(&achievement.progress), "{}", achievement.id);
    }
    let pace_ten = evaluation.achievements.iter().find(|a| a.id == "pace_ten").unwrap();
    let pace_eight = evaluation.achievements.iter().find(|a| a.id == "pace_eight").unwrap();
    assert!(pace_ten.is_unlocked);
    assert!(!pace_eight.is_unlocked);
    assert!((pace_eight.progress - 8.0 / 9.0).abs() < 1e-9);
}

#[test]
fn test_active_sessions_are_ignored() {
    let mut active = run_on(today(), 5.0);
    active.end_time = None;
    active.is_active = true;

    let aggregates = HistoryAggregates::from_history(&[active], DistanceUnit::Miles, today(), 0);

    assert_eq!(aggregates, HistoryAggregates::default());
}

#[test]
fn test_aggregates_cover_sessions_beyond_recent_limit() {
    let config = Config::default();
    let store = UserStore::new(Arc::new(MemoryStore::new()), "marathoner").with_config(&config);
    // 60 consecutive days, oldest first, 1.9 miles each
    for n in (0..60).rev() {
        store.record_session(&run_on(days_ago(n), 1.9)).unwrap();
    }

    let history = store.load_history();
    let evaluation = evaluate(
        &default_definitions(),
        &history,
        &UnlockedAchievements::new(),
        &ctx_at(noon(today())),
    );

    assert_eq!(store.load_sessions().len(), config.recent_sessions_limit);
    assert_eq!(evaluation.aggregates.session_count, 60);
    assert_eq!(evaluation.aggregates.day_streak, 60);
    assert!((evaluation.aggregates.lifetime_distance - 114.0).abs() < 1e-6);
    assert!(evaluation.unlocked().contains_key("lifetime_hundred"));
}
