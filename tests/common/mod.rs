// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, Duration, TimeZone, Utc};
use futures_util::future::BoxFuture;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use stride_tracker::config::Config;
use stride_tracker::db::{KeyValueStore, MemoryStore};
use stride_tracker::models::{Coordinate, LocationFix, RunSession};
use stride_tracker::services::{
    ManualLocationService, Notification, NotificationSink, SessionUploader, SyncError,
};
use stride_tracker::services::notifications::NotifyError;
use stride_tracker::time_utils::ManualClock;
use stride_tracker::{AppState, Collaborators};

/// Metres per degree of latitude on the haversine sphere.
#[allow(dead_code)]
pub const METERS_PER_DEGREE: f64 = 111_194.93;

/// A fixed Saturday-morning start time.
#[allow(dead_code)]
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap()
}

/// Fix `meters_north` of the origin, `secs` after `t0()`.
#[allow(dead_code)]
pub fn fix_at(meters_north: f64, secs: i64, speed_mps: f64) -> LocationFix {
    let at = t0() + Duration::seconds(secs);
    LocationFix::new(
        Coordinate::new(37.4 + meters_north / METERS_PER_DEGREE, -122.1),
        at.timestamp_millis(),
        speed_mps,
    )
}

/// A steady run due north: one fix every `interval_secs`, `step_m` apart.
#[allow(dead_code)]
pub fn steady_run(count: usize, step_m: f64, interval_secs: i64) -> Vec<LocationFix> {
    let speed = step_m / interval_secs as f64;
    (0..count)
        .map(|i| fix_at(i as f64 * step_m, i as i64 * interval_secs, speed))
        .collect()
}

/// Notification sink that remembers everything it receives.
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
    fail: AtomicBool,
}

#[allow(dead_code)]
impl RecordingNotifier {
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn received(&self) -> Vec<Notification> {
        self.received.lock().unwrap().clone()
    }

    pub fn unlocked_ids(&self) -> Vec<String> {
        self.received()
            .into_iter()
            .filter_map(|n| match n {
                Notification::AchievementUnlocked { id, .. } => Some(id),
                _ => None,
            })
            .collect()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError("sink offline".to_string()));
        }
        self.received.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Uploader whose availability can be switched on and off.
#[derive(Default)]
#[allow(dead_code)]
pub struct FlakyUploader {
    offline: AtomicBool,
    attempts: AtomicU32,
    uploaded: Mutex<Vec<u64>>,
}

#[allow(dead_code)]
impl FlakyUploader {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn uploaded(&self) -> Vec<u64> {
        self.uploaded.lock().unwrap().clone()
    }
}

impl SessionUploader for FlakyUploader {
    fn upload<'a>(&'a self, session: &'a RunSession) -> BoxFuture<'a, Result<(), SyncError>> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(SyncError("network unreachable".to_string()));
            }
            self.uploaded.lock().unwrap().push(session.id);
            Ok(())
        })
    }
}

/// A fully wired tracker over in-memory collaborators.
#[allow(dead_code)]
pub struct Harness {
    pub state: AppState,
    pub kv: Arc<dyn KeyValueStore>,
    pub clock: ManualClock,
    pub location: Arc<ManualLocationService>,
    pub notifier: Arc<RecordingNotifier>,
    pub uploader: Arc<FlakyUploader>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        Self::build(config, Arc::new(MemoryStore::new()), "runner")
    }

    /// Build over an existing store, e.g. to simulate an app restart.
    pub fn build(config: Config, kv: Arc<dyn KeyValueStore>, user_id: &str) -> Self {
        let clock = ManualClock::new(t0());
        let location = Arc::new(ManualLocationService::new(true));
        let notifier = Arc::new(RecordingNotifier::default());
        let uploader = Arc::new(FlakyUploader::default());
        let state = AppState::start(
            config,
            kv.clone(),
            user_id,
            Collaborators {
                clock: Arc::new(clock.clone()),
                location: location.clone(),
                notifier: notifier.clone(),
                uploader: uploader.clone(),
            },
        );
        Self {
            state,
            kv,
            clock,
            location,
            notifier,
            uploader,
        }
    }

    /// Deliver fixes in order, moving the clock to each fix's timestamp.
    pub async fn feed(&self, fixes: &[LocationFix]) {
        for fix in fixes {
            self.clock
                .set(stride_tracker::time_utils::from_millis(fix.timestamp_ms));
            self.location.push(*fix).await;
        }
    }

    /// Move the clock to `secs` after `t0()`.
    pub fn at(&self, secs: i64) {
        self.clock.set(t0() + Duration::seconds(secs));
    }
}

/// Default config with a fast tick for tests.
#[allow(dead_code)]
pub fn test_config() -> Config {
    Config {
        tick_interval_ms: 20,
        ..Config::default()
    }
}

/// Poll `condition` until it holds or a second has passed.
#[allow(dead_code)]
pub async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    condition()
}
