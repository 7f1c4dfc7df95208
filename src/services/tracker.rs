// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session tracker actor.
//!
//! A single tokio task owns the [`SessionMachine`]. Commands arrive with
//! oneshot replies, fixes arrive on their own channel from the location
//! service, and a periodic tick refreshes the live session while running.
//! Every state change is published on a `watch` channel.

use crate::config::Config;
use crate::db::UserStore;
use crate::error::{Result, TrackerError};
use crate::models::{
    Achievement, AchievementDefinition, LocationFix, RewardLedger, RunSession, SessionSnapshot,
};
use crate::services::achievements::{self, EvaluationContext};
use crate::services::location::LocationService;
use crate::services::notifications::{dispatch, Notification, NotificationSink};
use crate::services::rewards::{self, RewardBreakdown};
use crate::services::session::SessionMachine;
use crate::services::sync::SyncService;
use crate::time_utils::{local_date, Clock};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

const COMMAND_BUFFER: usize = 16;
const FIX_BUFFER: usize = 256;

/// Collaborators the tracker is built from.
pub struct TrackerDeps {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub location: Arc<dyn LocationService>,
    pub store: UserStore,
    pub notifier: Arc<dyn NotificationSink>,
    pub sync: SyncService,
    pub definitions: Vec<AchievementDefinition>,
}

/// Everything produced by finishing a session.
#[derive(Debug, Clone)]
pub struct FinishOutcome {
    pub session: RunSession,
    pub reward: RewardBreakdown,
    /// Ledger after the award was credited
    pub ledger: RewardLedger,
    pub newly_unlocked: Vec<Achievement>,
    pub achievements: Vec<Achievement>,
}

enum Command {
    Start(oneshot::Sender<Result<RunSession>>),
    Pause(oneshot::Sender<Result<()>>),
    Resume(oneshot::Sender<Result<()>>),
    Stop(oneshot::Sender<Result<RunSession>>),
    Finish(oneshot::Sender<Result<FinishOutcome>>),
    Reset(oneshot::Sender<Result<()>>),
}

/// Cloneable front-end to a running tracker.
///
/// The tracker task exits once every handle has been dropped.
#[derive(Clone)]
pub struct TrackerHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl TrackerHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| TrackerError::TrackerClosed)?;
        rx.await.map_err(|_| TrackerError::TrackerClosed)?
    }

    /// Begin a session. Fails with [`TrackerError::PermissionDenied`] if
    /// location access has not been granted.
    pub async fn start(&self) -> Result<RunSession> {
        self.request(Command::Start).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.request(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.request(Command::Resume).await
    }

    /// Abandon the session. It is kept in history but earns nothing.
    pub async fn stop(&self) -> Result<RunSession> {
        self.request(Command::Stop).await
    }

    /// Complete the session: persist, reward, evaluate achievements, upload.
    pub async fn finish(&self) -> Result<FinishOutcome> {
        self.request(Command::Finish).await
    }

    /// Return to idle after a finished session.
    pub async fn reset(&self) -> Result<()> {
        self.request(Command::Reset).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

/// The actor owning one user's live session.
pub struct SessionTracker {
    machine: SessionMachine,
    deps: TrackerDeps,
    commands: mpsc::Receiver<Command>,
    fixes: mpsc::Receiver<LocationFix>,
    fix_tx: mpsc::Sender<LocationFix>,
    snapshots: watch::Sender<SessionSnapshot>,
    ticker: Option<Interval>,
}

impl SessionTracker {
    /// Start the tracker task and return a handle to it.
    pub fn spawn(deps: TrackerDeps) -> TrackerHandle {
        let (command_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (fix_tx, fixes) = mpsc::channel(FIX_BUFFER);
        let (snapshots, snapshot_rx) = watch::channel(SessionSnapshot::default());

        let tracker = Self {
            machine: SessionMachine::new(deps.config.clone()),
            deps,
            commands,
            fixes,
            fix_tx,
            snapshots,
            ticker: None,
        };
        tokio::spawn(tracker.run());

        TrackerHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        }
    }

    async fn run(mut self) {
        tracing::debug!(user_id = %self.deps.store.user_id(), "Session tracker started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(fix) = self.fixes.recv() => self.on_fix(fix),
                _ = next_tick(&mut self.ticker) => self.on_tick(),
            }
        }
        self.deps.location.stop_updates();
        tracing::debug!(user_id = %self.deps.store.user_id(), "Session tracker stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Start(reply) => {
                let _ = reply.send(self.start());
            }
            Command::Pause(reply) => {
                self.drain_fixes();
                let now = self.deps.clock.now();
                let result = self.machine.pause(now);
                if result.is_ok() {
                    self.deps.location.stop_updates();
                    self.ticker = None;
                }
                self.publish();
                let _ = reply.send(result);
            }
            Command::Resume(reply) => {
                let now = self.deps.clock.now();
                let result = self.machine.resume(now);
                if result.is_ok() {
                    self.deps.location.start_updates(self.fix_tx.clone());
                    self.ticker = Some(self.new_ticker());
                }
                self.publish();
                let _ = reply.send(result);
            }
            Command::Stop(reply) => {
                let _ = reply.send(self.stop());
            }
            Command::Finish(reply) => {
                let _ = reply.send(self.finish());
            }
            Command::Reset(reply) => {
                let result = self.machine.reset();
                self.publish();
                let _ = reply.send(result);
            }
        }
    }

    fn start(&mut self) -> Result<RunSession> {
        let now = self.deps.clock.now();
        let granted = self.deps.location.permission_granted();
        let session = self.machine.start(now, granted)?.clone();

        // Drop anything left over from the previous session
        while self.fixes.try_recv().is_ok() {}

        self.deps.location.start_updates(self.fix_tx.clone());
        self.ticker = Some(self.new_ticker());
        self.publish();
        Ok(session)
    }

    fn stop(&mut self) -> Result<RunSession> {
        self.drain_fixes();
        let session = self.machine.stop(self.deps.clock.now())?;
        self.end_updates();

        if let Err(e) = self.deps.store.record_session(&session) {
            tracing::warn!(session_id = session.id, error = %e, "Failed to record stopped session");
        }
        self.submit_upload(&session);
        self.publish();
        Ok(session)
    }

    fn finish(&mut self) -> Result<FinishOutcome> {
        self.drain_fixes();
        let now = self.deps.clock.now();
        let session = self.machine.finish(now)?;
        self.end_updates();

        let config = &self.deps.config;
        let store = &self.deps.store;
        let today = local_date(now, config.utc_offset_minutes);

        if let Err(e) = store.record_session(&session) {
            tracing::warn!(session_id = session.id, error = %e, "Failed to record session");
        }
        let mut history = store.load_history();
        if !history.iter().any(|s| s.id == session.id) {
            history.insert(0, session.without_route());
        }

        let mut ledger = store.load_ledger();
        ledger.daily_minutes_goal = config.daily_minutes_goal;
        let reward = rewards::award(
            &config.rewards,
            session.distance_in(config.unit),
            session.average_speed,
            &mut ledger,
            today,
        );
        ledger.add_daily_seconds(session.duration_seconds, today);
        if let Err(e) = store.save_ledger(&ledger) {
            tracing::warn!(error = %e, "Failed to save reward ledger");
        }
        dispatch(
            self.deps.notifier.as_ref(),
            Notification::GoalProgress {
                seconds_completed: ledger.daily_seconds_completed,
                goal_seconds: config.daily_goal_secs(),
                fraction: ledger.daily_goal_progress(),
            },
        );

        let ctx = EvaluationContext {
            unit: config.unit,
            today,
            utc_offset_minutes: config.utc_offset_minutes,
            now,
        };
        let evaluation = achievements::evaluate(
            &self.deps.definitions,
            &history,
            &store.load_unlocked(),
            &ctx,
        );
        if !evaluation.newly_unlocked.is_empty() {
            if let Err(e) = store.save_unlocked(&evaluation.unlocked()) {
                tracing::warn!(error = %e, "Failed to save unlocked achievements");
            }
        }
        for achievement in &evaluation.newly_unlocked {
            dispatch(
                self.deps.notifier.as_ref(),
                Notification::AchievementUnlocked {
                    id: achievement.id.clone(),
                    title: achievement.title.clone(),
                },
            );
        }

        self.submit_upload(&session);
        self.publish();

        Ok(FinishOutcome {
            session,
            reward,
            ledger,
            newly_unlocked: evaluation.newly_unlocked,
            achievements: evaluation.achievements,
        })
    }

    fn on_fix(&mut self, fix: LocationFix) {
        if let Some(decision) = self.machine.ingest(&fix) {
            if decision.is_accepted() {
                self.publish();
            }
        }
    }

    fn on_tick(&mut self) {
        if self.machine.tick(self.deps.clock.now()).is_some() {
            self.publish();
        } else {
            self.ticker = None;
        }
    }

    /// Ingest fixes already queued before a transition takes effect.
    fn drain_fixes(&mut self) {
        while let Ok(fix) = self.fixes.try_recv() {
            self.machine.ingest(&fix);
        }
    }

    fn end_updates(&mut self) {
        self.deps.location.stop_updates();
        self.ticker = None;
    }

    fn submit_upload(&self, session: &RunSession) {
        let sync = self.deps.sync.clone();
        let session = session.clone();
        tokio::spawn(async move {
            sync.submit(session).await;
        });
    }

    fn new_ticker(&self) -> Interval {
        let period = self.deps.config.tick_interval();
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.machine.snapshot());
    }
}

/// Resolve on the next tick, or never when not running.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
