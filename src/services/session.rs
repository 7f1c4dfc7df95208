// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session state machine.
//!
//! `Idle → Running → {Paused ⇄ Running} → Finished → (reset) Idle`
//!
//! Owns the fix filter, distance/speed accumulators and route recorder for
//! the lifetime of one session. Purely synchronous: the caller supplies
//! "now" so the same machine serves live tracking, replay and tests.

use crate::config::Config;
use crate::error::{Result, TrackerError};
use crate::models::{LocationFix, RunSession, SessionPhase, SessionSnapshot};
use crate::services::fix_filter::{FixDecision, FixFilter};
use crate::services::metrics::{average_speed, DistanceAccumulator, SpeedEstimator};
use crate::services::route::RouteRecorder;
use chrono::{DateTime, Utc};

pub struct SessionMachine {
    config: Config,
    phase: SessionPhase,
    session: Option<RunSession>,
    last_finished: Option<RunSession>,
    filter: FixFilter,
    distance: DistanceAccumulator,
    speed: SpeedEstimator,
    route: RouteRecorder,
    /// Seconds spent paused so far
    paused_secs: f64,
    paused_at: Option<DateTime<Utc>>,
}

impl SessionMachine {
    pub fn new(config: Config) -> Self {
        Self {
            filter: FixFilter::new(config.filter.clone()),
            distance: DistanceAccumulator::new(),
            speed: SpeedEstimator::new(&config.metrics, config.unit),
            route: RouteRecorder::new(config.route.clone()),
            config,
            phase: SessionPhase::Idle,
            session: None,
            last_finished: None,
            paused_secs: 0.0,
            paused_at: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The live session, if one is running or paused.
    pub fn session(&self) -> Option<&RunSession> {
        self.session.as_ref()
    }

    fn invalid(&self, action: &'static str) -> TrackerError {
        TrackerError::InvalidTransition {
            phase: self.phase,
            action,
        }
    }

    // ─── Transitions ─────────────────────────────────────────────

    /// Begin a new session. Only valid from `Idle`.
    pub fn start(&mut self, now: DateTime<Utc>, permission_granted: bool) -> Result<&RunSession> {
        if self.phase != SessionPhase::Idle {
            return Err(self.invalid("start"));
        }
        if !permission_granted {
            return Err(TrackerError::PermissionDenied);
        }

        self.clear_accumulators();
        self.last_finished = None;
        self.phase = SessionPhase::Running;
        let session = self.session.insert(RunSession::begin(now));
        tracing::info!(session_id = session.id, "Session started");
        Ok(session)
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.phase != SessionPhase::Running {
            return Err(self.invalid("pause"));
        }
        self.refresh(now);
        self.paused_at = Some(now);
        self.phase = SessionPhase::Paused;
        tracing::info!(session_id = ?self.session_id(), "Session paused");
        Ok(())
    }

    /// Continue a paused session without losing accumulated state.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.phase != SessionPhase::Paused {
            return Err(self.invalid("resume"));
        }
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_secs += secs_between(paused_at, now);
        }
        // Movement while paused must not count as distance
        self.filter.reset();
        self.phase = SessionPhase::Running;
        tracing::info!(session_id = ?self.session_id(), "Session resumed");
        Ok(())
    }

    /// Abandon the session, keeping whatever was accumulated.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<RunSession> {
        match self.phase {
            SessionPhase::Running | SessionPhase::Paused => Ok(self.finalize(now, "stopped")),
            _ => Err(self.invalid("stop")),
        }
    }

    /// Complete a running session with freshly computed aggregates.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<RunSession> {
        if self.phase != SessionPhase::Running {
            return Err(self.invalid("finish"));
        }
        Ok(self.finalize(now, "finished"))
    }

    /// Return to `Idle` after a session has finished.
    pub fn reset(&mut self) -> Result<()> {
        if self.phase != SessionPhase::Finished {
            return Err(self.invalid("reset"));
        }
        self.last_finished = None;
        self.phase = SessionPhase::Idle;
        Ok(())
    }

    fn finalize(&mut self, now: DateTime<Utc>, outcome: &'static str) -> RunSession {
        // A paused session stopped its clock when it was paused
        let end = self.paused_at.unwrap_or(now);
        self.refresh(end);

        let mut session = self.session.take().unwrap_or_else(|| RunSession::begin(now));
        session.end_time = Some(now);
        session.is_active = false;

        tracing::info!(
            session_id = session.id,
            outcome,
            distance_meters = session.distance_meters,
            duration_seconds = session.duration_seconds,
            route_points = session.route.len(),
            "Session finalized"
        );

        self.clear_accumulators();
        self.phase = SessionPhase::Finished;
        self.last_finished = Some(session.clone());
        session
    }

    fn clear_accumulators(&mut self) {
        self.filter.reset();
        self.distance.reset();
        self.speed.reset();
        self.route.reset();
        self.paused_secs = 0.0;
        self.paused_at = None;
    }

    // ─── Ingestion ───────────────────────────────────────────────

    /// Feed one fix through the filter and, if accepted, the accumulators.
    ///
    /// Returns `None` when the machine is not running; such fixes are
    /// discarded without touching any state.
    pub fn ingest(&mut self, fix: &LocationFix) -> Option<FixDecision> {
        if self.phase != SessionPhase::Running {
            tracing::trace!(phase = %self.phase, "Discarding fix outside running session");
            return None;
        }

        let decision = self.filter.offer(fix);
        if let FixDecision::Accept { distance_meters } = decision {
            self.distance.add(distance_meters);
            let gate = &self.config.filter;
            if (gate.min_speed_mps..=gate.max_speed_mps).contains(&fix.speed_mps) {
                self.speed.record(fix.speed_mps);
            }
            self.route.offer(fix);
        }
        Some(decision)
    }

    /// Periodic refresh while running. Returns the updated session.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<&RunSession> {
        if self.phase != SessionPhase::Running {
            return None;
        }
        self.refresh(now);
        self.session.as_ref()
    }

    /// Recompute derived fields of the live session at `now`.
    ///
    /// Duration is wall-clock time since start minus time spent paused, so
    /// a paused session's clock stands still and pace is not diluted by
    /// breaks.
    fn refresh(&mut self, now: DateTime<Utc>) {
        let unit = self.config.unit;
        let paused_secs = self.paused_secs;
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let duration = (secs_between(session.start_time, now) - paused_secs).max(0.0);
        let distance = self.distance.total_meters();
        let avg_speed = average_speed(distance, duration, unit);

        session.duration_seconds = duration;
        session.distance_meters = distance;
        session.average_speed = avg_speed;
        session.max_speed = self.speed.peak_speed();
        session.average_pace = if avg_speed > 0.0 {
            60.0 / avg_speed
        } else if self.speed.current_pace() > 0.0 {
            self.speed.current_pace()
        } else {
            session.average_pace
        };
        if session.route.len() != self.route.len() {
            session.route = self.route.points().to_vec();
        }
    }

    fn session_id(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Current live view for subscribers.
    pub fn snapshot(&self) -> SessionSnapshot {
        let session = match self.phase {
            SessionPhase::Finished => self.last_finished.clone(),
            _ => self.session.clone(),
        };
        SessionSnapshot {
            phase: self.phase,
            session,
            current_speed: self.speed.current_speed(),
            smoothed_speed: self.speed.smoothed_speed(),
            current_pace: self.speed.current_pace(),
        }
    }
}

fn secs_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}
