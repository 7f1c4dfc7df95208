// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed per-user persistence on top of a [`KeyValueStore`].
//!
//! Provides high-level operations for:
//! - Recent sessions (newest first, capped)
//! - Full completed-session history (routes stripped, uncapped)
//! - Reward ledger
//! - Unlocked achievements
//! - Placed items
//! - Sessions awaiting upload
//!
//! Reads never fail: a missing or undecodable document is logged and
//! replaced by its default.

use crate::db::{collections, user_key, KeyValueStore};
use crate::error::Result;
use crate::models::{PlacedItem, RewardLedger, RunSession};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Unlock dates keyed by achievement id.
pub type UnlockedAchievements = BTreeMap<String, DateTime<Utc>>;

/// Persistence handle scoped to one user.
#[derive(Clone)]
pub struct UserStore {
    store: Arc<dyn KeyValueStore>,
    user_id: String,
    recent_sessions_limit: usize,
    retain_routes: bool,
    daily_minutes_goal: u32,
}

impl UserStore {
    pub fn new(store: Arc<dyn KeyValueStore>, user_id: &str) -> Self {
        Self {
            store,
            user_id: user_id.to_string(),
            recent_sessions_limit: 50,
            retain_routes: true,
            daily_minutes_goal: 30,
        }
    }

    /// Apply the persistence-related settings from `config`.
    pub fn with_config(mut self, config: &crate::config::Config) -> Self {
        self.recent_sessions_limit = config.recent_sessions_limit;
        self.retain_routes = config.retain_routes;
        self.daily_minutes_goal = config.daily_minutes_goal;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn load<T: DeserializeOwned>(&self, collection: &str) -> Option<T> {
        let key = user_key(&self.user_id, collection);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Store read failed, using default");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Corrupt document, using default");
                None
            }
        }
    }

    fn save<T: Serialize>(&self, collection: &str, value: &T) -> Result<()> {
        let key = user_key(&self.user_id, collection);
        let json = serde_json::to_string(value)
            .map_err(|e| anyhow::anyhow!("Failed to encode {}: {}", key, e))?;
        self.store.put(&key, json)?;
        Ok(())
    }

    // ─── Sessions ────────────────────────────────────────────────

    /// Recent sessions, newest first.
    pub fn load_sessions(&self) -> Vec<RunSession> {
        self.load(collections::SESSIONS).unwrap_or_default()
    }

    /// Every completed session, newest first, without routes.
    ///
    /// Achievement aggregates are computed over this list; the recent list
    /// is capped and would undercount. Users recorded before the history
    /// collection existed are seeded from their recent sessions.
    pub fn load_history(&self) -> Vec<RunSession> {
        match self.load::<Vec<RunSession>>(collections::SESSION_HISTORY) {
            Some(history) => history,
            None => self
                .load_sessions()
                .iter()
                .map(RunSession::without_route)
                .collect(),
        }
    }

    /// Prepend a finalized session to the recent list and the full history.
    ///
    /// Re-recording the same session id replaces the earlier copy. Returns
    /// the updated recent list.
    pub fn record_session(&self, session: &RunSession) -> Result<Vec<RunSession>> {
        let stored = if self.retain_routes {
            session.clone()
        } else {
            session.without_route()
        };

        let mut history = self.load_history();
        history.retain(|s| s.id != session.id);
        history.insert(0, session.without_route());
        self.save(collections::SESSION_HISTORY, &history)?;

        let mut sessions = self.load_sessions();
        sessions.retain(|s| s.id != stored.id);
        sessions.insert(0, stored);
        sessions.truncate(self.recent_sessions_limit.max(1));

        self.save(collections::SESSIONS, &sessions)?;
        tracing::debug!(
            user_id = %self.user_id,
            session_id = session.id,
            stored = sessions.len(),
            lifetime = history.len(),
            "Session recorded"
        );
        Ok(sessions)
    }

    // ─── Ledger ──────────────────────────────────────────────────

    pub fn load_ledger(&self) -> RewardLedger {
        self.load(collections::LEDGER)
            .unwrap_or_else(|| RewardLedger::with_goal(self.daily_minutes_goal))
    }

    pub fn save_ledger(&self, ledger: &RewardLedger) -> Result<()> {
        self.save(collections::LEDGER, ledger)
    }

    // ─── Achievements ────────────────────────────────────────────

    pub fn load_unlocked(&self) -> UnlockedAchievements {
        self.load(collections::ACHIEVEMENTS).unwrap_or_default()
    }

    pub fn save_unlocked(&self, unlocked: &UnlockedAchievements) -> Result<()> {
        self.save(collections::ACHIEVEMENTS, unlocked)
    }

    // ─── Placed Items ────────────────────────────────────────────

    pub fn load_items(&self) -> Vec<PlacedItem> {
        self.load(collections::PLACED_ITEMS).unwrap_or_default()
    }

    pub fn save_items(&self, items: &[PlacedItem]) -> Result<()> {
        self.save(collections::PLACED_ITEMS, &items)
    }

    // ─── Pending Uploads ─────────────────────────────────────────

    pub fn load_pending_uploads(&self) -> Vec<RunSession> {
        self.load(collections::PENDING_UPLOADS).unwrap_or_default()
    }

    pub fn save_pending_uploads(&self, sessions: &[RunSession]) -> Result<()> {
        if sessions.is_empty() {
            let key = user_key(&self.user_id, collections::PENDING_UPLOADS);
            self.store.delete(&key)?;
            return Ok(());
        }
        self.save(collections::PENDING_UPLOADS, &sessions)
    }
}
