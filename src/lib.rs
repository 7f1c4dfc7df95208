// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Stride-Tracker: GPS run tracking with gem rewards and achievements
//!
//! This crate filters raw location fixes into a live running session,
//! rewards finished sessions with gems, and tracks achievement progress
//! across the session history.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{KeyValueStore, UserStore};
use services::{
    LocationService, NotificationSink, PlacementEditor, SessionTracker, SessionUploader,
    SyncService, TrackerDeps, TrackerHandle,
};
use std::sync::Arc;
use time_utils::Clock;

/// Platform services the tracker depends on.
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub location: Arc<dyn LocationService>,
    pub notifier: Arc<dyn NotificationSink>,
    pub uploader: Arc<dyn SessionUploader>,
}

/// Shared application state for one signed-in user.
pub struct AppState {
    pub config: Config,
    pub store: UserStore,
    pub sync: SyncService,
    pub tracker: TrackerHandle,
}

impl AppState {
    /// Wire up persistence, sync and the session tracker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: Config,
        kv: Arc<dyn KeyValueStore>,
        user_id: &str,
        collaborators: Collaborators,
    ) -> Self {
        let store = UserStore::new(kv, user_id).with_config(&config);
        let sync = SyncService::new(collaborators.uploader, store.clone());
        let tracker = SessionTracker::spawn(TrackerDeps {
            config: config.clone(),
            clock: collaborators.clock,
            location: collaborators.location,
            store: store.clone(),
            notifier: collaborators.notifier,
            sync: sync.clone(),
            definitions: models::achievement::default_definitions(),
        });
        tracing::info!(user_id, unit = %config.unit, "Tracker state initialized");

        Self {
            config,
            store,
            sync,
            tracker,
        }
    }

    /// Item placement editor over the user's persisted items.
    pub fn placement_editor(&self) -> PlacementEditor {
        PlacementEditor::load(&self.store, &self.config)
    }
}
