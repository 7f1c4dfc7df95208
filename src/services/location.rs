// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location-service collaborator interface.
//!
//! The platform location service pushes fixes into a channel owned by the
//! session tracker; it never calls into tracker state directly.

use crate::models::LocationFix;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Source of location fixes.
pub trait LocationService: Send + Sync {
    /// Whether the user has granted location access.
    fn permission_granted(&self) -> bool;

    /// Begin delivering fixes into `sink`.
    fn start_updates(&self, sink: mpsc::Sender<LocationFix>);

    /// Stop delivering fixes. Fixes already queued may still arrive.
    fn stop_updates(&self);
}

/// Location service fed by hand, for replays and tests.
///
/// Fixes pushed while updates are stopped are dropped, like a real device
/// that is not reporting.
#[derive(Debug, Default)]
pub struct ManualLocationService {
    permission: AtomicBool,
    sink: Mutex<Option<mpsc::Sender<LocationFix>>>,
}

impl ManualLocationService {
    pub fn new(permission_granted: bool) -> Self {
        Self {
            permission: AtomicBool::new(permission_granted),
            sink: Mutex::new(None),
        }
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    pub fn is_delivering(&self) -> bool {
        self.sink
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Deliver one fix. Returns `false` if updates are stopped or the
    /// tracker has gone away.
    pub async fn push(&self, fix: LocationFix) -> bool {
        let sink = match self.sink.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        };
        match sink {
            Some(sink) => sink.send(fix).await.is_ok(),
            None => false,
        }
    }
}

impl LocationService for ManualLocationService {
    fn permission_granted(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    fn start_updates(&self, sink: mpsc::Sender<LocationFix>) {
        if let Ok(mut guard) = self.sink.lock() {
            *guard = Some(sink);
        }
    }

    fn stop_updates(&self) {
        if let Ok(mut guard) = self.sink.lock() {
            *guard = None;
        }
    }
}
