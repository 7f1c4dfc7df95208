// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracker error types.
//!
//! Nothing here is fatal to the process: callers either retry later or fall
//! back to defaults.

use crate::models::SessionPhase;

/// Errors surfaced by tracker operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Location permission not granted")]
    PermissionDenied,

    #[error("Cannot {action} while {phase}")]
    InvalidTransition {
        phase: SessionPhase,
        action: &'static str,
    },

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Sync error: {0}")]
    Sync(String),

    #[error("Session tracker is no longer running")]
    TrackerClosed,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl TrackerError {
    /// True when `start` was refused for lack of location permission.
    pub fn is_permission_error(&self) -> bool {
        matches!(self, TrackerError::PermissionDenied)
    }

    /// True for failures that may succeed if attempted again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrackerError::Store(_) | TrackerError::Sync(_))
    }
}

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;
