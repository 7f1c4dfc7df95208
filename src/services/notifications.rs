// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fire-and-forget notification sink.

use serde::{Deserialize, Serialize};

/// Event delivered to the user-facing notification layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    AchievementUnlocked {
        id: String,
        title: String,
    },
    GoalProgress {
        seconds_completed: f64,
        goal_seconds: f64,
        /// In `[0, 1]`
        fraction: f64,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Deliver `notification`, logging and swallowing any failure.
pub fn dispatch(sink: &dyn NotificationSink, notification: Notification) {
    if let Err(e) = sink.notify(notification) {
        tracing::warn!(error = %e, "Notification dropped");
    }
}

/// Sink that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        tracing::info!(notification = ?notification, "Notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl NotificationSink for FailingSink {
        fn notify(&self, _: Notification) -> Result<(), NotifyError> {
            Err(NotifyError("offline".to_string()))
        }
    }

    #[test]
    fn test_dispatch_swallows_errors() {
        dispatch(
            &FailingSink,
            Notification::AchievementUnlocked {
                id: "first_run".to_string(),
                title: "First Steps".to_string(),
            },
        );
    }

    #[test]
    fn test_notification_json_is_tagged() {
        let json = serde_json::to_value(Notification::GoalProgress {
            seconds_completed: 900.0,
            goal_seconds: 1800.0,
            fraction: 0.5,
        })
        .unwrap();

        assert_eq!(json["type"], "goal_progress");
        assert_eq!(json["fraction"], 0.5);
    }
}
