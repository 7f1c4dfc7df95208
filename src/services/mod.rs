// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - tracking, rewards and sync logic.

pub mod achievements;
pub mod edit_history;
pub mod fix_filter;
pub mod location;
pub mod metrics;
pub mod notifications;
pub mod rewards;
pub mod route;
pub mod session;
pub mod sync;
pub mod tracker;

pub use achievements::{evaluate, EvaluationContext, HistoryAggregates};
pub use edit_history::{EditHistory, PlacementEditor, PlacementError};
pub use fix_filter::{FixDecision, FixFilter, RejectReason};
pub use location::{LocationService, ManualLocationService};
pub use metrics::{DistanceAccumulator, SpeedEstimator};
pub use notifications::{LogNotifier, Notification, NotificationSink};
pub use rewards::RewardBreakdown;
pub use route::RouteRecorder;
pub use session::SessionMachine;
pub use sync::{NoopUploader, RetryResult, SessionUploader, SyncError, SyncService, SyncStatus};
pub use tracker::{FinishOutcome, SessionTracker, TrackerDeps, TrackerHandle};
