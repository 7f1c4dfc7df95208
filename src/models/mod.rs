// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the tracker.

pub mod achievement;
pub mod fix;
pub mod item;
pub mod ledger;
pub mod session;

pub use achievement::{Achievement, AchievementCategory, AchievementDefinition};
pub use fix::{Coordinate, LocationFix};
pub use item::PlacedItem;
pub use ledger::RewardLedger;
pub use session::{RunSession, SessionPhase, SessionSnapshot};
