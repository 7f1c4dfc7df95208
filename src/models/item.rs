// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Items bought with gems and placed on the user's grid.

use serde::{Deserialize, Serialize};

/// One placed item.
///
/// Stored as a list at: `users/{user_id}/placed_items`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub id: u64,
    /// Catalogue kind ("tree", "bench", ...)
    pub kind: String,
    pub row: i32,
    pub column: i32,
    /// Gem price paid when placed
    pub cost: u64,
}

impl PlacedItem {
    pub fn new(id: u64, kind: &str, row: i32, column: i32, cost: u64) -> Self {
        Self {
            id,
            kind: kind.to_string(),
            row,
            column,
            cost,
        }
    }
}
