// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bounded undo/redo over full-state snapshots, and the item placement
//! editor built on it.

use crate::db::UserStore;
use crate::error::Result;
use crate::models::{PlacedItem, RewardLedger};
use std::collections::VecDeque;

/// Default number of snapshots kept on each stack.
pub const DEFAULT_CAPACITY: usize = 20;

/// Undo/redo history of a value `T`.
///
/// Each stack holds at most `capacity` snapshots; the oldest is evicted
/// first. Applying a new state after an undo discards the redo stack.
#[derive(Debug, Clone)]
pub struct EditHistory<T> {
    current: T,
    undo: VecDeque<T>,
    redo: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> EditHistory<T> {
    pub fn new(initial: T, capacity: usize) -> Self {
        Self {
            current: initial,
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    /// Replace the current state, remembering the old one for undo.
    pub fn apply(&mut self, new_state: T) {
        let previous = std::mem::replace(&mut self.current, new_state);
        push_bounded(&mut self.undo, previous, self.capacity);
        self.redo.clear();
    }

    /// Step back one edit. Returns `false` if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo.pop_back() else {
            return false;
        };
        let undone = std::mem::replace(&mut self.current, previous);
        push_bounded(&mut self.redo, undone, self.capacity);
        true
    }

    /// Re-apply the last undone edit. Returns `false` if there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop_back() else {
            return false;
        };
        let replaced = std::mem::replace(&mut self.current, next);
        push_bounded(&mut self.undo, replaced, self.capacity);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}

fn push_bounded<T>(stack: &mut VecDeque<T>, value: T, capacity: usize) {
    if stack.len() == capacity {
        stack.pop_front();
    }
    stack.push_back(value);
}

/// Why a placement edit was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("Not enough gems: need {needed}, have {available}")]
    InsufficientGems { needed: u64, available: u64 },

    #[error("Cell ({row}, {column}) is occupied")]
    Occupied { row: i32, column: i32 },

    #[error("No item with id {0}")]
    UnknownItem(u64),
}

/// Places and removes gem-priced items with undo/redo.
///
/// Placing spends the item's cost from the ledger. Undoing a placement
/// refunds the cost only when `refund_on_undo` is set.
pub struct PlacementEditor {
    history: EditHistory<Vec<PlacedItem>>,
    refund_on_undo: bool,
}

impl PlacementEditor {
    pub fn new(items: Vec<PlacedItem>, capacity: usize, refund_on_undo: bool) -> Self {
        Self {
            history: EditHistory::new(items, capacity),
            refund_on_undo,
        }
    }

    /// Restore the persisted item list for `store`'s user.
    pub fn load(store: &UserStore, config: &crate::config::Config) -> Self {
        Self::new(
            store.load_items(),
            config.edit_history_capacity,
            config.refund_on_undo,
        )
    }

    pub fn save(&self, store: &UserStore) -> Result<()> {
        store.save_items(self.items())
    }

    pub fn items(&self) -> &[PlacedItem] {
        self.history.current()
    }

    pub fn history(&self) -> &EditHistory<Vec<PlacedItem>> {
        &self.history
    }

    /// Buy and place an item.
    pub fn place(
        &mut self,
        item: PlacedItem,
        ledger: &mut RewardLedger,
    ) -> std::result::Result<(), PlacementError> {
        if self
            .items()
            .iter()
            .any(|i| i.row == item.row && i.column == item.column)
        {
            return Err(PlacementError::Occupied {
                row: item.row,
                column: item.column,
            });
        }
        if !ledger.spend(item.cost) {
            return Err(PlacementError::InsufficientGems {
                needed: item.cost,
                available: ledger.total_gems,
            });
        }

        tracing::debug!(item_id = item.id, kind = %item.kind, cost = item.cost, "Item placed");
        let mut next = self.items().to_vec();
        next.push(item);
        self.history.apply(next);
        Ok(())
    }

    /// Remove an item. Removal never refunds.
    pub fn remove(&mut self, item_id: u64) -> std::result::Result<PlacedItem, PlacementError> {
        let mut next = self.items().to_vec();
        let index = next
            .iter()
            .position(|i| i.id == item_id)
            .ok_or(PlacementError::UnknownItem(item_id))?;
        let removed = next.remove(index);
        self.history.apply(next);
        Ok(removed)
    }

    pub fn undo(&mut self, ledger: &mut RewardLedger) -> bool {
        let before = self.items().to_vec();
        if !self.history.undo() {
            return false;
        }
        if self.refund_on_undo {
            let refund: u64 = before
                .iter()
                .filter(|item| !self.items().iter().any(|i| i.id == item.id))
                .map(|item| item.cost)
                .sum();
            if refund > 0 {
                ledger.refund(refund);
                tracing::debug!(refund, "Placement undone with refund");
            }
        }
        true
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_inverse() {
        let mut history = EditHistory::new(vec![1], DEFAULT_CAPACITY);
        let s = history.current().clone();

        history.apply(vec![1, 2]);
        let applied = history.current().clone();

        assert!(history.undo());
        assert_eq!(history.current(), &s);
        assert!(history.redo());
        assert_eq!(history.current(), &applied);
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut history = EditHistory::new(0, DEFAULT_CAPACITY);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(!history.undo());
        assert!(!history.redo());
        assert_eq!(*history.current(), 0);
    }

    #[test]
    fn test_new_edit_discards_redo() {
        let mut history = EditHistory::new(0, DEFAULT_CAPACITY);
        history.apply(1);
        history.apply(2);
        history.undo();
        assert!(history.can_redo());

        history.apply(3);

        assert!(!history.can_redo());
        assert_eq!(history.undo_len(), 2);
    }

    #[test]
    fn test_undo_stack_bounded_at_capacity() {
        let mut history = EditHistory::new(0, DEFAULT_CAPACITY);
        for i in 1..=25 {
            history.apply(i);
        }

        assert_eq!(history.undo_len(), 20);
        // Oldest five (0..=4) were evicted
        while history.undo() {}
        assert_eq!(*history.current(), 5);
    }

    #[test]
    fn test_place_spends_and_refuses_when_broke() {
        let mut ledger = RewardLedger {
            total_gems: 10,
            ..RewardLedger::default()
        };
        let mut editor = PlacementEditor::new(Vec::new(), DEFAULT_CAPACITY, false);

        editor
            .place(PlacedItem::new(1, "tree", 0, 0, 8), &mut ledger)
            .unwrap();
        let err = editor
            .place(PlacedItem::new(2, "bench", 0, 1, 8), &mut ledger)
            .unwrap_err();

        assert_eq!(
            err,
            PlacementError::InsufficientGems {
                needed: 8,
                available: 2
            }
        );
        assert_eq!(editor.items().len(), 1);
        assert_eq!(ledger.total_gems, 2);
    }

    #[test]
    fn test_place_rejects_occupied_cell() {
        let mut ledger = RewardLedger {
            total_gems: 100,
            ..RewardLedger::default()
        };
        let mut editor = PlacementEditor::new(Vec::new(), DEFAULT_CAPACITY, false);
        editor
            .place(PlacedItem::new(1, "tree", 2, 3, 5), &mut ledger)
            .unwrap();

        let err = editor
            .place(PlacedItem::new(2, "rock", 2, 3, 5), &mut ledger)
            .unwrap_err();

        assert_eq!(err, PlacementError::Occupied { row: 2, column: 3 });
        assert_eq!(ledger.total_gems, 95);
    }

    #[test]
    fn test_undo_refund_policy() {
        for (refund_on_undo, expected) in [(false, 40), (true, 50)] {
            let mut ledger = RewardLedger {
                total_gems: 50,
                ..RewardLedger::default()
            };
            let mut editor = PlacementEditor::new(Vec::new(), DEFAULT_CAPACITY, refund_on_undo);
            editor
                .place(PlacedItem::new(1, "fountain", 0, 0, 10), &mut ledger)
                .unwrap();

            assert!(editor.undo(&mut ledger));

            assert!(editor.items().is_empty());
            assert_eq!(ledger.total_gems, expected);
        }
    }

    #[test]
    fn test_remove_unknown_item() {
        let mut editor = PlacementEditor::new(Vec::new(), DEFAULT_CAPACITY, false);
        assert_eq!(editor.remove(7), Err(PlacementError::UnknownItem(7)));
        assert!(!editor.history().can_undo());
    }
}
