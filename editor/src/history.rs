//! Undo/redo stacks over committed transactions.
//!
//! Both stacks are persistent vectors; every operation returns a new
//! [`HistoryState`] and leaves `self` untouched, matching the snapshot
//! discipline of the rest of the editor state.
//!
//! Coalescing is keyed on exact `group_id` equality only. Two unrelated
//! gestures that reuse a group id will merge into one undo unit; callers
//! must mint a fresh id per gesture.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::transaction::{Transaction, TransactionMeta};

/// A committed transaction paired with its inverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub transaction: Transaction,
    pub inverse: Transaction,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(transaction: Transaction, inverse: Transaction) -> Self {
        Self { transaction, inverse }
    }

    /// Collapse `newer` into `older`.
    ///
    /// Forward steps run older-then-newer; inverse steps undo the newer change
    /// first. Optional metadata prefers `newer` and falls back to `older`.
    #[must_use]
    pub fn merge(older: &HistoryEntry, newer: &HistoryEntry) -> HistoryEntry {
        let mut steps = older.transaction.steps.clone();
        steps.extend(newer.transaction.steps.iter().cloned());

        let mut inverse_steps = newer.inverse.steps.clone();
        inverse_steps.extend(older.inverse.steps.iter().cloned());

        HistoryEntry {
            transaction: Transaction::new(steps, merge_meta(&older.transaction.meta, &newer.transaction.meta)),
            inverse: Transaction::new(inverse_steps, merge_meta(&older.inverse.meta, &newer.inverse.meta)),
        }
    }
}

fn merge_meta(older: &TransactionMeta, newer: &TransactionMeta) -> TransactionMeta {
    TransactionMeta {
        label: newer.label.clone().or_else(|| older.label.clone()),
        client_id: newer.client_id.clone().or_else(|| older.client_id.clone()),
        timestamp: newer.timestamp.or(older.timestamp),
        group_id: newer.group_id.clone().or_else(|| older.group_id.clone()),
        ..newer.clone()
    }
}

/// Undo and redo stacks. The last element of each is the top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryState {
    undo_stack: Vector<HistoryEntry>,
    redo_stack: Vector<HistoryEntry>,
}

impl HistoryState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed entry and clear the redo stack.
    ///
    /// Merges into the current top when both carry the same non-empty group id.
    #[must_use]
    pub fn push(&self, entry: HistoryEntry) -> Self {
        let mut undo_stack = self.undo_stack.clone();
        let merged = match (undo_stack.last(), entry.transaction.meta.group()) {
            (Some(top), Some(group)) if top.transaction.meta.group() == Some(group) => {
                Some(HistoryEntry::merge(top, &entry))
            }
            _ => None,
        };
        match merged {
            Some(merged) => {
                undo_stack.pop_back();
                undo_stack.push_back(merged);
            }
            None => undo_stack.push_back(entry),
        }
        Self { undo_stack, redo_stack: Vector::new() }
    }

    /// Put a redone entry back on the undo stack as-is. Never merges, and the
    /// remaining redo entries survive so consecutive redos keep working.
    #[must_use]
    pub fn push_undo(&self, entry: HistoryEntry) -> Self {
        let mut undo_stack = self.undo_stack.clone();
        undo_stack.push_back(entry);
        Self { undo_stack, redo_stack: self.redo_stack.clone() }
    }

    /// Put an undone entry on the redo stack. The undo stack is left alone.
    #[must_use]
    pub fn push_redo(&self, entry: HistoryEntry) -> Self {
        let mut redo_stack = self.redo_stack.clone();
        redo_stack.push_back(entry);
        Self { undo_stack: self.undo_stack.clone(), redo_stack }
    }

    /// Top undo entry and the history without it.
    #[must_use]
    pub fn pop_undo(&self) -> Option<(HistoryEntry, Self)> {
        let mut undo_stack = self.undo_stack.clone();
        let entry = undo_stack.pop_back()?;
        Some((entry, Self { undo_stack, redo_stack: self.redo_stack.clone() }))
    }

    /// Top redo entry and the history without it.
    #[must_use]
    pub fn pop_redo(&self) -> Option<(HistoryEntry, Self)> {
        let mut redo_stack = self.redo_stack.clone();
        let entry = redo_stack.pop_back()?;
        Some((entry, Self { undo_stack: self.undo_stack.clone(), redo_stack }))
    }

    #[must_use]
    pub fn peek_undo(&self) -> Option<&HistoryEntry> {
        self.undo_stack.last()
    }

    #[must_use]
    pub fn peek_redo(&self) -> Option<&HistoryEntry> {
        self.redo_stack.last()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }
}
