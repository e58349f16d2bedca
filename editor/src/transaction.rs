//! Transactions: ordered batches of steps applied all-or-nothing.
//!
//! Applying a transaction folds its steps over the input snapshot. The first
//! failing step aborts the batch and the caller keeps the original snapshot.
//! On success the inverse steps are collected in reverse order, so the
//! inverse of step N runs first when undoing.
//!
//! Inverse metadata is derived in one place only, [`TransactionMeta::inverse`].
//! It copies `source`, `add_to_history`, `client_id`, `timestamp`, and
//! `group_id` verbatim and rewrites the label as `undo:<label>`.

#[cfg(test)]
#[path = "transaction_test.rs"]
mod transaction_test;

use serde::{Deserialize, Serialize};

use crate::error::TransactionError;
use crate::state::EditorState;
use crate::step::Step;
use crate::validate::{BlockRules, TripRules};

/// Where a transaction originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSource {
    /// Direct user action in this session.
    #[default]
    Local,
    /// Replayed from a collaborator.
    Remote,
    /// Generated by the application itself (imports, perf drivers).
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMeta {
    pub add_to_history: bool,
    pub source: TransactionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Entries pushed with the same non-empty group id coalesce in history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl Default for TransactionMeta {
    fn default() -> Self {
        Self {
            add_to_history: true,
            source: TransactionSource::Local,
            label: None,
            client_id: None,
            timestamp: None,
            group_id: None,
        }
    }
}

impl TransactionMeta {
    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self { label: Some(label.into()), ..Self::default() }
    }

    /// Metadata for the inverse of a transaction carrying `self`.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self { label: self.label.as_ref().map(|l| format!("undo:{l}")), ..self.clone() }
    }

    /// Non-empty group id, if any.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group_id.as_deref().filter(|g| !g.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub steps: Vec<Step>,
    pub meta: TransactionMeta,
}

impl Transaction {
    #[must_use]
    pub fn new(steps: Vec<Step>, meta: TransactionMeta) -> Self {
        Self { steps, meta }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Result of a successful [`apply_transaction`].
#[derive(Debug, Clone)]
pub struct Applied {
    pub state: EditorState,
    pub inverse: Transaction,
}

/// Apply with the default [`TripRules`].
///
/// # Errors
///
/// See [`apply_transaction_with`].
pub fn apply_transaction(state: &EditorState, tx: &Transaction) -> Result<Applied, TransactionError> {
    apply_transaction_with(state, tx, &TripRules)
}

/// Apply every step of `tx` in order, atomically.
///
/// # Errors
///
/// [`TransactionError::StepFailed`] names the first failing step. `state` is
/// untouched either way; no partial result escapes.
pub fn apply_transaction_with(
    state: &EditorState,
    tx: &Transaction,
    rules: &dyn BlockRules,
) -> Result<Applied, TransactionError> {
    let mut current = state.clone();
    let mut inverse_steps = Vec::with_capacity(tx.steps.len());

    for (index, step) in tx.steps.iter().enumerate() {
        let next = step
            .apply_with(&current, rules)
            .map_err(|source| TransactionError::StepFailed { index, step: step.name(), source })?;
        let inverse = step.invert(&current).map_err(|source| TransactionError::Invert { index, source })?;
        inverse_steps.push(inverse);
        current = next;
    }

    inverse_steps.reverse();
    Ok(Applied { state: current, inverse: Transaction::new(inverse_steps, tx.meta.inverse()) })
}
