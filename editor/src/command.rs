//! Command layer: named edits the host UI calls.
//!
//! Each command is a pure `&EditorState -> Result<EditorState, CommandError>`
//! function that builds a [`Transaction`], applies it atomically, and records
//! it in history when `add_to_history` is set. On error the caller keeps the
//! state it passed in.

#[cfg(test)]
#[path = "command_test.rs"]
mod command_test;

use crate::doc::{Block, BlockId, Connector, LayoutPatch, TimeRange, TimelineItem, TimelinePatch, Vec2};
use crate::error::{CommandError, HistoryDirection, TransactionError};
use crate::factory::{FlightInput, create_flight_block};
use crate::history::HistoryEntry;
use crate::ids::{IdGenerator, now_ms};
use crate::state::EditorState;
use crate::step::Step;
use crate::transaction::{Transaction, TransactionMeta, TransactionSource, apply_transaction_with};
use crate::validate::{BlockRules, TripRules, instant_ms, utc_day};
use crate::view::{Selection, ViewportPatch};

// =============================================================================
// OPTIONS
// =============================================================================

/// Metadata knobs shared by every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOptions {
    pub add_to_history: bool,
    pub source: TransactionSource,
    /// Overrides the command's default label.
    pub label: Option<String>,
    pub group_id: Option<String>,
    pub client_id: Option<String>,
    /// Fixed Unix-millisecond timestamp; the wall clock is used when absent.
    pub timestamp: Option<i64>,
}

impl Default for CommandOptions {
    fn default() -> Self {
        Self {
            add_to_history: true,
            source: TransactionSource::Local,
            label: None,
            group_id: None,
            client_id: None,
            timestamp: None,
        }
    }
}

impl CommandOptions {
    #[must_use]
    pub fn group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    #[must_use]
    pub fn source(mut self, source: TransactionSource) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    #[must_use]
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn without_history(mut self) -> Self {
        self.add_to_history = false;
        self
    }

    fn now(&self) -> i64 {
        self.timestamp.unwrap_or_else(now_ms)
    }

    fn meta(&self, default_label: &str) -> TransactionMeta {
        TransactionMeta {
            add_to_history: self.add_to_history,
            source: self.source,
            label: Some(self.label.clone().unwrap_or_else(|| default_label.to_owned())),
            client_id: self.client_id.clone(),
            timestamp: Some(self.now()),
            group_id: self.group_id.clone(),
        }
    }
}

// =============================================================================
// COMMIT
// =============================================================================

/// Apply `tx` with [`TripRules`] and record it in history if requested.
///
/// # Errors
///
/// [`CommandError::Rejected`] when any step fails.
pub fn commit(state: &EditorState, tx: Transaction) -> Result<EditorState, CommandError> {
    commit_with(state, tx, &TripRules)
}

/// # Errors
///
/// [`CommandError::Rejected`] when any step fails under `rules`.
pub fn commit_with(state: &EditorState, tx: Transaction, rules: &dyn BlockRules) -> Result<EditorState, CommandError> {
    let applied = apply_transaction_with(state, &tx, rules).inspect_err(|error| {
        tracing::debug!(label = ?tx.meta.label, source = ?tx.meta.source, %error, "transaction rejected");
    })?;
    if !tx.meta.add_to_history {
        return Ok(applied.state);
    }
    let history = applied.state.history.push(HistoryEntry::new(tx, applied.inverse));
    Ok(applied.state.with_history(history))
}

fn run(state: &EditorState, steps: Vec<Step>, options: &CommandOptions, label: &str) -> Result<EditorState, CommandError> {
    commit(state, Transaction::new(steps, options.meta(label)))
}

// =============================================================================
// BLOCKS
// =============================================================================

/// Layout change for one block inside [`move_blocks`].
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutUpdate {
    pub block_id: BlockId,
    pub patch: LayoutPatch,
}

impl LayoutUpdate {
    #[must_use]
    pub fn new(block_id: impl Into<BlockId>, patch: LayoutPatch) -> Self {
        Self { block_id: block_id.into(), patch }
    }
}

/// # Errors
///
/// Rejected on duplicate id or invalid block.
pub fn add_block(state: &EditorState, block: Block, options: &CommandOptions) -> Result<EditorState, CommandError> {
    run(state, vec![Step::AddBlock { block }], options, "add-block")
}

/// # Errors
///
/// Rejected on unknown block or invalid resulting layout.
pub fn update_block_layout(
    state: &EditorState,
    block_id: &str,
    patch: LayoutPatch,
    options: &CommandOptions,
) -> Result<EditorState, CommandError> {
    let now = options.now();
    let step = Step::UpdateBlockLayout { block_id: block_id.to_owned(), patch, touched_at: Some(now) };
    run(state, vec![step], &CommandOptions { timestamp: Some(now), ..options.clone() }, "update-block-layout")
}

/// Apply several layout patches as one transaction. An empty batch is a no-op.
///
/// # Errors
///
/// Rejected if any patch fails; none are applied.
pub fn move_blocks(
    state: &EditorState,
    updates: &[LayoutUpdate],
    options: &CommandOptions,
) -> Result<EditorState, CommandError> {
    if updates.is_empty() {
        return Ok(state.clone());
    }
    let now = options.now();
    let steps = updates
        .iter()
        .map(|u| Step::UpdateBlockLayout { block_id: u.block_id.clone(), patch: u.patch.clone(), touched_at: Some(now) })
        .collect();
    run(state, steps, &CommandOptions { timestamp: Some(now), ..options.clone() }, "move-blocks")
}

/// Offset every listed block by `delta` from its current position.
///
/// # Errors
///
/// Rejected if any id is unknown.
pub fn translate_blocks(
    state: &EditorState,
    block_ids: &[BlockId],
    delta: Vec2,
    options: &CommandOptions,
) -> Result<EditorState, CommandError> {
    let updates: Vec<LayoutUpdate> = block_ids
        .iter()
        .map(|id| {
            let patch = state
                .doc
                .block(id)
                .map(|b| LayoutPatch::position(b.layout.position.offset(delta)))
                .unwrap_or_default();
            LayoutUpdate::new(id.clone(), patch)
        })
        .collect();
    let label = options.label.clone().unwrap_or_else(|| "translate-blocks".into());
    move_blocks(state, &updates, &CommandOptions { label: Some(label), ..options.clone() })
}

/// Remove a block together with its connectors and timeline items.
///
/// Dependents are removed first in the same transaction, and the block and
/// its connectors are dropped from the selection, so one undo restores all
/// of it.
///
/// # Errors
///
/// Rejected on unknown block.
pub fn remove_block(state: &EditorState, block_id: &str, options: &CommandOptions) -> Result<EditorState, CommandError> {
    let doc = &state.doc;
    let connector_ids: Vec<String> = doc.connectors_touching(block_id).map(|c| c.id.clone()).collect();
    let mut steps: Vec<Step> =
        connector_ids.iter().map(|id| Step::RemoveConnector { connector_id: id.clone() }).collect();
    steps.extend(doc.timeline_for_block(block_id).map(|t| Step::RemoveTimelineItem { timeline_id: t.id.clone() }));
    steps.push(Step::RemoveBlock { block_id: block_id.to_owned() });

    let mut selection = state.selection.clone();
    let mut deselected = selection.block_ids.remove(block_id);
    for id in &connector_ids {
        deselected |= selection.connector_ids.remove(id);
    }
    if deselected {
        steps.push(Step::SetSelection { selection });
    }
    run(state, steps, options, "remove-block")
}

// =============================================================================
// CONNECTORS
// =============================================================================

/// # Errors
///
/// Rejected on duplicate id, self reference, or missing endpoint.
pub fn add_connector(
    state: &EditorState,
    connector: Connector,
    options: &CommandOptions,
) -> Result<EditorState, CommandError> {
    run(state, vec![Step::AddConnector { connector }], options, "add-connector")
}

/// # Errors
///
/// Rejected on unknown connector.
pub fn remove_connector(
    state: &EditorState,
    connector_id: &str,
    options: &CommandOptions,
) -> Result<EditorState, CommandError> {
    run(state, vec![Step::RemoveConnector { connector_id: connector_id.to_owned() }], options, "remove-connector")
}

// =============================================================================
// TIMELINE
// =============================================================================

/// Input for [`add_flight_with_timeline`].
#[derive(Debug, Clone, Default)]
pub struct FlightWithTimelineInput {
    pub flight: FlightInput,
    /// Defaults to the UTC day of departure.
    pub timeline_day: Option<String>,
}

/// Add a flight block and its timeline entry as one undoable edit.
///
/// # Errors
///
/// [`CommandError::InvalidInput`] when the flight fails validation, otherwise
/// [`CommandError::Rejected`].
pub fn add_flight_with_timeline(
    state: &EditorState,
    input: FlightWithTimelineInput,
    ids: &mut dyn IdGenerator,
    options: &CommandOptions,
) -> Result<EditorState, CommandError> {
    let now = options.now();
    let flight = create_flight_block(input.flight, ids, now)?;
    let time = flight.time_range().cloned().unwrap_or_default();
    let day = match input.timeline_day {
        Some(day) => day,
        None => utc_day(&time.start)?,
    };
    let item = TimelineItem {
        id: ids.next_id("timeline"),
        block_id: flight.id.clone(),
        day,
        order: instant_ms(&time.start)?,
        time_range: Some(time),
    };
    let steps = vec![Step::AddBlock { block: flight }, Step::AddTimelineItem { item }];
    run(state, steps, &CommandOptions { timestamp: Some(now), ..options.clone() }, "add-flight-with-timeline")
}

/// Input for [`add_timeline_item`].
#[derive(Debug, Clone, Default)]
pub struct TimelineInput {
    pub block_id: BlockId,
    pub day: String,
    pub time_range: Option<TimeRange>,
    /// Defaults to the start instant (or the day) in Unix milliseconds.
    pub order: Option<i64>,
}

/// # Errors
///
/// [`CommandError::InvalidInput`] when no order can be derived, otherwise
/// [`CommandError::Rejected`].
pub fn add_timeline_item(
    state: &EditorState,
    input: TimelineInput,
    ids: &mut dyn IdGenerator,
    options: &CommandOptions,
) -> Result<EditorState, CommandError> {
    let order = match input.order {
        Some(order) => order,
        None => instant_ms(input.time_range.as_ref().map_or(&input.day, |r| &r.start))?,
    };
    let item = TimelineItem {
        id: ids.next_id("timeline"),
        block_id: input.block_id,
        day: input.day,
        time_range: input.time_range,
        order,
    };
    run(state, vec![Step::AddTimelineItem { item }], options, "add-timeline-item")
}

/// # Errors
///
/// Rejected on unknown item or invalid result.
pub fn update_timeline_item(
    state: &EditorState,
    timeline_id: &str,
    patch: TimelinePatch,
    options: &CommandOptions,
) -> Result<EditorState, CommandError> {
    let step = Step::UpdateTimelineItem { timeline_id: timeline_id.to_owned(), patch };
    run(state, vec![step], options, "update-timeline-item")
}

/// # Errors
///
/// Rejected on unknown item.
pub fn remove_timeline_item(
    state: &EditorState,
    timeline_id: &str,
    options: &CommandOptions,
) -> Result<EditorState, CommandError> {
    run(state, vec![Step::RemoveTimelineItem { timeline_id: timeline_id.to_owned() }], options, "remove-timeline-item")
}

// =============================================================================
// VIEW
// =============================================================================

/// Pan or zoom. Never recorded in history.
///
/// # Errors
///
/// Rejected on non-finite center or non-positive zoom.
pub fn set_viewport(state: &EditorState, patch: ViewportPatch) -> Result<EditorState, CommandError> {
    run(state, vec![Step::SetViewport { patch }], &CommandOptions::default().without_history(), "set-viewport")
}

/// Replace the selection. Never recorded in history.
///
/// # Errors
///
/// Selection steps cannot fail today; the signature matches the other commands.
pub fn set_selection(state: &EditorState, selection: Selection) -> Result<EditorState, CommandError> {
    run(state, vec![Step::SetSelection { selection }], &CommandOptions::default().without_history(), "set-selection")
}

// =============================================================================
// HISTORY
// =============================================================================

/// Undo with [`TripRules`].
///
/// # Errors
///
/// See [`undo_with`].
pub fn undo(state: &EditorState) -> Result<EditorState, CommandError> {
    undo_with(state, &TripRules)
}

/// Apply the inverse of the top undo entry and move it to the redo stack.
///
/// An empty stack returns the state unchanged.
///
/// # Errors
///
/// [`CommandError::HistoryCorrupt`] if the inverse no longer applies. The
/// entry stays on the undo stack and the caller's state is untouched.
pub fn undo_with(state: &EditorState, rules: &dyn BlockRules) -> Result<EditorState, CommandError> {
    let Some((entry, history)) = state.history.pop_undo() else {
        return Ok(state.clone());
    };
    match apply_transaction_with(&state.with_history(history), &entry.inverse, rules) {
        Ok(applied) => {
            let history = applied.state.history.push_redo(entry);
            Ok(applied.state.with_history(history))
        }
        Err(source) => Err(history_corrupt(HistoryDirection::Undo, &entry, source)),
    }
}

/// Redo with [`TripRules`].
///
/// # Errors
///
/// See [`redo_with`].
pub fn redo(state: &EditorState) -> Result<EditorState, CommandError> {
    redo_with(state, &TripRules)
}

/// Reapply the top redo entry and return it to the undo stack without merging.
///
/// # Errors
///
/// [`CommandError::HistoryCorrupt`] if the transaction no longer applies.
pub fn redo_with(state: &EditorState, rules: &dyn BlockRules) -> Result<EditorState, CommandError> {
    let Some((entry, history)) = state.history.pop_redo() else {
        return Ok(state.clone());
    };
    match apply_transaction_with(&state.with_history(history), &entry.transaction, rules) {
        Ok(applied) => {
            let history = applied.state.history.push_undo(entry);
            Ok(applied.state.with_history(history))
        }
        Err(source) => Err(history_corrupt(HistoryDirection::Redo, &entry, source)),
    }
}

fn history_corrupt(direction: HistoryDirection, entry: &HistoryEntry, source: TransactionError) -> CommandError {
    tracing::warn!(
        %direction,
        label = ?entry.transaction.meta.label,
        group = ?entry.transaction.meta.group_id,
        error = %source,
        "history entry failed to replay; state left unchanged"
    );
    CommandError::HistoryCorrupt { direction, source }
}

#[must_use]
pub fn can_undo(state: &EditorState) -> bool {
    state.history.can_undo()
}

#[must_use]
pub fn can_redo(state: &EditorState) -> bool {
    state.history.can_redo()
}
