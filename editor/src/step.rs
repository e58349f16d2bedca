//! Steps: the smallest invertible mutations of an [`EditorState`].
//!
//! `apply` never touches its input. On success it returns a new snapshot that
//! shares every untouched branch with the old one; on failure the caller
//! still holds the original. `invert` is computed against the state the step
//! was applied to and yields a step that, applied to the result, restores
//! that state exactly.

#[cfg(test)]
#[path = "step_test.rs"]
mod step_test;

use serde::{Deserialize, Serialize};

use crate::doc::{Block, BlockId, Connector, ConnectorId, Document, LayoutPatch, TimelineId, TimelineItem, TimelinePatch};
use crate::error::{InvariantViolation, StepError, StructuralError};
use crate::state::EditorState;
use crate::validate::{self, BlockRules, TripRules};
use crate::view::{Selection, ViewportPatch};

/// A single invertible edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    AddBlock {
        block: Block,
    },
    /// Fails while a connector or timeline item still references the block.
    RemoveBlock {
        block_id: BlockId,
    },
    UpdateBlockLayout {
        block_id: BlockId,
        patch: LayoutPatch,
        /// New `updated_at`; the block's value is kept when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        touched_at: Option<i64>,
    },
    AddConnector {
        connector: Connector,
    },
    RemoveConnector {
        connector_id: ConnectorId,
    },
    AddTimelineItem {
        item: TimelineItem,
    },
    UpdateTimelineItem {
        timeline_id: TimelineId,
        patch: TimelinePatch,
    },
    RemoveTimelineItem {
        timeline_id: TimelineId,
    },
    SetViewport {
        patch: ViewportPatch,
    },
    SetSelection {
        selection: Selection,
    },
}

impl Step {
    /// Stable kebab-case name for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddBlock { .. } => "add-block",
            Self::RemoveBlock { .. } => "remove-block",
            Self::UpdateBlockLayout { .. } => "update-block-layout",
            Self::AddConnector { .. } => "add-connector",
            Self::RemoveConnector { .. } => "remove-connector",
            Self::AddTimelineItem { .. } => "add-timeline-item",
            Self::UpdateTimelineItem { .. } => "update-timeline-item",
            Self::RemoveTimelineItem { .. } => "remove-timeline-item",
            Self::SetViewport { .. } => "set-viewport",
            Self::SetSelection { .. } => "set-selection",
        }
    }

    /// Apply with the default [`TripRules`].
    ///
    /// # Errors
    ///
    /// See [`Step::apply_with`].
    pub fn apply(&self, state: &EditorState) -> Result<EditorState, StepError> {
        self.apply_with(state, &TripRules)
    }

    /// Apply against `state`, checking blocks with `rules`.
    ///
    /// # Errors
    ///
    /// Returns a [`StepError`] for duplicate or missing entities and for any
    /// entity that would violate its invariants. `state` is never modified.
    pub fn apply_with(&self, state: &EditorState, rules: &dyn BlockRules) -> Result<EditorState, StepError> {
        match self {
            Self::AddBlock { block } => {
                if state.doc.blocks.contains_key(&block.id) {
                    return Err(StructuralError::DuplicateBlock(block.id.clone()).into());
                }
                validate::validate_block(block, rules)?;
                Ok(with_doc(state, |doc| {
                    doc.blocks.insert(block.id.clone(), block.clone());
                }))
            }
            Self::RemoveBlock { block_id } => {
                if !state.doc.blocks.contains_key(block_id) {
                    return Err(StructuralError::BlockNotFound(block_id.clone()).into());
                }
                let referrer = state
                    .doc
                    .connectors_touching(block_id)
                    .map(|c| c.id.clone())
                    .chain(state.doc.timeline_for_block(block_id).map(|t| t.id.clone()))
                    .next();
                if let Some(referrer) = referrer {
                    return Err(StructuralError::BlockStillReferenced { block: block_id.clone(), referrer }.into());
                }
                Ok(with_doc(state, |doc| {
                    doc.blocks.remove(block_id);
                }))
            }
            Self::UpdateBlockLayout { block_id, patch, touched_at } => {
                let Some(block) = state.doc.blocks.get(block_id) else {
                    return Err(StructuralError::BlockNotFound(block_id.clone()).into());
                };
                let updated = Block {
                    layout: block.layout.patched(patch),
                    updated_at: touched_at.unwrap_or(block.updated_at),
                    ..block.clone()
                };
                validate::validate_block(&updated, rules)?;
                Ok(with_doc(state, |doc| {
                    doc.blocks.insert(block_id.clone(), updated);
                }))
            }
            Self::AddConnector { connector } => {
                if state.doc.connectors.contains_key(&connector.id) {
                    return Err(StructuralError::DuplicateConnector(connector.id.clone()).into());
                }
                validate::validate_connector(connector, &state.doc)?;
                Ok(with_doc(state, |doc| {
                    doc.connectors.insert(connector.id.clone(), connector.clone());
                }))
            }
            Self::RemoveConnector { connector_id } => {
                if !state.doc.connectors.contains_key(connector_id) {
                    return Err(StructuralError::ConnectorNotFound(connector_id.clone()).into());
                }
                Ok(with_doc(state, |doc| {
                    doc.connectors.remove(connector_id);
                }))
            }
            Self::AddTimelineItem { item } => {
                if state.doc.timeline.contains_key(&item.id) {
                    return Err(StructuralError::DuplicateTimelineItem(item.id.clone()).into());
                }
                validate::validate_timeline_item(item, &state.doc)?;
                Ok(with_doc(state, |doc| {
                    doc.timeline.insert(item.id.clone(), item.clone());
                }))
            }
            Self::UpdateTimelineItem { timeline_id, patch } => {
                let Some(item) = state.doc.timeline.get(timeline_id) else {
                    return Err(StructuralError::TimelineItemNotFound(timeline_id.clone()).into());
                };
                let updated = item.patched(patch);
                validate::validate_timeline_item(&updated, &state.doc)?;
                Ok(with_doc(state, |doc| {
                    doc.timeline.insert(timeline_id.clone(), updated);
                }))
            }
            Self::RemoveTimelineItem { timeline_id } => {
                if !state.doc.timeline.contains_key(timeline_id) {
                    return Err(StructuralError::TimelineItemNotFound(timeline_id.clone()).into());
                }
                Ok(with_doc(state, |doc| {
                    doc.timeline.remove(timeline_id);
                }))
            }
            Self::SetViewport { patch } => {
                let viewport = state.viewport.patched(patch);
                validate::validate_viewport(&viewport)?;
                Ok(EditorState { viewport, ..state.clone() })
            }
            Self::SetSelection { selection } => Ok(EditorState { selection: selection.clone(), ..state.clone() }),
        }
    }

    /// Build the step that undoes `self`, given the state it was applied to.
    ///
    /// # Errors
    ///
    /// [`InvariantViolation`] when `before` lacks the entity the inverse has
    /// to restore.
    pub fn invert(&self, before: &EditorState) -> Result<Step, InvariantViolation> {
        let doc = &before.doc;
        let step = self.name();
        let inverse = match self {
            Self::AddBlock { block } => Self::RemoveBlock { block_id: block.id.clone() },
            Self::RemoveBlock { block_id } => {
                let block = doc
                    .block(block_id)
                    .ok_or_else(|| InvariantViolation::MissingBlock { step, id: block_id.clone() })?;
                Self::AddBlock { block: block.clone() }
            }
            Self::UpdateBlockLayout { block_id, .. } => {
                let block = doc
                    .block(block_id)
                    .ok_or_else(|| InvariantViolation::MissingBlock { step, id: block_id.clone() })?;
                Self::UpdateBlockLayout {
                    block_id: block_id.clone(),
                    patch: LayoutPatch::full(&block.layout),
                    touched_at: Some(block.updated_at),
                }
            }
            Self::AddConnector { connector } => Self::RemoveConnector { connector_id: connector.id.clone() },
            Self::RemoveConnector { connector_id } => {
                let connector = doc
                    .connector(connector_id)
                    .ok_or_else(|| InvariantViolation::MissingConnector { step, id: connector_id.clone() })?;
                Self::AddConnector { connector: connector.clone() }
            }
            Self::AddTimelineItem { item } => Self::RemoveTimelineItem { timeline_id: item.id.clone() },
            Self::UpdateTimelineItem { timeline_id, .. } => {
                let item = doc
                    .timeline_item(timeline_id)
                    .ok_or_else(|| InvariantViolation::MissingTimelineItem { step, id: timeline_id.clone() })?;
                Self::UpdateTimelineItem { timeline_id: timeline_id.clone(), patch: TimelinePatch::full(item) }
            }
            Self::RemoveTimelineItem { timeline_id } => {
                let item = doc
                    .timeline_item(timeline_id)
                    .ok_or_else(|| InvariantViolation::MissingTimelineItem { step, id: timeline_id.clone() })?;
                Self::AddTimelineItem { item: item.clone() }
            }
            Self::SetViewport { .. } => Self::SetViewport { patch: before.viewport.into() },
            Self::SetSelection { .. } => Self::SetSelection { selection: before.selection.clone() },
        };
        Ok(inverse)
    }
}

/// New state whose document is `state.doc` after `edit`.
fn with_doc(state: &EditorState, edit: impl FnOnce(&mut Document)) -> EditorState {
    let mut doc = state.doc.clone();
    edit(&mut doc);
    EditorState { doc, ..state.clone() }
}
