//! Per-frame drivers for the perf lab.
//!
//! An action either produces a new [`EditorState`] for the frame or works
//! directly on the renderer (drag preview). Anything the action needs from
//! the starting board is captured once in [`ActionDriver::new`].

#[cfg(test)]
#[path = "actions_test.rs"]
mod actions_test;

use canvas::geom::Point;
use canvas::{Renderer, Surface};
use clap::ValueEnum;
use editor::command::{self, CommandOptions, LayoutUpdate};
use editor::{BlockId, EditorState, LayoutPatch, TransactionSource, Vec2, ViewportPatch};
use serde::Serialize;

use crate::lab::LabError;

/// Blocks moved by the drag actions.
pub const DRAG_LIMIT: usize = 200;

const PAN_RADIUS: (f64, f64) = (600.0, 400.0);
const PAN_PERIOD: (f64, f64) = (80.0, 100.0);
const ZOOM_AMPLITUDE: f64 = 0.4;
const ZOOM_PERIOD: f64 = 90.0;
const MIN_ZOOM: f64 = 0.2;
const DRAG_AMPLITUDE: (f64, f64) = (80.0, 60.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Render the same board every frame.
    Idle,
    /// Orbit the viewport center on an ellipse.
    ViewportPan,
    /// Oscillate the zoom around its starting value.
    ViewportZoom,
    /// Move up to 200 blocks through `move_blocks` every frame.
    DragBatch,
    /// Move up to 200 blocks through the renderer's drag preview.
    DragPreview,
}

#[derive(Debug, Clone)]
struct Anchor {
    id: BlockId,
    base: Vec2,
    phase: f64,
}

#[derive(Debug, Clone)]
enum Memo {
    Nothing,
    Origin(Vec2),
    BaseZoom(f64),
    Anchors(Vec<Anchor>),
    Preview { ids: Vec<BlockId>, started: bool },
}

/// Applies one [`Action`] frame by frame.
#[derive(Debug, Clone)]
pub struct ActionDriver {
    action: Action,
    memo: Memo,
}

impl ActionDriver {
    #[must_use]
    pub fn new(action: Action, state: &EditorState) -> Self {
        let memo = match action {
            Action::Idle => Memo::Nothing,
            Action::ViewportPan => Memo::Origin(state.viewport.center),
            Action::ViewportZoom => Memo::BaseZoom(state.viewport.zoom),
            Action::DragBatch => Memo::Anchors(
                state
                    .doc
                    .blocks
                    .values()
                    .take(DRAG_LIMIT)
                    .zip(0u32..)
                    .map(|(block, i)| Anchor { id: block.id.clone(), base: block.layout.position, phase: f64::from(i) })
                    .collect(),
            ),
            Action::DragPreview => {
                Memo::Preview { ids: state.doc.blocks.keys().take(DRAG_LIMIT).cloned().collect(), started: false }
            }
        };
        Self { action, memo }
    }

    #[must_use]
    pub fn action(&self) -> Action {
        self.action
    }

    /// Number of blocks a drag action moves.
    #[must_use]
    pub fn moved_blocks(&self) -> usize {
        match &self.memo {
            Memo::Anchors(anchors) => anchors.len(),
            Memo::Preview { ids, .. } => ids.len(),
            _ => 0,
        }
    }

    /// Advance to frame `step`. `Some` carries the state the renderer must
    /// pick up; `None` means the document and viewport are unchanged.
    ///
    /// # Errors
    ///
    /// Propagates a rejected command.
    #[allow(clippy::cast_precision_loss)]
    pub fn apply<S: Surface>(
        &mut self,
        state: &EditorState,
        step: u64,
        renderer: &mut Renderer<S>,
    ) -> Result<Option<EditorState>, LabError> {
        let t = step as f64;
        match &mut self.memo {
            Memo::Nothing => Ok(None),
            Memo::Origin(origin) => {
                let center = origin
                    .offset(Vec2::new((t / PAN_PERIOD.0).cos() * PAN_RADIUS.0, (t / PAN_PERIOD.1).sin() * PAN_RADIUS.1));
                Ok(Some(command::set_viewport(state, ViewportPatch { center: Some(center), zoom: None })?))
            }
            Memo::BaseZoom(base) => {
                let zoom = zoom_at(*base, t);
                Ok(Some(command::set_viewport(state, ViewportPatch { center: None, zoom: Some(zoom) })?))
            }
            Memo::Anchors(anchors) => {
                if anchors.is_empty() {
                    return Ok(None);
                }
                let updates: Vec<LayoutUpdate> = anchors
                    .iter()
                    .map(|a| {
                        let wave = Vec2::new(
                            ((t + a.phase * 3.0) / 25.0).sin() * DRAG_AMPLITUDE.0,
                            ((t + a.phase * 2.0) / 30.0).cos() * DRAG_AMPLITUDE.1,
                        );
                        LayoutUpdate::new(a.id.clone(), LayoutPatch::position(a.base.offset(wave)))
                    })
                    .collect();
                let options = CommandOptions::default()
                    .without_history()
                    .source(TransactionSource::System)
                    .label("perf-drag")
                    .at(i64::try_from(step).unwrap_or(i64::MAX));
                Ok(Some(command::move_blocks(state, &updates, &options)?))
            }
            Memo::Preview { ids, started } => {
                if ids.is_empty() {
                    return Ok(None);
                }
                if !*started {
                    renderer.begin_drag_preview(ids.iter().cloned());
                    *started = true;
                }
                let offset = Point::new((t / 25.0).sin() * DRAG_AMPLITUDE.0, (t / 30.0).cos() * DRAG_AMPLITUDE.1);
                renderer.update_drag_preview(offset);
                Ok(None)
            }
        }
    }

    /// Close anything the action opened on the renderer.
    pub fn finish<S: Surface>(&mut self, renderer: &mut Renderer<S>) {
        if let Memo::Preview { started, .. } = &mut self.memo {
            if *started {
                renderer.end_drag_preview();
                *started = false;
            }
        }
    }
}

fn zoom_at(base: f64, t: f64) -> f64 {
    (base + (t / ZOOM_PERIOD).sin() * ZOOM_AMPLITUDE).max(MIN_ZOOM)
}
