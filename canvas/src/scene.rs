//! Projection of an editor document into render primitives.
//!
//! The scene is rebuilt from scratch on every state update. It carries only
//! what drawing and hit-testing need: committed bounds, stacking order, a
//! resolved style and a short label per block, and the endpoints of every
//! connector whose blocks both exist.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::HashMap;

use editor::doc::ArrowHead;
use editor::{Block, BlockId, BlockKind, BlockPayload, ConnectorId, Document};

use crate::consts::NOTE_LABEL_CHARS;
use crate::geom::Rect;

/// Resolved paint for a block face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStyle {
    pub background: &'static str,
    pub border: &'static str,
    pub border_width: f64,
    pub border_radius: f64,
    pub text_color: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorRenderStyle {
    pub color: String,
    pub width: f64,
    pub dashed: bool,
    pub arrow_head: ArrowHead,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderBlock {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Committed world bounds.
    pub bounds: Rect,
    pub rotation: f64,
    pub z_index: i64,
    pub style: BlockStyle,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConnector {
    pub id: ConnectorId,
    pub from: BlockId,
    pub to: BlockId,
    pub style: ConnectorRenderStyle,
    /// Always below blocks.
    pub z_index: i64,
}

/// Draw-ordered projection of a document.
#[derive(Debug, Clone, Default)]
pub struct RenderScene {
    /// Sorted by `(z_index, id)`, bottom first.
    pub blocks: Vec<RenderBlock>,
    pub connectors: Vec<RenderConnector>,
    by_id: HashMap<BlockId, usize>,
}

impl RenderScene {
    #[must_use]
    pub fn block(&self, id: &str) -> Option<&RenderBlock> {
        self.by_id.get(id).and_then(|&i| self.blocks.get(i))
    }

    /// Index of `id` in [`Self::blocks`], which is also its draw rank.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.connectors.is_empty()
    }
}

/// Build the scene for `doc`. Connectors with a missing endpoint are skipped.
#[must_use]
pub fn build_scene(doc: &Document) -> RenderScene {
    let mut blocks: Vec<RenderBlock> = doc.blocks.values().map(project_block).collect();
    blocks.sort_by(|a, b| a.z_index.cmp(&b.z_index).then_with(|| a.id.cmp(&b.id)));
    let by_id = blocks.iter().enumerate().map(|(i, b)| (b.id.clone(), i)).collect::<HashMap<_, _>>();

    let connectors = doc
        .connectors
        .values()
        .filter(|c| by_id.contains_key(&c.from) && by_id.contains_key(&c.to))
        .map(|c| RenderConnector {
            id: c.id.clone(),
            from: c.from.clone(),
            to: c.to.clone(),
            style: ConnectorRenderStyle {
                color: c.style.color.clone(),
                width: c.style.width,
                dashed: c.style.dashed,
                arrow_head: c.style.arrow_head,
            },
            z_index: -1,
        })
        .collect();

    RenderScene { blocks, connectors, by_id }
}

fn project_block(block: &Block) -> RenderBlock {
    RenderBlock {
        id: block.id.clone(),
        kind: block.kind(),
        bounds: Rect::from_layout(&block.layout),
        rotation: block.layout.rotation,
        z_index: block.layout.z_index,
        style: block_style(block.kind()),
        label: block_label(block),
    }
}

const DEFAULT_STYLE: BlockStyle = BlockStyle {
    background: "#f5f5f5",
    border: "#999",
    border_width: 1.0,
    border_radius: 4.0,
    text_color: "#333",
};

/// Face style for a block kind.
#[must_use]
pub fn block_style(kind: BlockKind) -> BlockStyle {
    match kind {
        BlockKind::Flight => BlockStyle {
            background: "#e3f2fd",
            border: "#1976d2",
            border_width: 2.0,
            border_radius: 8.0,
            text_color: "#1976d2",
        },
        BlockKind::Hotel => BlockStyle {
            background: "#f3e5f5",
            border: "#7b1fa2",
            border_width: 2.0,
            border_radius: 8.0,
            text_color: "#7b1fa2",
        },
        BlockKind::Note => BlockStyle {
            background: "#fff9c4",
            border: "#f57f17",
            border_width: 2.0,
            border_radius: 8.0,
            text_color: "#f57f17",
        },
        BlockKind::Attraction | BlockKind::Transport | BlockKind::Image => DEFAULT_STYLE,
    }
}

/// Short text drawn on the block face.
#[must_use]
pub fn block_label(block: &Block) -> String {
    match &block.payload {
        BlockPayload::Flight(f) => match f.flight_number.as_deref() {
            Some(number) if !number.is_empty() => number.to_owned(),
            _ => f.title.clone(),
        },
        BlockPayload::Hotel(h) => h.title.clone(),
        BlockPayload::Attraction(a) => a.title.clone(),
        BlockPayload::Transport(t) => t.title.clone(),
        BlockPayload::Note(n) => n.text.chars().take(NOTE_LABEL_CHARS).collect(),
        BlockPayload::Image(i) => match i.alt.as_deref() {
            Some(alt) if !alt.is_empty() => alt.to_owned(),
            _ => block.kind().as_str().to_owned(),
        },
    }
}
