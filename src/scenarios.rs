//! Synthetic boards for the perf lab.
//!
//! Every scenario is a document of note blocks joined by a chain of
//! connectors, with the viewport centered on the board. Ids come from a
//! [`SequentialIds`] counter so two runs produce the same board.

#[cfg(test)]
#[path = "scenarios_test.rs"]
mod scenarios_test;

use clap::ValueEnum;
use editor::doc::ArrowHead;
use editor::factory::create_note_block;
use editor::ids::{IdGenerator, SequentialIds};
use editor::{BlockId, Connector, ConnectorStyle, Document, EditorState, Vec2, Viewport};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::lab::LabError;

const CONNECTOR_COLOR: &str = "#90a4ae";

/// Jitter half-extents around a cluster center.
const CLUSTER_JITTER: (f64, f64) = (160.0, 110.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
pub enum Scenario {
    /// 1024 notes on a regular grid.
    #[value(name = "grid-1k")]
    #[serde(rename = "grid-1k")]
    Grid1k,
    /// 3072 notes on a regular grid.
    #[value(name = "grid-3k")]
    #[serde(rename = "grid-3k")]
    Grid3k,
    /// 5000 notes spread over nine clusters.
    #[value(name = "cluster-5k")]
    #[serde(rename = "cluster-5k")]
    Cluster5k,
}

struct GridShape {
    blocks: usize,
    connectors_per_block: f64,
    gap: f64,
    zoom: f64,
}

struct ClusterShape {
    blocks: usize,
    clusters: usize,
    spacing: f64,
    connectors_per_block: f64,
    zoom: f64,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Grid1k, Scenario::Grid3k, Scenario::Cluster5k];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Scenario::Grid1k => "grid-1k",
            Scenario::Grid3k => "grid-3k",
            Scenario::Cluster5k => "cluster-5k",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Scenario::Grid1k => "Perf Grid 1k",
            Scenario::Grid3k => "Perf Grid 3k",
            Scenario::Cluster5k => "Perf Cluster 5k",
        }
    }

    /// Build the board. `seed` only affects cluster jitter.
    ///
    /// # Errors
    ///
    /// Propagates block validation failures.
    pub fn build(self, seed: u64) -> Result<EditorState, LabError> {
        match self {
            Scenario::Grid1k => {
                grid(self, &GridShape { blocks: 1024, connectors_per_block: 0.5, gap: 240.0, zoom: 0.6 })
            }
            Scenario::Grid3k => {
                grid(self, &GridShape { blocks: 3072, connectors_per_block: 0.4, gap: 220.0, zoom: 0.45 })
            }
            Scenario::Cluster5k => clusters(
                self,
                &ClusterShape { blocks: 5000, clusters: 9, spacing: 600.0, connectors_per_block: 0.6, zoom: 0.35 },
                seed,
            ),
        }
    }
}

fn grid(scenario: Scenario, shape: &GridShape) -> Result<EditorState, LabError> {
    let mut ids = SequentialIds::new();
    let mut doc = Document::new(format!("perf-grid-{}", shape.blocks), scenario.title());

    let per_row = ceil_sqrt(shape.blocks);
    let rows = shape.blocks.div_ceil(per_row);
    let mut block_ids = Vec::with_capacity(shape.blocks);
    for i in 0..shape.blocks {
        let position = Vec2::new(as_f64(i % per_row) * shape.gap, as_f64(i / per_row) * shape.gap);
        let block = create_note_block(format!("Block {i}"), position, &mut ids, 0)?;
        block_ids.push(block.id.clone());
        doc.blocks.insert(block.id.clone(), block);
    }

    chain_connectors(&mut doc, &block_ids, connector_target(shape.blocks, shape.connectors_per_block), 1, &mut ids);

    let width = as_f64(per_row.saturating_sub(1).max(1)) * shape.gap;
    let height = as_f64(rows.saturating_sub(1).max(1)) * shape.gap;
    let mut state = EditorState::new(doc);
    state.viewport = Viewport { center: Vec2::new(width / 2.0, height / 2.0), zoom: shape.zoom };
    Ok(state)
}

fn clusters(scenario: Scenario, shape: &ClusterShape, seed: u64) -> Result<EditorState, LabError> {
    let mut ids = SequentialIds::new();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut doc = Document::new(format!("perf-cluster-{}", shape.blocks), scenario.title());

    let columns = ceil_sqrt(shape.clusters);
    let pitch = shape.spacing * 1.5;
    let centers: Vec<Vec2> = (0..shape.clusters)
        .map(|i| Vec2::new(as_f64(i % columns) * pitch, as_f64(i / columns) * pitch))
        .collect();

    let mut block_ids = Vec::with_capacity(shape.blocks);
    for (i, center) in (0..shape.blocks).zip(centers.iter().cycle()) {
        let (jx, jy) = CLUSTER_JITTER;
        let position = center.offset(Vec2::new(rng.random_range(-jx..jx), rng.random_range(-jy..jy)));
        let block = create_note_block(format!("Cluster {i}"), position, &mut ids, 0)?;
        block_ids.push(block.id.clone());
        doc.blocks.insert(block.id.clone(), block);
    }

    // Each connector links a block to its counterpart in the next cluster.
    chain_connectors(
        &mut doc,
        &block_ids,
        connector_target(shape.blocks, shape.connectors_per_block),
        centers.len(),
        &mut ids,
    );

    let last = centers.last().copied().unwrap_or_default();
    let mut state = EditorState::new(doc);
    state.viewport = Viewport { center: Vec2::new(last.x / 2.0, last.y / 2.0), zoom: shape.zoom };
    Ok(state)
}

/// Connect block `i` to block `i + stride` (wrapping) for the first `count` blocks.
fn chain_connectors(doc: &mut Document, block_ids: &[BlockId], count: usize, stride: usize, ids: &mut dyn IdGenerator) {
    let n = block_ids.len();
    if n < 2 {
        return;
    }
    for i in 0..count {
        let from = &block_ids[i % n];
        let to = &block_ids[(i + stride) % n];
        if from == to {
            continue;
        }
        let mut connector = Connector::between(ids.next_id("connector"), from.clone(), to.clone());
        connector.style =
            ConnectorStyle { color: CONNECTOR_COLOR.into(), width: 2.0, dashed: false, arrow_head: ArrowHead::End };
        doc.connectors.insert(connector.id.clone(), connector);
    }
}

/// `min(n - 1, floor(n * per_block))`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn connector_target(blocks: usize, per_block: f64) -> usize {
    let wanted = (as_f64(blocks) * per_block).floor().max(0.0) as usize;
    wanted.min(blocks.saturating_sub(1))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn ceil_sqrt(n: usize) -> usize {
    (as_f64(n).sqrt().ceil() as usize).max(1)
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(n: usize) -> f64 {
    n as f64
}
