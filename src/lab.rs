//! Headless frame loop and the report it produces.
//!
//! Frames run synchronously against [`RecordingSurface`] layers: the action
//! advances the board, the renderer picks up the new state, and one frame is
//! painted. Recorded draw ops are discarded after every frame.

#[cfg(test)]
#[path = "lab_test.rs"]
mod lab_test;

use std::time::Instant;

use canvas::renderer::Layers;
use canvas::{RecordingSurface, RenderError, RenderStats, Renderer, RendererConfig};
use editor::{CommandError, ValidationError};
use serde::Serialize;

use crate::actions::{Action, ActionDriver};
use crate::config::LabConfig;
use crate::scenarios::Scenario;

#[derive(Debug, thiserror::Error)]
pub enum LabError {
    #[error("invalid lab config: {0}")]
    InvalidConfig(String),
    #[error("scenario block rejected: {0}")]
    Scenario(#[from] ValidationError),
    #[error("action command rejected: {0}")]
    Command(#[from] CommandError),
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("report encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Distribution of per-frame wall time in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FrameMetrics {
    pub count: usize,
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    /// Frames per second over the summed frame time.
    pub fps: f64,
}

impl FrameMetrics {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_millis(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let mut ms = samples.to_vec();
        ms.sort_by(f64::total_cmp);

        let count = ms.len();
        let total: f64 = ms.iter().sum();
        Self {
            count,
            min_ms: ms.first().copied().unwrap_or_default(),
            max_ms: ms.last().copied().unwrap_or_default(),
            avg_ms: total / count as f64,
            p50_ms: percentile(&ms, 0.50),
            p95_ms: percentile(&ms, 0.95),
            p99_ms: percentile(&ms, 0.99),
            fps: count as f64 / (total / 1000.0).max(1e-9),
        }
    }
}

/// Summary of one lab run.
#[derive(Debug, Clone, Serialize)]
pub struct LabReport {
    pub scenario: Scenario,
    pub action: Action,
    pub blocks: usize,
    pub connectors: usize,
    /// Blocks the action moved, zero for viewport actions.
    pub moved_blocks: usize,
    pub frames: u64,
    pub full_repaints: u64,
    pub avg_blocks_rendered: f64,
    pub avg_connectors_rendered: f64,
    pub avg_dirty_area_ratio: f64,
    /// Action, state hand-off and paint together.
    pub frame: FrameMetrics,
    /// Paint only, as measured by the renderer.
    pub render: FrameMetrics,
    /// Renderer telemetry after the last frame.
    pub last: RenderStats,
}

impl LabReport {
    /// # Errors
    ///
    /// Serialization failure.
    pub fn to_json(&self) -> Result<String, LabError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Default)]
struct Totals {
    frame_ms: Vec<f64>,
    render_ms: Vec<f64>,
    full_repaints: u64,
    blocks: u64,
    connectors: u64,
    dirty_ratio: f64,
}

impl Totals {
    fn add(&mut self, frame_ms: f64, stats: &RenderStats) {
        self.frame_ms.push(frame_ms);
        self.render_ms.push(stats.frame_time_ms);
        self.full_repaints += u64::from(stats.full_repaint);
        self.blocks += stats.blocks_rendered as u64;
        self.connectors += stats.connectors_rendered as u64;
        self.dirty_ratio += stats.dirty_area_ratio;
    }

    #[allow(clippy::cast_precision_loss)]
    fn mean(&self, sum: f64) -> f64 {
        if self.frame_ms.is_empty() { 0.0 } else { sum / self.frame_ms.len() as f64 }
    }
}

/// Run `config.frames` frames of `config.action` on `config.scenario`.
///
/// # Errors
///
/// Invalid config, a rejected scenario or action command, or a render failure.
#[allow(clippy::cast_precision_loss)]
pub fn run(config: &LabConfig) -> Result<LabReport, LabError> {
    config.validate()?;
    let mut state = config.scenario.build(config.seed)?;
    tracing::info!(
        scenario = config.scenario.id(),
        blocks = state.doc.blocks.len(),
        connectors = state.doc.connectors.len(),
        "scenario built"
    );

    let mut renderer = Renderer::new(
        Layers::<RecordingSurface>::default(),
        config.width,
        config.height,
        config.pixel_ratio,
        RendererConfig::default(),
    )?;
    renderer.update_state(&state)?;
    let mut driver = ActionDriver::new(config.action, &state);

    let mut totals = Totals::default();
    let mut last = RenderStats::default();
    for step in 0..config.frames {
        let started = Instant::now();
        if let Some(next) = driver.apply(&state, step, &mut renderer)? {
            renderer.update_state(&next)?;
            state = next;
        }
        last = renderer.render()?;
        let frame_ms = started.elapsed().as_secs_f64() * 1000.0;
        discard_ops(&mut renderer);
        totals.add(frame_ms, &last);

        if config.progress_every > 0 && (step + 1) % config.progress_every == 0 {
            tracing::info!(frame = step + 1, fps = last.fps, frame_time_ms = last.frame_time_ms, "lab progress");
        }
    }
    driver.finish(&mut renderer);

    Ok(LabReport {
        scenario: config.scenario,
        action: config.action,
        blocks: state.doc.blocks.len(),
        connectors: state.doc.connectors.len(),
        moved_blocks: driver.moved_blocks(),
        frames: config.frames,
        full_repaints: totals.full_repaints,
        avg_blocks_rendered: totals.mean(totals.blocks as f64),
        avg_connectors_rendered: totals.mean(totals.connectors as f64),
        avg_dirty_area_ratio: totals.mean(totals.dirty_ratio),
        frame: FrameMetrics::from_millis(&totals.frame_ms),
        render: FrameMetrics::from_millis(&totals.render_ms),
        last,
    })
}

fn discard_ops(renderer: &mut Renderer<RecordingSurface>) {
    let layers = renderer.layers_mut();
    for surface in [&mut layers.background, &mut layers.main, &mut layers.overlay] {
        surface.take_ops();
    }
}

/// Nearest-rank percentile of an ascending slice. Empty input yields zero.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return 0.0;
    };
    let index = ((last as f64) * p.clamp(0.0, 1.0)).round() as usize;
    sorted.get(index.min(last)).copied().unwrap_or_default()
}
