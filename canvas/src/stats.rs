//! Frame timing and coverage telemetry.

#[cfg(test)]
#[path = "stats_test.rs"]
mod stats_test;

use serde::Serialize;

use crate::consts::FPS_SMOOTHING;

/// Raw measurements for one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameSample {
    pub frame_time_ms: f64,
    pub blocks_rendered: usize,
    pub connectors_rendered: usize,
    /// Repainted pixel area over canvas area.
    pub dirty_area_ratio: f64,
    pub full_repaint: bool,
}

/// Snapshot returned after every frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RenderStats {
    pub frame_time_ms: f64,
    /// Exponentially smoothed frames per second.
    pub fps: f64,
    pub blocks_rendered: usize,
    pub connectors_rendered: usize,
    /// Clamped to `[0, 1]`; 1.0 for a full repaint.
    pub dirty_area_ratio: f64,
    pub full_repaint: bool,
    /// 1-based count of frames recorded since the last reset.
    pub frame: u64,
}

#[derive(Debug, Clone)]
pub struct StatsTracker {
    smoothing: f64,
    last: RenderStats,
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new(FPS_SMOOTHING)
    }
}

impl StatsTracker {
    /// `smoothing` is the weight of the newest sample, clamped to `[0, 1]`.
    #[must_use]
    pub fn new(smoothing: f64) -> Self {
        let smoothing = if smoothing.is_nan() { FPS_SMOOTHING } else { smoothing.clamp(0.0, 1.0) };
        Self { smoothing, last: RenderStats::default() }
    }

    /// Fold a sample into the running average. The first sample after a reset
    /// seeds the average directly.
    pub fn record(&mut self, sample: FrameSample) -> RenderStats {
        let instant = if sample.frame_time_ms > 0.0 { 1000.0 / sample.frame_time_ms } else { 0.0 };
        let fps = if self.last.frame == 0 {
            instant
        } else {
            self.smoothing.mul_add(instant - self.last.fps, self.last.fps)
        };

        self.last = RenderStats {
            frame_time_ms: sample.frame_time_ms,
            fps: if fps.is_finite() { fps } else { 0.0 },
            blocks_rendered: sample.blocks_rendered,
            connectors_rendered: sample.connectors_rendered,
            dirty_area_ratio: clamp_unit(sample.dirty_area_ratio),
            full_repaint: sample.full_repaint,
            frame: self.last.frame + 1,
        };
        self.last
    }

    #[must_use]
    pub fn snapshot(&self) -> RenderStats {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = RenderStats::default();
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
