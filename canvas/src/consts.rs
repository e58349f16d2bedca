//! Shared numeric constants for the canvas crate.

// ── Spatial index ───────────────────────────────────────────────

/// Edge length of a spatial grid cell, in world units.
pub const GRID_CELL_SIZE: f64 = 100.0;

/// Cells one entry may occupy before it moves to the index's side list.
pub const MAX_CELLS_PER_ENTRY: u64 = 4096;

// ── Dirty regions ───────────────────────────────────────────────

/// World-space margin added around a dirty region to cover stroke width and
/// antialiasing bleed.
pub const DIRTY_PADDING: f64 = 4.0;

// ── Background ──────────────────────────────────────────────────

/// Spacing of the background grid in world units.
pub const BACKGROUND_GRID_SPACING: f64 = 20.0;

pub const BACKGROUND_GRID_COLOR: &str = "#e0e0e0";

// ── Selection overlay ───────────────────────────────────────────

/// Screen-space gap between a block and its selection outline.
pub const SELECTION_PAD_PX: f64 = 2.0;

pub const SELECTION_DASH_PX: [f64; 2] = [4.0, 4.0];

pub const SELECTION_COLOR: &str = "#2196f3";

pub const SELECTION_LINE_WIDTH: f64 = 2.0;

// ── Connectors ──────────────────────────────────────────────────

pub const CONNECTOR_DASH_PX: [f64; 2] = [5.0, 5.0];

/// Arrowhead length in screen pixels.
pub const ARROW_SIZE_PX: f64 = 10.0;

/// Arrowhead half-angle in radians (~30°).
pub const ARROW_ANGLE: f64 = std::f64::consts::PI / 6.0;

// ── Blocks ──────────────────────────────────────────────────────

/// Widest block border in screen pixels. Index queries grow by this much so
/// a block whose stroke alone reaches the damage region is still found.
pub const MAX_BORDER_WIDTH_PX: f64 = 2.0;

// ── Labels ──────────────────────────────────────────────────────

pub const LABEL_FONT: &str = "14px sans-serif";

/// Characters of note text shown on the block face.
pub const NOTE_LABEL_CHARS: usize = 20;

// ── Telemetry ───────────────────────────────────────────────────

/// Weight of the newest sample in the smoothed FPS average.
pub const FPS_SMOOTHING: f64 = 0.2;
