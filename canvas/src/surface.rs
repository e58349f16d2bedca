//! Drawing surface abstraction.
//!
//! All coordinates are CSS pixels on the surface. The renderer talks to
//! surfaces only through [`Surface`], so the same code paints a browser canvas
//! ([`crate::web::CanvasSurface`]) or records draw calls for tests and the
//! headless perf lab ([`RecordingSurface`]).

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use crate::geom::{Point, Rect};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurfaceError {
    #[error("canvas call failed: {0}")]
    Backend(String),
    #[error("invalid surface size {width}x{height} @ {pixel_ratio}")]
    InvalidSize { width: f64, height: f64, pixel_ratio: f64 },
}

/// Outline paint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke<'a> {
    pub color: &'a str,
    pub width: f64,
    /// Dash pattern `[on, off]`, or solid when `None`.
    pub dash: Option<[f64; 2]>,
}

impl<'a> Stroke<'a> {
    #[must_use]
    pub fn solid(color: &'a str, width: f64) -> Self {
        Self { color, width, dash: None }
    }

    #[must_use]
    pub fn dashed(color: &'a str, width: f64, dash: [f64; 2]) -> Self {
        Self { color, width, dash: Some(dash) }
    }
}

/// A 2D drawing target.
pub trait Surface {
    /// Resize the backing store to `width`×`height` CSS pixels at the given
    /// device pixel ratio. Drawing state is reset.
    ///
    /// # Errors
    ///
    /// Non-positive or non-finite dimensions, or a backend failure.
    fn resize(&mut self, width: f64, height: f64, pixel_ratio: f64) -> Result<(), SurfaceError>;

    /// Erase `rect` to transparent.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn clear(&mut self, rect: &Rect) -> Result<(), SurfaceError>;

    /// # Errors
    ///
    /// Backend failure.
    fn save(&mut self) -> Result<(), SurfaceError>;

    /// # Errors
    ///
    /// Backend failure.
    fn restore(&mut self) -> Result<(), SurfaceError>;

    /// Intersect the clip region with `rect` until the matching `restore`.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn clip(&mut self, rect: &Rect) -> Result<(), SurfaceError>;

    /// # Errors
    ///
    /// Backend failure.
    fn fill_rect(&mut self, rect: &Rect, radius: f64, color: &str) -> Result<(), SurfaceError>;

    /// # Errors
    ///
    /// Backend failure.
    fn stroke_rect(&mut self, rect: &Rect, radius: f64, stroke: &Stroke<'_>) -> Result<(), SurfaceError>;

    /// # Errors
    ///
    /// Backend failure.
    fn line(&mut self, from: Point, to: Point, stroke: &Stroke<'_>) -> Result<(), SurfaceError>;

    /// Fill a closed polygon.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn polygon(&mut self, points: &[Point], color: &str) -> Result<(), SurfaceError>;

    /// Draw `text` centered on `at`.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn text(&mut self, text: &str, at: Point, color: &str, font: &str) -> Result<(), SurfaceError>;
}

pub(crate) fn check_size(width: f64, height: f64, pixel_ratio: f64) -> Result<(), SurfaceError> {
    let ok = |v: f64| v.is_finite() && v > 0.0;
    if ok(width) && ok(height) && ok(pixel_ratio) {
        Ok(())
    } else {
        Err(SurfaceError::InvalidSize { width, height, pixel_ratio })
    }
}

// =============================================================
// Recording surface
// =============================================================

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Resize { width: f64, height: f64, pixel_ratio: f64 },
    Clear(Rect),
    Save,
    Restore,
    Clip(Rect),
    FillRect { rect: Rect, radius: f64, color: String },
    StrokeRect { rect: Rect, radius: f64, color: String, width: f64, dashed: bool },
    Line { from: Point, to: Point, color: String, width: f64, dashed: bool },
    Polygon { points: Vec<Point>, color: String },
    Text { text: String, at: Point, color: String },
}

/// Surface that records every call instead of drawing.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    ops: Vec<DrawOp>,
    width: f64,
    height: f64,
    pixel_ratio: f64,
    depth: usize,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Drain the recorded calls.
    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    #[must_use]
    pub fn size(&self) -> (f64, f64, f64) {
        (self.width, self.height, self.pixel_ratio)
    }

    /// Current save/restore nesting.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Recorded label texts, in draw order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn resize(&mut self, width: f64, height: f64, pixel_ratio: f64) -> Result<(), SurfaceError> {
        check_size(width, height, pixel_ratio)?;
        self.width = width;
        self.height = height;
        self.pixel_ratio = pixel_ratio;
        self.depth = 0;
        self.ops.push(DrawOp::Resize { width, height, pixel_ratio });
        Ok(())
    }

    fn clear(&mut self, rect: &Rect) -> Result<(), SurfaceError> {
        self.ops.push(DrawOp::Clear(*rect));
        Ok(())
    }

    fn save(&mut self) -> Result<(), SurfaceError> {
        self.depth += 1;
        self.ops.push(DrawOp::Save);
        Ok(())
    }

    fn restore(&mut self) -> Result<(), SurfaceError> {
        if self.depth == 0 {
            return Err(SurfaceError::Backend("restore without save".into()));
        }
        self.depth -= 1;
        self.ops.push(DrawOp::Restore);
        Ok(())
    }

    fn clip(&mut self, rect: &Rect) -> Result<(), SurfaceError> {
        self.ops.push(DrawOp::Clip(*rect));
        Ok(())
    }

    fn fill_rect(&mut self, rect: &Rect, radius: f64, color: &str) -> Result<(), SurfaceError> {
        self.ops.push(DrawOp::FillRect { rect: *rect, radius, color: color.to_owned() });
        Ok(())
    }

    fn stroke_rect(&mut self, rect: &Rect, radius: f64, stroke: &Stroke<'_>) -> Result<(), SurfaceError> {
        self.ops.push(DrawOp::StrokeRect {
            rect: *rect,
            radius,
            color: stroke.color.to_owned(),
            width: stroke.width,
            dashed: stroke.dash.is_some(),
        });
        Ok(())
    }

    fn line(&mut self, from: Point, to: Point, stroke: &Stroke<'_>) -> Result<(), SurfaceError> {
        self.ops.push(DrawOp::Line {
            from,
            to,
            color: stroke.color.to_owned(),
            width: stroke.width,
            dashed: stroke.dash.is_some(),
        });
        Ok(())
    }

    fn polygon(&mut self, points: &[Point], color: &str) -> Result<(), SurfaceError> {
        self.ops.push(DrawOp::Polygon { points: points.to_vec(), color: color.to_owned() });
        Ok(())
    }

    fn text(&mut self, text: &str, at: Point, color: &str, _font: &str) -> Result<(), SurfaceError> {
        self.ops.push(DrawOp::Text { text: text.to_owned(), at, color: color.to_owned() });
        Ok(())
    }
}
