//! Pending repaint regions between frames.

#[cfg(test)]
#[path = "dirty_test.rs"]
mod dirty_test;

use crate::geom::Rect;

/// What the next frame has to repaint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Damage {
    /// Repaint every layer from scratch.
    Full,
    /// Repaint the main layer inside this padded world rectangle.
    Region(Rect),
}

/// Accumulates world-space rectangles that need repainting.
#[derive(Debug, Clone)]
pub struct DirtyTracker {
    full: bool,
    rects: Vec<Rect>,
}

impl Default for DirtyTracker {
    /// Starts full so the first frame paints everything.
    fn default() -> Self {
        Self { full: true, rects: Vec::new() }
    }
}

impl DirtyTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_full(&mut self) {
        self.full = true;
        self.rects.clear();
    }

    /// Queue a region. Ignored while a full repaint is already pending.
    pub fn add(&mut self, rect: Rect) {
        if !self.full {
            self.rects.push(rect);
        }
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.full
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.rects.len()
    }

    /// Peek at the damage without resetting. With nothing queued the whole
    /// frame is repainted.
    #[must_use]
    pub fn damage(&self, padding: f64) -> Damage {
        if self.full {
            return Damage::Full;
        }
        Rect::bounding(&self.rects).map_or(Damage::Full, |r| Damage::Region(r.inflate(padding)))
    }

    /// Resolve the pending damage and reset to clean.
    pub fn take(&mut self, padding: f64) -> Damage {
        let damage = self.damage(padding);
        self.full = false;
        self.rects.clear();
        damage
    }
}
