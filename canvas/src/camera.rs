#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use editor::Viewport;

use crate::geom::{Point, Rect};

/// Viewport transform for a canvas of a given CSS size.
///
/// `center` is the world point drawn at the middle of the canvas.
/// `zoom` is a scale factor (1.0 = one world unit per CSS pixel).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub center: Point,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { center: Point::default(), zoom: 1.0, width: 0.0, height: 0.0 }
    }
}

impl Camera {
    #[must_use]
    pub fn new(viewport: &Viewport, width: f64, height: f64) -> Self {
        Self { center: viewport.center.into(), zoom: viewport.zoom, width, height }
    }

    #[must_use]
    pub fn canvas_center(&self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }

    /// Convert a world-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        let c = self.canvas_center();
        Point {
            x: c.x + (world.x - self.center.x) * self.zoom,
            y: c.y + (world.y - self.center.y) * self.zoom,
        }
    }

    /// Convert a screen-space point (CSS pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        let c = self.canvas_center();
        Point {
            x: (screen.x - c.x) / self.zoom + self.center.x,
            y: (screen.y - c.y) / self.zoom + self.center.y,
        }
    }

    #[must_use]
    pub fn world_rect_to_screen(&self, rect: &Rect) -> Rect {
        let top_left = self.world_to_screen(Point::new(rect.x, rect.y));
        Rect::new(top_left.x, top_left.y, rect.width * self.zoom, rect.height * self.zoom)
    }

    /// World-space rectangle currently visible on the canvas.
    #[must_use]
    pub fn visible_world_rect(&self) -> Rect {
        let top_left = self.screen_to_world(Point::default());
        Rect::new(top_left.x, top_left.y, self.width / self.zoom, self.height / self.zoom)
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Canvas area in square CSS pixels.
    #[must_use]
    pub fn screen_area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}
