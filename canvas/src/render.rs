//! Draw routines for the three layers.
//!
//! These functions turn render primitives into [`Surface`] calls in screen
//! space. They read the camera and primitives and never touch renderer state;
//! which primitives to draw, and with which bounds, is decided by
//! [`crate::renderer::Renderer`].

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use editor::doc::ArrowHead;

use crate::camera::Camera;
use crate::consts::{
    ARROW_ANGLE, ARROW_SIZE_PX, BACKGROUND_GRID_COLOR, CONNECTOR_DASH_PX, LABEL_FONT, SELECTION_COLOR,
    SELECTION_DASH_PX, SELECTION_LINE_WIDTH, SELECTION_PAD_PX,
};
use crate::geom::{Point, Rect};
use crate::scene::{RenderBlock, RenderConnector};
use crate::surface::{Stroke, Surface, SurfaceError};

/// Grid lines closer than this many screen pixels are skipped.
const MIN_GRID_STEP_PX: f64 = 4.0;

/// Full-canvas rectangle in screen space.
#[must_use]
pub fn screen_rect(camera: &Camera) -> Rect {
    Rect::new(0.0, 0.0, camera.width, camera.height)
}

// =============================================================
// Background
// =============================================================

/// Clear the background layer and draw the world-aligned grid.
///
/// # Errors
///
/// Propagates surface failures.
pub fn draw_background(surface: &mut dyn Surface, camera: &Camera, spacing: f64) -> Result<(), SurfaceError> {
    surface.clear(&screen_rect(camera))?;

    let step = spacing * camera.zoom;
    if !step.is_finite() || step < MIN_GRID_STEP_PX {
        return Ok(());
    }

    let stroke = Stroke::solid(BACKGROUND_GRID_COLOR, 1.0);
    let visible = camera.visible_world_rect();

    let mut x = camera.world_to_screen(Point::new((visible.x / spacing).floor() * spacing, 0.0)).x;
    while x <= camera.width {
        surface.line(Point::new(x, 0.0), Point::new(x, camera.height), &stroke)?;
        x += step;
    }
    let mut y = camera.world_to_screen(Point::new(0.0, (visible.y / spacing).floor() * spacing)).y;
    while y <= camera.height {
        surface.line(Point::new(0.0, y), Point::new(camera.width, y), &stroke)?;
        y += step;
    }
    Ok(())
}

// =============================================================
// Main layer
// =============================================================

/// Draw a block face at `bounds` (world space), which may differ from the
/// committed bounds during a drag preview.
///
/// # Errors
///
/// Propagates surface failures.
pub fn draw_block(
    surface: &mut dyn Surface,
    camera: &Camera,
    block: &RenderBlock,
    bounds: &Rect,
) -> Result<(), SurfaceError> {
    let screen = camera.world_rect_to_screen(bounds);
    let style = &block.style;

    surface.fill_rect(&screen, style.border_radius, style.background)?;
    surface.stroke_rect(&screen, style.border_radius, &Stroke::solid(style.border, style.border_width))?;

    if block.label.is_empty() {
        return Ok(());
    }
    // The label never paints outside the block face, so the block extent
    // bounds everything this call draws.
    surface.save()?;
    let drawn = surface
        .clip(&screen)
        .and_then(|()| surface.text(&block.label, screen.center(), style.text_color, LABEL_FONT));
    surface.restore()?;
    drawn
}

/// World-space extent a block may paint at `bounds`, border stroke included.
#[must_use]
pub fn block_extent(camera: &Camera, block: &RenderBlock, bounds: &Rect) -> Rect {
    bounds.inflate(camera.screen_dist_to_world(block.style.border_width))
}

/// Draw a straight connector between the centers of two world rectangles.
///
/// # Errors
///
/// Propagates surface failures.
pub fn draw_connector(
    surface: &mut dyn Surface,
    camera: &Camera,
    connector: &RenderConnector,
    from: &Rect,
    to: &Rect,
) -> Result<(), SurfaceError> {
    let a = camera.world_to_screen(from.center());
    let b = camera.world_to_screen(to.center());
    let style = &connector.style;
    let stroke = if style.dashed {
        Stroke::dashed(&style.color, style.width, CONNECTOR_DASH_PX)
    } else {
        Stroke::solid(&style.color, style.width)
    };

    surface.line(a, b, &stroke)?;

    match style.arrow_head {
        ArrowHead::None => {}
        ArrowHead::End => surface.polygon(&arrowhead(a, b), &style.color)?,
        ArrowHead::Both => {
            surface.polygon(&arrowhead(a, b), &style.color)?;
            surface.polygon(&arrowhead(b, a), &style.color)?;
        }
    }
    Ok(())
}

/// Triangle with its tip at `tip`, pointing away from `tail`.
#[must_use]
pub fn arrowhead(tail: Point, tip: Point) -> [Point; 3] {
    let angle = (tip.y - tail.y).atan2(tip.x - tail.x);
    [
        tip,
        Point::new(tip.x - ARROW_SIZE_PX * (angle - ARROW_ANGLE).cos(), tip.y - ARROW_SIZE_PX * (angle - ARROW_ANGLE).sin()),
        Point::new(tip.x - ARROW_SIZE_PX * (angle + ARROW_ANGLE).cos(), tip.y - ARROW_SIZE_PX * (angle + ARROW_ANGLE).sin()),
    ]
}

/// World-space extent a connector may paint, arrowheads and stroke included.
#[must_use]
pub fn connector_extent(camera: &Camera, connector: &RenderConnector, from: &Rect, to: &Rect) -> Rect {
    let (a, b) = (from.center(), to.center());
    let span = Rect::new(a.x.min(b.x), a.y.min(b.y), (a.x - b.x).abs(), (a.y - b.y).abs());
    span.inflate(camera.screen_dist_to_world(ARROW_SIZE_PX + connector.style.width))
}

// =============================================================
// Overlay
// =============================================================

/// Dashed outline around a selected block.
///
/// # Errors
///
/// Propagates surface failures.
pub fn draw_selection(surface: &mut dyn Surface, camera: &Camera, bounds: &Rect) -> Result<(), SurfaceError> {
    let outline = camera.world_rect_to_screen(bounds).inflate(SELECTION_PAD_PX);
    surface.stroke_rect(&outline, 0.0, &Stroke::dashed(SELECTION_COLOR, SELECTION_LINE_WIDTH, SELECTION_DASH_PX))
}
