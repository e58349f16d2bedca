//! Browser bindings: a [`Surface`] over `CanvasRenderingContext2d` and the
//! `wasm-bindgen` handle the host page drives.
//!
//! This is the only module that touches `web_sys`. Canvas calls that can
//! throw are mapped to [`SurfaceError::Backend`].

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::geom::{Point, Rect};
use crate::renderer::{Layers, RenderError, Renderer, RendererConfig};
use crate::surface::{Stroke, Surface, SurfaceError, check_size};

fn backend(e: JsValue) -> SurfaceError {
    SurfaceError::Backend(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// =============================================================
// Canvas surface
// =============================================================

/// One `<canvas>` element and its 2d context.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// # Errors
    ///
    /// [`RenderError::MissingContext`] if the element has no 2d context.
    pub fn from_canvas(canvas: HtmlCanvasElement) -> Result<Self, RenderError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| RenderError::MissingContext(format!("{e:?}")))?
            .ok_or_else(|| RenderError::MissingContext("canvas has no 2d context".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| RenderError::MissingContext("context is not 2d".into()))?;
        Ok(Self { canvas, ctx })
    }

    fn rect_path(&self, rect: &Rect, radius: f64) -> Result<(), SurfaceError> {
        let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
        self.ctx.begin_path();
        if r == 0.0 {
            self.ctx.rect(rect.x, rect.y, rect.width, rect.height);
            return Ok(());
        }
        self.ctx.move_to(rect.x + r, rect.y);
        self.ctx.arc_to(rect.right(), rect.y, rect.right(), rect.bottom(), r).map_err(backend)?;
        self.ctx.arc_to(rect.right(), rect.bottom(), rect.x, rect.bottom(), r).map_err(backend)?;
        self.ctx.arc_to(rect.x, rect.bottom(), rect.x, rect.y, r).map_err(backend)?;
        self.ctx.arc_to(rect.x, rect.y, rect.right(), rect.y, r).map_err(backend)?;
        self.ctx.close_path();
        Ok(())
    }

    fn apply_stroke(&self, stroke: &Stroke<'_>) -> Result<(), SurfaceError> {
        self.ctx.set_stroke_style_str(stroke.color);
        self.ctx.set_line_width(stroke.width);
        let dash = js_sys::Array::new();
        if let Some([on, off]) = stroke.dash {
            dash.push(&JsValue::from_f64(on));
            dash.push(&JsValue::from_f64(off));
        }
        self.ctx.set_line_dash(&dash).map_err(backend)
    }
}

impl Surface for CanvasSurface {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn resize(&mut self, width: f64, height: f64, pixel_ratio: f64) -> Result<(), SurfaceError> {
        check_size(width, height, pixel_ratio)?;
        self.canvas.set_width((width * pixel_ratio).round() as u32);
        self.canvas.set_height((height * pixel_ratio).round() as u32);
        let style = self.canvas.style();
        style.set_property("width", &format!("{width}px")).map_err(backend)?;
        style.set_property("height", &format!("{height}px")).map_err(backend)?;
        self.ctx.set_transform(pixel_ratio, 0.0, 0.0, pixel_ratio, 0.0, 0.0).map_err(backend)
    }

    fn clear(&mut self, rect: &Rect) -> Result<(), SurfaceError> {
        self.ctx.clear_rect(rect.x, rect.y, rect.width, rect.height);
        Ok(())
    }

    fn save(&mut self) -> Result<(), SurfaceError> {
        self.ctx.save();
        Ok(())
    }

    fn restore(&mut self) -> Result<(), SurfaceError> {
        self.ctx.restore();
        Ok(())
    }

    fn clip(&mut self, rect: &Rect) -> Result<(), SurfaceError> {
        self.ctx.begin_path();
        self.ctx.rect(rect.x, rect.y, rect.width, rect.height);
        self.ctx.clip();
        Ok(())
    }

    fn fill_rect(&mut self, rect: &Rect, radius: f64, color: &str) -> Result<(), SurfaceError> {
        self.rect_path(rect, radius)?;
        self.ctx.set_fill_style_str(color);
        self.ctx.fill();
        Ok(())
    }

    fn stroke_rect(&mut self, rect: &Rect, radius: f64, stroke: &Stroke<'_>) -> Result<(), SurfaceError> {
        self.apply_stroke(stroke)?;
        self.rect_path(rect, radius)?;
        self.ctx.stroke();
        Ok(())
    }

    fn line(&mut self, from: Point, to: Point, stroke: &Stroke<'_>) -> Result<(), SurfaceError> {
        self.apply_stroke(stroke)?;
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx.stroke();
        Ok(())
    }

    fn polygon(&mut self, points: &[Point], color: &str) -> Result<(), SurfaceError> {
        let Some((first, rest)) = points.split_first() else {
            return Ok(());
        };
        self.ctx.begin_path();
        self.ctx.move_to(first.x, first.y);
        for p in rest {
            self.ctx.line_to(p.x, p.y);
        }
        self.ctx.close_path();
        self.ctx.set_fill_style_str(color);
        self.ctx.fill();
        Ok(())
    }

    fn text(&mut self, text: &str, at: Point, color: &str, font: &str) -> Result<(), SurfaceError> {
        self.ctx.set_fill_style_str(color);
        self.ctx.set_font(font);
        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");
        self.ctx.fill_text(text, at.x, at.y).map_err(backend)
    }
}

// =============================================================
// Host handle
// =============================================================

/// Renderer handle exported to the host page.
///
/// Editor snapshots cross the boundary as JSON, and so do render stats.
#[wasm_bindgen]
pub struct WebRenderer {
    inner: Renderer<CanvasSurface>,
}

#[wasm_bindgen]
impl WebRenderer {
    /// # Errors
    ///
    /// Rejects canvases without a 2d context or a degenerate size.
    #[wasm_bindgen(constructor)]
    pub fn new(
        background: HtmlCanvasElement,
        main: HtmlCanvasElement,
        overlay: HtmlCanvasElement,
        width: f64,
        height: f64,
        pixel_ratio: f64,
    ) -> Result<WebRenderer, JsValue> {
        let layers = Layers {
            background: CanvasSurface::from_canvas(background).map_err(to_js)?,
            main: CanvasSurface::from_canvas(main).map_err(to_js)?,
            overlay: CanvasSurface::from_canvas(overlay).map_err(to_js)?,
        };
        let inner = Renderer::new(layers, width, height, pixel_ratio, RendererConfig::default()).map_err(to_js)?;
        Ok(Self { inner })
    }

    /// # Errors
    ///
    /// Malformed JSON or a destroyed renderer.
    #[wasm_bindgen(js_name = updateState)]
    pub fn update_state(&mut self, state_json: &str) -> Result<(), JsValue> {
        let state: editor::EditorState = serde_json::from_str(state_json).map_err(to_js)?;
        self.inner.update_state(&state).map_err(to_js)
    }

    /// Paint a frame and return its stats as JSON.
    ///
    /// # Errors
    ///
    /// Canvas failure or a destroyed renderer.
    pub fn render(&mut self) -> Result<String, JsValue> {
        let stats = self.inner.render().map_err(to_js)?;
        serde_json::to_string(&stats).map_err(to_js)
    }

    /// # Errors
    ///
    /// Degenerate size or a destroyed renderer.
    pub fn resize(&mut self, width: f64, height: f64, pixel_ratio: f64) -> Result<(), JsValue> {
        self.inner.resize(width, height, pixel_ratio).map_err(to_js)
    }

    #[wasm_bindgen(js_name = hitTestBlockAt)]
    #[must_use]
    pub fn hit_test_block_at(&self, screen_x: f64, screen_y: f64) -> Option<String> {
        self.inner.hit_test_block_at(screen_x, screen_y)
    }

    #[wasm_bindgen(js_name = beginDragPreview)]
    pub fn begin_drag_preview(&mut self, ids: Vec<String>) {
        self.inner.begin_drag_preview(ids);
    }

    /// `dx`/`dy` are the cumulative world offset since the drag began.
    #[wasm_bindgen(js_name = updateDragPreview)]
    pub fn update_drag_preview(&mut self, dx: f64, dy: f64) {
        self.inner.update_drag_preview(Point::new(dx, dy));
    }

    #[wasm_bindgen(js_name = endDragPreview)]
    pub fn end_drag_preview(&mut self) {
        self.inner.end_drag_preview();
    }

    pub fn destroy(&mut self) {
        self.inner.destroy();
    }
}
