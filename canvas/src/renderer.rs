//! Layered renderer with incremental repaint.
//!
//! Three surfaces are painted independently:
//!
//! - **background**: the world grid, repainted only on a full repaint.
//! - **main**: connectors then blocks, repainted fully or clipped to the
//!   current damage region.
//! - **overlay**: selection outlines, always repainted in full. Its cost is
//!   bounded by the selection, not the scene.
//!
//! A state update or resize forces a full repaint. A drag preview reports the
//! old and new extents of every moved primitive instead, so the next frame
//! only repaints the padded union of those extents.

#[cfg(test)]
#[path = "renderer_test.rs"]
mod renderer_test;

use std::collections::BTreeSet;

use editor::{BlockId, EditorState, Selection, Viewport};
use web_time::Instant;

use crate::camera::Camera;
use crate::consts::{BACKGROUND_GRID_SPACING, DIRTY_PADDING, FPS_SMOOTHING, GRID_CELL_SIZE, MAX_BORDER_WIDTH_PX};
use crate::dirty::{Damage, DirtyTracker};
use crate::geom::{Point, Rect};
use crate::preview::DragPreview;
use crate::render;
use crate::scene::{RenderConnector, RenderScene, build_scene};
use crate::spatial::{GridIndex, SpatialIndex};
use crate::stats::{FrameSample, RenderStats, StatsTracker};
use crate::surface::{Surface, SurfaceError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("canvas has no 2d context: {0}")]
    MissingContext(String),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("renderer was destroyed")]
    Destroyed,
}

/// Tunables with defaults from [`crate::consts`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererConfig {
    /// Spatial grid cell edge, world units.
    pub cell_size: f64,
    /// Margin around dirty regions, world units.
    pub dirty_padding: f64,
    /// Background grid spacing, world units.
    pub grid_spacing: f64,
    /// Weight of the newest frame in the FPS average.
    pub fps_smoothing: f64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            cell_size: GRID_CELL_SIZE,
            dirty_padding: DIRTY_PADDING,
            grid_spacing: BACKGROUND_GRID_SPACING,
            fps_smoothing: FPS_SMOOTHING,
        }
    }
}

/// The three stacked surfaces, bottom first.
#[derive(Debug, Clone, Default)]
pub struct Layers<S> {
    pub background: S,
    pub main: S,
    pub overlay: S,
}

/// Primitive counts for one main-layer pass.
#[derive(Debug, Clone, Copy, Default)]
struct Painted {
    blocks: usize,
    connectors: usize,
}

pub struct Renderer<S: Surface> {
    layers: Layers<S>,
    config: RendererConfig,
    scene: RenderScene,
    index: GridIndex,
    viewport: Viewport,
    selection: Selection,
    width: f64,
    height: f64,
    pixel_ratio: f64,
    dirty: DirtyTracker,
    preview: Option<DragPreview>,
    /// Indices into `scene.connectors` attached to a previewed block.
    preview_connectors: Vec<usize>,
    stats: StatsTracker,
    destroyed: bool,
}

impl<S: Surface> Renderer<S> {
    /// Build a renderer over `layers` and size them.
    ///
    /// # Errors
    ///
    /// Fails if any surface rejects the size.
    pub fn new(
        layers: Layers<S>,
        width: f64,
        height: f64,
        pixel_ratio: f64,
        config: RendererConfig,
    ) -> Result<Self, RenderError> {
        let mut renderer = Self {
            layers,
            config,
            scene: RenderScene::default(),
            index: GridIndex::new(config.cell_size),
            viewport: Viewport::default(),
            selection: Selection::default(),
            width: 0.0,
            height: 0.0,
            pixel_ratio: 1.0,
            dirty: DirtyTracker::new(),
            preview: None,
            preview_connectors: Vec::new(),
            stats: StatsTracker::new(config.fps_smoothing),
            destroyed: false,
        };
        renderer.resize(width, height, pixel_ratio)?;
        Ok(renderer)
    }

    // --- Accessors ---

    #[must_use]
    pub fn camera(&self) -> Camera {
        Camera::new(&self.viewport, self.width, self.height)
    }

    /// CSS width, CSS height and device pixel ratio.
    #[must_use]
    pub fn size(&self) -> (f64, f64, f64) {
        (self.width, self.height, self.pixel_ratio)
    }

    #[must_use]
    pub fn scene(&self) -> &RenderScene {
        &self.scene
    }

    #[must_use]
    pub fn layers(&self) -> &Layers<S> {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut Layers<S> {
        &mut self.layers
    }

    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[must_use]
    pub fn stats(&self) -> RenderStats {
        self.stats.snapshot()
    }

    #[must_use]
    pub fn preview(&self) -> Option<&DragPreview> {
        self.preview.as_ref()
    }

    #[must_use]
    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // --- State ---

    /// Take a new editor snapshot. Rebuilds the scene and the spatial index
    /// and forces a full repaint.
    ///
    /// # Errors
    ///
    /// [`RenderError::Destroyed`] after [`Self::destroy`].
    pub fn update_state(&mut self, state: &EditorState) -> Result<(), RenderError> {
        self.ensure_live()?;
        self.scene = build_scene(&state.doc);
        self.index.clear();
        for block in &self.scene.blocks {
            self.index.insert(&block.id, block.bounds);
        }
        self.viewport = state.viewport;
        self.selection = state.selection.clone();
        self.refresh_preview_connectors();
        self.dirty.mark_full();
        tracing::debug!(
            blocks = self.scene.blocks.len(),
            connectors = self.scene.connectors.len(),
            "scene rebuilt"
        );
        Ok(())
    }

    /// Resize every layer. Dimensions are CSS pixels.
    ///
    /// # Errors
    ///
    /// [`RenderError::Destroyed`], or a surface rejecting the size. On failure
    /// the previous size is kept.
    pub fn resize(&mut self, width: f64, height: f64, pixel_ratio: f64) -> Result<(), RenderError> {
        self.ensure_live()?;
        crate::surface::check_size(width, height, pixel_ratio)?;
        self.layers.background.resize(width, height, pixel_ratio)?;
        self.layers.main.resize(width, height, pixel_ratio)?;
        self.layers.overlay.resize(width, height, pixel_ratio)?;
        self.width = width;
        self.height = height;
        self.pixel_ratio = pixel_ratio;
        self.dirty.mark_full();
        Ok(())
    }

    /// Release the scene and index. Every later render or update fails.
    pub fn destroy(&mut self) {
        self.index.clear();
        self.scene = RenderScene::default();
        self.preview = None;
        self.preview_connectors.clear();
        self.destroyed = true;
    }

    // --- Hit-testing ---

    /// Topmost block whose committed bounds contain the screen point.
    #[must_use]
    pub fn hit_test_block_at(&self, screen_x: f64, screen_y: f64) -> Option<BlockId> {
        if self.destroyed {
            return None;
        }
        let world = self.camera().screen_to_world(Point::new(screen_x, screen_y));
        let mut candidates: Vec<usize> =
            self.index.query_point(world).iter().filter_map(|id| self.scene.position(id)).collect();
        // Scene order is (z, id) ascending; walk it backwards.
        candidates.sort_unstable_by(|a, b| b.cmp(a));
        candidates
            .into_iter()
            .filter_map(|i| self.scene.blocks.get(i))
            .find(|block| block.bounds.contains_point(world))
            .map(|block| block.id.clone())
    }

    // --- Drag preview ---

    /// Start previewing a drag of `ids`. Replaces any session in progress.
    pub fn begin_drag_preview<I, T>(&mut self, ids: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        if self.destroyed {
            return;
        }
        if self.preview.is_some() {
            self.end_drag_preview();
        }
        self.preview = Some(DragPreview::new(ids));
        self.refresh_preview_connectors();
    }

    /// Move the preview to `offset`, the cumulative world delta since the drag
    /// began. Marks the old and new extents of every moved primitive dirty.
    pub fn update_drag_preview(&mut self, offset: Point) {
        let camera = self.camera();
        let Some(preview) = self.preview.as_mut() else {
            return;
        };
        let previous = preview.set_offset(offset);
        let preview = &*preview;

        for id in preview.ids() {
            if let Some(block) = self.scene.block(id) {
                for shift in [previous, offset] {
                    self.dirty.add(render::block_extent(&camera, block, &block.bounds.translate(shift.x, shift.y)));
                }
            }
        }

        for &i in &self.preview_connectors {
            let Some(connector) = self.scene.connectors.get(i) else {
                continue;
            };
            for shift in [previous, offset] {
                if let Some((from, to)) = endpoints(&self.scene, connector, |id, b| shifted(preview, id, b, shift)) {
                    self.dirty.add(render::connector_extent(&camera, connector, &from, &to));
                }
            }
        }
    }

    /// Drop the preview. The next frame repaints in full against the
    /// committed document.
    pub fn end_drag_preview(&mut self) {
        if self.preview.take().is_some() {
            self.preview_connectors.clear();
            self.dirty.mark_full();
        }
    }

    // --- Rendering ---

    /// Paint one frame.
    ///
    /// # Errors
    ///
    /// [`RenderError::Destroyed`], or a surface failure. After a surface
    /// failure the next frame is a full repaint.
    pub fn render(&mut self) -> Result<RenderStats, RenderError> {
        self.ensure_live()?;
        let started = Instant::now();
        let damage = self.dirty.take(self.config.dirty_padding);

        let result = self.paint(damage);
        let (painted, ratio) = match result {
            Ok(done) => done,
            Err(e) => {
                self.dirty.mark_full();
                tracing::warn!(error = %e, "render failed");
                return Err(e.into());
            }
        };

        let stats = self.stats.record(FrameSample {
            frame_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            blocks_rendered: painted.blocks,
            connectors_rendered: painted.connectors,
            dirty_area_ratio: ratio,
            full_repaint: matches!(damage, Damage::Full),
        });
        tracing::trace!(
            frame = stats.frame,
            frame_time_ms = stats.frame_time_ms,
            blocks = stats.blocks_rendered,
            connectors = stats.connectors_rendered,
            dirty_area_ratio = stats.dirty_area_ratio,
            "frame rendered"
        );
        Ok(stats)
    }

    fn paint(&mut self, damage: Damage) -> Result<(Painted, f64), SurfaceError> {
        let camera = self.camera();
        let (painted, ratio) = match damage {
            Damage::Full => {
                render::draw_background(&mut self.layers.background, &camera, self.config.grid_spacing)?;
                (self.paint_main(&camera, None)?, 1.0)
            }
            Damage::Region(region) => {
                let screen = camera.world_rect_to_screen(&region);
                let covered = screen.intersection(&render::screen_rect(&camera)).map_or(0.0, |r| r.area());
                let total = camera.screen_area();
                let ratio = if total > 0.0 { covered / total } else { 0.0 };
                (self.paint_main(&camera, Some(&region))?, ratio)
            }
        };
        self.paint_overlay(&camera)?;
        Ok((painted, ratio))
    }

    /// Repaint the main layer, clipped to `region` (world space) when given.
    fn paint_main(&mut self, camera: &Camera, region: Option<&Rect>) -> Result<Painted, SurfaceError> {
        let Self { layers, scene, index, preview, .. } = self;
        let surface = &mut layers.main;
        let preview = preview.as_ref();
        let area = region.copied().unwrap_or_else(|| camera.visible_world_rect());

        let Some(region) = region else {
            surface.clear(&render::screen_rect(camera))?;
            return paint_primitives(surface, camera, scene, index, preview, &area);
        };

        // The clip is popped even when a draw call fails, so a failed frame
        // cannot leave the next full repaint clipped.
        let clip = camera.world_rect_to_screen(region);
        surface.save()?;
        let painted = surface
            .clip(&clip)
            .and_then(|()| surface.clear(&clip))
            .and_then(|()| paint_primitives(surface, camera, scene, index, preview, &area));
        surface.restore()?;
        painted
    }

    fn paint_overlay(&mut self, camera: &Camera) -> Result<(), SurfaceError> {
        let surface = &mut self.layers.overlay;
        surface.clear(&render::screen_rect(camera))?;
        for id in &self.selection.block_ids {
            let Some(block) = self.scene.block(id) else {
                continue;
            };
            let bounds = self.preview.as_ref().map_or(block.bounds, |p| p.apply(id, block.bounds));
            render::draw_selection(surface, camera, &bounds)?;
        }
        Ok(())
    }

    fn refresh_preview_connectors(&mut self) {
        self.preview_connectors = match &self.preview {
            Some(p) => self
                .scene
                .connectors
                .iter()
                .enumerate()
                .filter(|(_, c)| p.contains(&c.from) || p.contains(&c.to))
                .map(|(i, _)| i)
                .collect(),
            None => Vec::new(),
        };
    }

    fn ensure_live(&self) -> Result<(), RenderError> {
        if self.destroyed { Err(RenderError::Destroyed) } else { Ok(()) }
    }
}

/// Connectors then blocks whose painted extent reaches `area` (world space).
fn paint_primitives(
    surface: &mut dyn Surface,
    camera: &Camera,
    scene: &RenderScene,
    index: &GridIndex,
    preview: Option<&DragPreview>,
    area: &Rect,
) -> Result<Painted, SurfaceError> {
    let effective = |id: &str, bounds: Rect| preview.map_or(bounds, |p| p.apply(id, bounds));

    let mut painted = Painted::default();
    for connector in &scene.connectors {
        let Some((from, to)) = endpoints(scene, connector, &effective) else {
            continue;
        };
        if render::connector_extent(camera, connector, &from, &to).intersects(area) {
            render::draw_connector(surface, camera, connector, &from, &to)?;
            painted.connectors += 1;
        }
    }

    // Committed geometry from the index, plus previewed blocks at their
    // shifted position.
    let reach = area.inflate(camera.screen_dist_to_world(MAX_BORDER_WIDTH_PX));
    let mut candidates: BTreeSet<usize> =
        index.query_rect(&reach).iter().filter_map(|id| scene.position(id)).collect();
    if let Some(p) = preview {
        candidates.extend(p.ids().iter().filter_map(|id| scene.position(id)));
    }
    for i in candidates {
        let Some(block) = scene.blocks.get(i) else {
            continue;
        };
        let bounds = effective(&block.id, block.bounds);
        if render::block_extent(camera, block, &bounds).intersects(area) {
            render::draw_block(surface, camera, block, &bounds)?;
            painted.blocks += 1;
        }
    }
    Ok(painted)
}

/// Endpoint rectangles of `connector`, after `bounds_of` adjusts each one.
fn endpoints(
    scene: &RenderScene,
    connector: &RenderConnector,
    bounds_of: impl Fn(&str, Rect) -> Rect,
) -> Option<(Rect, Rect)> {
    let from = scene.block(&connector.from)?;
    let to = scene.block(&connector.to)?;
    Some((bounds_of(&from.id, from.bounds), bounds_of(&to.id, to.bounds)))
}

fn shifted(preview: &DragPreview, id: &str, bounds: Rect, shift: Point) -> Rect {
    if preview.contains(id) { bounds.translate(shift.x, shift.y) } else { bounds }
}
