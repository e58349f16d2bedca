#![allow(clippy::float_cmp)]

use super::*;
use crate::surface::{DrawOp, RecordingSurface, Stroke};
use editor::doc::NoteInfo;
use editor::factory::default_layout;
use editor::{Block, BlockPayload, Connector, Vec2};

const NOTE_FILL: &str = "#fff9c4";

fn note(id: &str, x: f64, y: f64, z: i64) -> Block {
    let mut layout = default_layout(Vec2::new(x, y));
    layout.z_index = z;
    Block {
        id: id.into(),
        layout,
        created_at: 0,
        updated_at: 0,
        source: None,
        payload: BlockPayload::Note(NoteInfo { text: format!("note {id}") }),
    }
}

/// `a` and `b` overlap with `b` on top, `c` sits up-left, `far` is off-screen.
/// One connector joins `a` and `c`.
fn board() -> EditorState {
    let mut state = EditorState::empty();
    for b in [note("a", 0.0, 0.0, 0), note("b", 100.0, 50.0, 1), note("c", -300.0, -200.0, 0), note("far", 5000.0, 5000.0, 0)]
    {
        state.doc.blocks.insert(b.id.clone(), b);
    }
    state.doc.connectors.insert("ac".into(), Connector::between("ac", "a", "c"));
    state
}

fn renderer(state: &EditorState) -> Renderer<RecordingSurface> {
    let mut r = Renderer::new(Layers::default(), 800.0, 600.0, 1.0, RendererConfig::default()).unwrap();
    r.update_state(state).unwrap();
    r
}

fn main_ops(r: &mut Renderer<RecordingSurface>) -> Vec<DrawOp> {
    r.layers_mut().main.take_ops()
}

fn block_fills(ops: &[DrawOp]) -> Vec<Rect> {
    ops.iter()
        .filter_map(|op| match op {
            DrawOp::FillRect { rect, color, .. } if color == NOTE_FILL => Some(*rect),
            _ => None,
        })
        .collect()
}

fn drain_all(r: &mut Renderer<RecordingSurface>) {
    let layers = r.layers_mut();
    layers.background.take_ops();
    layers.main.take_ops();
    layers.overlay.take_ops();
}

// =============================================================
// Construction and full repaint
// =============================================================

#[test]
fn new_sizes_every_layer() {
    let r = Renderer::new(Layers::<RecordingSurface>::default(), 640.0, 480.0, 2.0, RendererConfig::default()).unwrap();
    assert_eq!(r.size(), (640.0, 480.0, 2.0));
    assert_eq!(r.layers().background.size(), (640.0, 480.0, 2.0));
    assert_eq!(r.layers().overlay.size(), (640.0, 480.0, 2.0));
}

#[test]
fn first_frame_is_full_and_culls_offscreen_blocks() {
    let mut r = renderer(&board());
    drain_all(&mut r);
    let stats = r.render().unwrap();
    assert!(stats.full_repaint);
    assert_eq!(stats.dirty_area_ratio, 1.0);
    assert_eq!(stats.blocks_rendered, 3);
    assert_eq!(stats.connectors_rendered, 1);
    assert!(!r.layers().background.ops().is_empty());
}

#[test]
fn blocks_paint_in_stacking_order() {
    let mut r = renderer(&board());
    r.render().unwrap();
    let texts = r.layers().main.texts();
    assert_eq!(texts, vec!["note a", "note c", "note b"]);
}

#[test]
fn frame_without_pending_damage_repaints_fully() {
    let mut r = renderer(&board());
    r.render().unwrap();
    assert!(r.render().unwrap().full_repaint);
}

#[test]
fn update_state_forces_full_repaint() {
    let mut r = renderer(&board());
    r.render().unwrap();
    r.begin_drag_preview(["a"]);
    r.update_drag_preview(Point::new(5.0, 0.0));
    r.update_state(&board()).unwrap();
    assert!(r.dirty().is_full());
}

#[test]
fn resize_rejects_bad_size_and_keeps_previous() {
    let mut r = renderer(&board());
    let err = r.resize(0.0, 100.0, 1.0).unwrap_err();
    assert!(matches!(err, RenderError::Surface(SurfaceError::InvalidSize { .. })));
    assert_eq!(r.size(), (800.0, 600.0, 1.0));
}

// =============================================================
// Hit-testing
// =============================================================

#[test]
fn hit_test_returns_topmost_block() {
    let r = renderer(&board());
    // World (150, 80) lies in both a and b.
    assert_eq!(r.hit_test_block_at(550.0, 380.0).as_deref(), Some("b"));
    // World (10, 10) lies in a only.
    assert_eq!(r.hit_test_block_at(410.0, 310.0).as_deref(), Some("a"));
}

#[test]
fn hit_test_misses_empty_space() {
    let r = renderer(&board());
    // World (-50, -50) is outside every block.
    assert_eq!(r.hit_test_block_at(350.0, 250.0), None);
}

#[test]
fn hit_test_respects_viewport() {
    let mut state = board();
    state.viewport = Viewport { center: Vec2::new(5000.0, 5000.0), zoom: 2.0 };
    let r = renderer(&state);
    // Canvas center is world (5000, 5000), the corner of `far`.
    assert_eq!(r.hit_test_block_at(410.0, 310.0).as_deref(), Some("far"));
}

#[test]
fn hit_test_uses_committed_geometry_during_preview() {
    let mut r = renderer(&board());
    r.begin_drag_preview(["c"]);
    r.update_drag_preview(Point::new(1000.0, 0.0));
    // c committed at (-300, -200); screen (150, 150) is world (-250, -150).
    assert_eq!(r.hit_test_block_at(150.0, 150.0).as_deref(), Some("c"));
}

// =============================================================
// Drag preview and partial redraw
// =============================================================

#[test]
fn preview_marks_old_and_new_extents() {
    let mut r = renderer(&board());
    r.render().unwrap();
    r.begin_drag_preview(["a"]);
    r.update_drag_preview(Point::new(50.0, 0.0));
    // Block a at both offsets plus connector ac at both offsets.
    assert_eq!(r.dirty().pending(), 4);
    assert!(!r.dirty().is_full());
}

#[test]
fn preview_frame_is_partial_and_clipped() {
    let mut r = renderer(&board());
    r.render().unwrap();
    drain_all(&mut r);

    r.begin_drag_preview(["a"]);
    r.update_drag_preview(Point::new(50.0, 0.0));
    let stats = r.render().unwrap();

    assert!(!stats.full_repaint);
    assert!(stats.dirty_area_ratio > 0.0 && stats.dirty_area_ratio < 1.0);
    assert!(r.layers().background.ops().is_empty(), "background untouched by partial frames");

    let ops = main_ops(&mut r);
    assert!(matches!(ops.first(), Some(DrawOp::Save)));
    assert!(ops.iter().any(|op| matches!(op, DrawOp::Clip(_))));
    assert!(matches!(ops.last(), Some(DrawOp::Restore)));
    assert!(block_fills(&ops).contains(&Rect::new(450.0, 300.0, 200.0, 120.0)));
    assert!(!block_fills(&ops).contains(&Rect::new(400.0, 300.0, 200.0, 120.0)));
}

#[test]
fn connectors_follow_preview() {
    let mut r = renderer(&board());
    r.render().unwrap();
    drain_all(&mut r);
    r.begin_drag_preview(["a"]);
    r.update_drag_preview(Point::new(50.0, 0.0));
    r.render().unwrap();
    // a's center (100, 60) shifted by 50 lands at screen (550, 360).
    let ops = main_ops(&mut r);
    assert!(ops.iter().any(|op| matches!(op, DrawOp::Line { to, .. } if *to == Point::new(550.0, 360.0))
        || matches!(op, DrawOp::Line { from, .. } if *from == Point::new(550.0, 360.0))));
}

#[test]
fn preview_offset_is_cumulative() {
    let mut r = renderer(&board());
    r.render().unwrap();
    r.begin_drag_preview(["a"]);
    r.update_drag_preview(Point::new(10.0, 0.0));
    r.update_drag_preview(Point::new(30.0, 0.0));
    drain_all(&mut r);
    r.render().unwrap();
    let fills = block_fills(r.layers().main.ops());
    assert!(fills.contains(&Rect::new(430.0, 300.0, 200.0, 120.0)));
}

#[test]
fn selection_follows_preview_on_overlay() {
    let mut state = board();
    state.selection = Selection::blocks(["a"]);
    let mut r = renderer(&state);
    r.render().unwrap();
    r.begin_drag_preview(["a"]);
    r.update_drag_preview(Point::new(50.0, 0.0));
    drain_all(&mut r);
    r.render().unwrap();
    let overlay = r.layers().overlay.ops();
    assert!(matches!(overlay.first(), Some(DrawOp::Clear(_))));
    assert!(overlay.iter().any(
        |op| matches!(op, DrawOp::StrokeRect { rect, dashed: true, .. } if *rect == Rect::new(448.0, 298.0, 204.0, 124.0))
    ));
}

/// Previewing a move and then ending the session without committing puts
/// the block back where the document says it is.
#[test]
fn ended_preview_paints_committed_position() {
    let state = board();
    let mut r = renderer(&state);
    r.render().unwrap();

    r.begin_drag_preview(["a"]);
    r.update_drag_preview(Point::new(50.0, 0.0));
    r.render().unwrap();

    r.end_drag_preview();
    assert!(r.preview().is_none());
    drain_all(&mut r);
    let stats = r.render().unwrap();

    assert!(stats.full_repaint);
    let fills = block_fills(r.layers().main.ops());
    assert!(fills.contains(&Rect::new(400.0, 300.0, 200.0, 120.0)));
    assert!(!fills.contains(&Rect::new(450.0, 300.0, 200.0, 120.0)));
}

#[test]
fn update_without_session_is_ignored() {
    let mut r = renderer(&board());
    r.render().unwrap();
    r.update_drag_preview(Point::new(50.0, 0.0));
    assert_eq!(r.dirty().pending(), 0);
}

// =============================================================
// Partial frames match full repaints
// =============================================================

/// Notes on a 4x3 grid, 50x30px each at quarter zoom, with labels far wider
/// than their face. `n11` is linked to `n12`.
fn crowded_board() -> EditorState {
    let mut state = EditorState::empty();
    for row in 0..3_i32 {
        for col in 0..4_i32 {
            let id = format!("n{row}{col}");
            let mut block = note(&id, f64::from(col) * 240.0 - 480.0, f64::from(row) * 160.0 - 240.0, 0);
            block.payload = BlockPayload::Note(NoteInfo { text: format!("itinerary stop {id} with details") });
            state.doc.blocks.insert(block.id.clone(), block);
        }
    }
    state.doc.connectors.insert("link".into(), Connector::between("link", "n11", "n12"));
    state.viewport = Viewport { center: Vec2::new(0.0, 0.0), zoom: 0.25 };
    state
}

fn span(points: &[Point]) -> Rect {
    let (mut lo, mut hi) = (points[0], points[0]);
    for p in points {
        lo = Point::new(lo.x.min(p.x), lo.y.min(p.y));
        hi = Point::new(hi.x.max(p.x), hi.y.max(p.y));
    }
    Rect::new(lo.x, lo.y, hi.x - lo.x, hi.y - lo.y)
}

/// Screen box each drawing call can touch, cut to the clips active when it
/// ran. Calls clipped away entirely are dropped. Text is taken as 8px per
/// character by 16px.
fn painted_extents(ops: &[DrawOp]) -> Vec<(&DrawOp, Rect)> {
    let mut clip = Some(Rect::new(-1e9, -1e9, 2e9, 2e9));
    let mut saved = Vec::new();
    let mut out = Vec::new();
    for op in ops {
        let raw = match op {
            DrawOp::Save => {
                saved.push(clip);
                continue;
            }
            DrawOp::Restore => {
                clip = saved.pop().unwrap();
                continue;
            }
            DrawOp::Clip(rect) => {
                clip = clip.and_then(|c| c.intersection(rect));
                continue;
            }
            DrawOp::Resize { .. } | DrawOp::Clear(_) => continue,
            DrawOp::FillRect { rect, .. } => *rect,
            DrawOp::StrokeRect { rect, width, .. } => rect.inflate(width / 2.0),
            DrawOp::Line { from, to, width, .. } => span(&[*from, *to]).inflate(width / 2.0),
            DrawOp::Polygon { points, .. } => span(points),
            DrawOp::Text { text, at, .. } => {
                let w = f64::from(u32::try_from(text.chars().count()).unwrap()) * 8.0;
                Rect::new(at.x - w / 2.0, at.y - 8.0, w, 16.0)
            }
        };
        if let Some(extent) = clip.and_then(|c| c.intersection(&raw)) {
            out.push((op, extent));
        }
    }
    out
}

fn within(inner: &Rect, outer: &Rect) -> bool {
    const EPS: f64 = 1e-9;
    inner.x >= outer.x - EPS
        && inner.y >= outer.y - EPS
        && inner.right() <= outer.right() + EPS
        && inner.bottom() <= outer.bottom() + EPS
}

/// After each preview step the main layer must look exactly like a full
/// repaint of the same preview: everything the full frame draws inside the
/// clip is redrawn, and everything outside the clip was already on screen.
#[test]
fn partial_frames_match_full_repaints() {
    let state = crowded_board();
    let mut r = renderer(&state);
    r.render().unwrap();
    let mut shown = main_ops(&mut r);
    drain_all(&mut r);

    r.begin_drag_preview(["n11"]);
    for offset in [Point::new(130.0, 0.0), Point::new(130.0, 90.0), Point::new(-60.0, 40.0)] {
        r.update_drag_preview(offset);
        assert!(!r.render().unwrap().full_repaint);
        let partial = main_ops(&mut r);
        drain_all(&mut r);
        let clip = partial
            .iter()
            .find_map(|op| match op {
                DrawOp::Clip(rect) => Some(*rect),
                _ => None,
            })
            .unwrap();

        let mut reference = renderer(&state);
        reference.begin_drag_preview(["n11"]);
        reference.update_drag_preview(offset);
        assert!(reference.render().unwrap().full_repaint);
        let full = main_ops(&mut reference);

        let repainted = painted_extents(&partial);
        for (op, extent) in painted_extents(&full) {
            if extent.intersects(&clip) {
                assert!(repainted.iter().any(|(p, _)| *p == op), "{offset:?}: not repainted in clip: {op:?}");
            }
            if !within(&extent, &clip) {
                assert!(shown.contains(op), "{offset:?}: differs outside clip: {op:?}");
            }
        }
        for (op, extent) in painted_extents(&shown) {
            if !within(&extent, &clip) {
                assert!(full.contains(op), "{offset:?}: stale pixels outside clip: {op:?}");
            }
        }
        shown = full;
    }
}

#[test]
fn preview_dirties_border_stroke() {
    let mut r = renderer(&crowded_board());
    r.render().unwrap();
    r.begin_drag_preview(["n00"]);
    r.update_drag_preview(Point::new(10.0, 0.0));
    let Damage::Region(region) = r.dirty().clone().take(0.0) else {
        panic!("expected a damage region");
    };
    // n00 sits at (-480, -240); a 2px border is 8 world units at quarter zoom.
    assert!(region.x <= -488.0 && region.y <= -248.0);
}

// =============================================================
// Destroy
// =============================================================

#[test]
fn destroyed_renderer_refuses_work() {
    let mut r = renderer(&board());
    r.destroy();
    assert!(r.is_destroyed());
    assert_eq!(r.render(), Err(RenderError::Destroyed));
    assert_eq!(r.update_state(&board()), Err(RenderError::Destroyed));
    assert_eq!(r.hit_test_block_at(410.0, 310.0), None);
    r.begin_drag_preview(["a"]);
    assert!(r.preview().is_none());
}

// =============================================================
// Surface failures
// =============================================================

/// Records like [`RecordingSurface`] but fails text calls while `failing`.
#[derive(Default)]
struct NoText {
    inner: RecordingSurface,
    failing: bool,
}

impl Surface for NoText {
    fn resize(&mut self, w: f64, h: f64, dpr: f64) -> Result<(), SurfaceError> {
        self.inner.resize(w, h, dpr)
    }
    fn clear(&mut self, rect: &Rect) -> Result<(), SurfaceError> {
        self.inner.clear(rect)
    }
    fn save(&mut self) -> Result<(), SurfaceError> {
        self.inner.save()
    }
    fn restore(&mut self) -> Result<(), SurfaceError> {
        self.inner.restore()
    }
    fn clip(&mut self, rect: &Rect) -> Result<(), SurfaceError> {
        self.inner.clip(rect)
    }
    fn fill_rect(&mut self, rect: &Rect, radius: f64, color: &str) -> Result<(), SurfaceError> {
        self.inner.fill_rect(rect, radius, color)
    }
    fn stroke_rect(&mut self, rect: &Rect, radius: f64, stroke: &Stroke<'_>) -> Result<(), SurfaceError> {
        self.inner.stroke_rect(rect, radius, stroke)
    }
    fn line(&mut self, from: Point, to: Point, stroke: &Stroke<'_>) -> Result<(), SurfaceError> {
        self.inner.line(from, to, stroke)
    }
    fn polygon(&mut self, points: &[Point], color: &str) -> Result<(), SurfaceError> {
        self.inner.polygon(points, color)
    }
    fn text(&mut self, text: &str, at: Point, color: &str, font: &str) -> Result<(), SurfaceError> {
        if self.failing {
            return Err(SurfaceError::Backend("fillText".into()));
        }
        self.inner.text(text, at, color, font)
    }
}

#[test]
fn failed_frame_schedules_full_repaint() {
    let mut r = Renderer::new(Layers::<NoText>::default(), 800.0, 600.0, 1.0, RendererConfig::default()).unwrap();
    r.update_state(&board()).unwrap();
    r.layers_mut().main.failing = true;
    assert_eq!(r.render(), Err(RenderError::Surface(SurfaceError::Backend("fillText".into()))));
    assert!(r.dirty().is_full());
    assert_eq!(r.stats().frame, 0);
    assert_eq!(r.layers().main.inner.depth(), 0);
}

#[test]
fn failed_partial_frame_pops_its_clip() {
    let mut r = Renderer::new(Layers::<NoText>::default(), 800.0, 600.0, 1.0, RendererConfig::default()).unwrap();
    r.update_state(&board()).unwrap();
    r.render().unwrap();
    r.begin_drag_preview(["a"]);
    r.update_drag_preview(Point::new(50.0, 0.0));

    r.layers_mut().main.failing = true;
    assert!(r.render().is_err());
    assert_eq!(r.layers().main.inner.depth(), 0);

    r.layers_mut().main.failing = false;
    assert!(r.render().unwrap().full_repaint);
    assert_eq!(r.layers().main.inner.depth(), 0);
}
