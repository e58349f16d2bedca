#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

fn note(id: &str) -> Block {
    Block {
        id: id.into(),
        layout: BlockLayout {
            position: Vec2::new(10.0, 20.0),
            size: Size::new(200.0, 120.0),
            rotation: 0.0,
            z_index: 3,
            locked: false,
        },
        created_at: 1,
        updated_at: 2,
        source: None,
        payload: BlockPayload::Note(NoteInfo { text: "pack adapters".into() }),
    }
}

fn item(id: &str, block_id: &str, day: &str, order: i64) -> TimelineItem {
    TimelineItem { id: id.into(), block_id: block_id.into(), day: day.into(), time_range: None, order }
}

// =============================================================
// Serde
// =============================================================

#[test]
fn kind_serde_all_variants() {
    for kind in BlockKind::ALL {
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, format!("\"{}\"", kind.as_str()));
        let back: BlockKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }
}

#[test]
fn block_payload_is_flattened_with_kind_tag() {
    let value = serde_json::to_value(note("b1")).unwrap();
    assert_eq!(value["kind"], json!("note"));
    assert_eq!(value["text"], json!("pack adapters"));
    assert_eq!(value["layout"]["z_index"], json!(3));
    assert!(value.get("source").is_none());
}

#[test]
fn block_deserializes_from_wire_shape() {
    let raw = json!({
        "id": "b9",
        "kind": "transport",
        "title": "Narita Express",
        "mode": "train",
        "layout": {
            "position": {"x": 0.0, "y": 0.0},
            "size": {"width": 10.0, "height": 10.0},
            "rotation": 0.0,
            "z_index": 0,
            "locked": true
        },
        "created_at": 5,
        "updated_at": 5
    });
    let block: Block = serde_json::from_value(raw).unwrap();
    assert_eq!(block.kind(), BlockKind::Transport);
    assert!(block.layout.locked);
    match block.payload {
        BlockPayload::Transport(t) => assert_eq!(t.mode, Some(TransportMode::Train)),
        other => unreachable!("unexpected payload {other:?}"),
    }
}

#[test]
fn layout_patch_skips_absent_fields() {
    let patch = LayoutPatch::position(Vec2::new(1.0, 2.0));
    let value = serde_json::to_value(&patch).unwrap();
    assert_eq!(value, json!({"position": {"x": 1.0, "y": 2.0}}));
}

// =============================================================
// Layout
// =============================================================

#[test]
fn patched_applies_only_present_fields() {
    let block = note("b1");
    let patch = LayoutPatch { rotation: Some(45.0), z_index: Some(9), ..LayoutPatch::default() };
    let layout = block.layout.patched(&patch);
    assert_eq!(layout.rotation, 45.0);
    assert_eq!(layout.z_index, 9);
    assert_eq!(layout.position, block.layout.position);
    assert_eq!(layout.size, block.layout.size);
}

#[test]
fn full_patch_restores_layout() {
    let block = note("b1");
    let moved = block.layout.patched(&LayoutPatch::position(Vec2::new(99.0, 99.0)));
    assert_eq!(moved.patched(&LayoutPatch::full(&block.layout)), block.layout);
}

#[test]
fn empty_patch() {
    assert!(LayoutPatch::default().is_empty());
    assert!(!LayoutPatch::size(Size::new(1.0, 1.0)).is_empty());
}

// =============================================================
// Block accessors
// =============================================================

#[test]
fn note_has_no_title_or_time() {
    let block = note("b1");
    assert_eq!(block.title(), None);
    assert!(block.time_range().is_none());
}

// =============================================================
// Timeline
// =============================================================

#[test]
fn timeline_patch_can_clear_time_range() {
    let mut it = item("t1", "b1", "2025-03-01", 0);
    it.time_range = Some(TimeRange::new("2025-03-01T08:00:00Z", "2025-03-01T09:00:00Z"));
    let cleared = it.patched(&TimelinePatch { time_range: Some(None), ..TimelinePatch::default() });
    assert!(cleared.time_range.is_none());
    let kept = it.patched(&TimelinePatch { order: Some(7), ..TimelinePatch::default() });
    assert_eq!(kept.time_range, it.time_range);
    assert_eq!(kept.order, 7);
}

#[test]
fn sorted_timeline_orders_by_day_then_order() {
    let mut doc = Document::new("d", "Trip");
    doc.timeline.insert("t1".into(), item("t1", "b1", "2025-03-02", 0));
    doc.timeline.insert("t2".into(), item("t2", "b1", "2025-03-01", 5));
    doc.timeline.insert("t3".into(), item("t3", "b1", "2025-03-01", 1));
    let ids: Vec<&str> = doc.sorted_timeline().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t3", "t2", "t1"]);
}

// =============================================================
// Document queries
// =============================================================

#[test]
fn connectors_touching_matches_either_end() {
    let mut doc = Document::new("d", "Trip");
    doc.connectors.insert("c1".into(), Connector::between("c1", "a", "b"));
    doc.connectors.insert("c2".into(), Connector::between("c2", "b", "c"));
    doc.connectors.insert("c3".into(), Connector::between("c3", "c", "d"));
    let ids: Vec<&str> = doc.connectors_touching("b").map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2"]);
}

#[test]
fn clone_shares_structure_and_stays_independent() {
    let mut doc = Document::new("d", "Trip");
    doc.blocks.insert("b1".into(), note("b1"));
    let snapshot = doc.clone();
    doc.blocks.remove("b1");
    assert!(snapshot.block("b1").is_some());
    assert!(doc.block("b1").is_none());
}
