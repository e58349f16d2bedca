#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;
use crate::doc::{BlockPayload, NoteInfo, Size, TimeRange, Vec2};
use crate::factory::default_layout;
use crate::validate::NoRules;
use crate::view::Viewport;
use crate::{StructuralError, ValidationError};

fn note(id: &str, x: f64, y: f64) -> Block {
    Block {
        id: id.into(),
        layout: default_layout(Vec2::new(x, y)),
        created_at: 100,
        updated_at: 100,
        source: None,
        payload: BlockPayload::Note(NoteInfo { text: format!("note {id}") }),
    }
}

fn item(id: &str, block_id: &str) -> TimelineItem {
    TimelineItem {
        id: id.into(),
        block_id: block_id.into(),
        day: "2025-03-01".into(),
        time_range: Some(TimeRange::new("2025-03-01T08:00:00Z", "2025-03-01T09:00:00Z")),
        order: 1,
    }
}

/// Three notes, one connector between b1 and b2, one timeline item on b1.
fn seeded() -> EditorState {
    let mut state = EditorState::empty();
    state.doc.blocks.insert("b1".into(), note("b1", 0.0, 0.0));
    state.doc.blocks.insert("b2".into(), note("b2", 300.0, 0.0));
    state.doc.blocks.insert("b3".into(), note("b3", 600.0, 0.0));
    state.doc.connectors.insert("c1".into(), Connector::between("c1", "b1", "b2"));
    state.doc.timeline.insert("t1".into(), item("t1", "b1"));
    state
}

fn assert_round_trip(step: &Step, before: &EditorState) {
    let after = step.apply(before).unwrap();
    let inverse = step.invert(before).unwrap();
    let restored = inverse.apply(&after).unwrap();
    assert_eq!(&restored, before, "{} did not round-trip", step.name());
}

// =============================================================
// Round trips
// =============================================================

#[test]
fn every_step_kind_round_trips() {
    let state = seeded();
    let steps = vec![
        Step::AddBlock { block: note("b9", 50.0, 50.0) },
        Step::RemoveBlock { block_id: "b3".into() },
        Step::UpdateBlockLayout {
            block_id: "b1".into(),
            patch: LayoutPatch { rotation: Some(30.0), ..LayoutPatch::position(Vec2::new(5.0, 6.0)) },
            touched_at: Some(999),
        },
        Step::AddConnector { connector: Connector::between("c2", "b2", "b3") },
        Step::RemoveConnector { connector_id: "c1".into() },
        Step::AddTimelineItem { item: item("t2", "b2") },
        Step::UpdateTimelineItem {
            timeline_id: "t1".into(),
            patch: TimelinePatch { time_range: Some(None), order: Some(42), ..TimelinePatch::default() },
        },
        Step::RemoveTimelineItem { timeline_id: "t1".into() },
        Step::SetViewport { patch: ViewportPatch { center: Some(Vec2::new(10.0, 10.0)), zoom: Some(2.0) } },
        Step::SetSelection { selection: Selection::blocks(["b1", "b2"]) },
    ];
    for step in &steps {
        assert_round_trip(step, &state);
    }
}

#[test]
fn apply_does_not_touch_input() {
    let state = seeded();
    let snapshot = state.clone();
    let next = Step::RemoveBlock { block_id: "b3".into() }.apply(&state).unwrap();
    assert_eq!(state, snapshot);
    assert!(next.doc.block("b3").is_none());
    assert!(state.doc.block("b3").is_some());
}

// =============================================================
// Block steps
// =============================================================

#[test]
fn add_duplicate_block_fails() {
    let err = Step::AddBlock { block: note("b1", 0.0, 0.0) }.apply(&seeded()).unwrap_err();
    assert_eq!(err, StepError::Structural(StructuralError::DuplicateBlock("b1".into())));
}

#[test]
fn add_invalid_block_fails() {
    let mut block = note("b9", 0.0, 0.0);
    block.layout.size = Size::new(-1.0, 10.0);
    let err = Step::AddBlock { block }.apply(&seeded()).unwrap_err();
    assert!(matches!(err, StepError::Validation(ValidationError::NonPositiveSize { .. })));
}

#[test]
fn rules_are_pluggable() {
    let mut block = note("b9", 0.0, 0.0);
    block.payload = BlockPayload::Note(NoteInfo { text: String::new() });
    let step = Step::AddBlock { block };
    assert!(step.apply(&seeded()).is_err());
    assert!(step.apply_with(&seeded(), &NoRules).is_ok());
}

#[test]
fn remove_missing_block_fails() {
    let err = Step::RemoveBlock { block_id: "ghost".into() }.apply(&seeded()).unwrap_err();
    assert_eq!(err, StepError::Structural(StructuralError::BlockNotFound("ghost".into())));
}

#[test]
fn remove_referenced_block_fails() {
    let err = Step::RemoveBlock { block_id: "b2".into() }.apply(&seeded()).unwrap_err();
    assert_eq!(
        err,
        StepError::Structural(StructuralError::BlockStillReferenced { block: "b2".into(), referrer: "c1".into() })
    );
}

#[test]
fn layout_update_to_zero_size_fails() {
    let step = Step::UpdateBlockLayout {
        block_id: "b1".into(),
        patch: LayoutPatch::size(Size::new(0.0, 0.0)),
        touched_at: None,
    };
    assert!(matches!(step.apply(&seeded()), Err(StepError::Validation(ValidationError::NonPositiveSize { .. }))));
}

#[test]
fn layout_update_to_infinite_size_fails() {
    let step = Step::UpdateBlockLayout {
        block_id: "b1".into(),
        patch: LayoutPatch::size(Size::new(f64::INFINITY, 100.0)),
        touched_at: None,
    };
    assert!(matches!(step.apply(&seeded()), Err(StepError::Validation(ValidationError::NonFiniteSize { .. }))));
}

#[test]
fn layout_update_sets_touched_at() {
    let step = Step::UpdateBlockLayout {
        block_id: "b1".into(),
        patch: LayoutPatch::position(Vec2::new(1.0, 1.0)),
        touched_at: Some(500),
    };
    let next = step.apply(&seeded()).unwrap();
    assert_eq!(next.doc.block("b1").unwrap().updated_at, 500);

    let untouched = Step::UpdateBlockLayout {
        block_id: "b1".into(),
        patch: LayoutPatch::position(Vec2::new(1.0, 1.0)),
        touched_at: None,
    };
    let next = untouched.apply(&seeded()).unwrap();
    assert_eq!(next.doc.block("b1").unwrap().updated_at, 100);
}

#[test]
fn layout_inverse_restores_full_layout() {
    let state = seeded();
    let step = Step::UpdateBlockLayout {
        block_id: "b1".into(),
        patch: LayoutPatch::position(Vec2::new(1.0, 1.0)),
        touched_at: Some(500),
    };
    let Step::UpdateBlockLayout { patch, touched_at, .. } = step.invert(&state).unwrap() else {
        unreachable!("layout step must invert to a layout step");
    };
    assert_eq!(patch, LayoutPatch::full(&state.doc.block("b1").unwrap().layout));
    assert_eq!(touched_at, Some(100));
}

// =============================================================
// Connector and timeline steps
// =============================================================

#[test]
fn self_connector_fails() {
    let err = Step::AddConnector { connector: Connector::between("c9", "b1", "b1") }.apply(&seeded()).unwrap_err();
    assert!(matches!(err, StepError::Validation(ValidationError::SelfReferencingConnector(_))));
}

#[test]
fn duplicate_connector_fails() {
    let err = Step::AddConnector { connector: Connector::between("c1", "b2", "b3") }.apply(&seeded()).unwrap_err();
    assert_eq!(err, StepError::Structural(StructuralError::DuplicateConnector("c1".into())));
}

#[test]
fn timeline_item_needs_existing_block() {
    let err = Step::AddTimelineItem { item: item("t9", "ghost") }.apply(&seeded()).unwrap_err();
    assert_eq!(err, StepError::Structural(StructuralError::BlockNotFound("ghost".into())));
}

#[test]
fn timeline_update_validates_range() {
    let step = Step::UpdateTimelineItem {
        timeline_id: "t1".into(),
        patch: TimelinePatch {
            time_range: Some(Some(TimeRange::new("2025-03-01T10:00:00Z", "2025-03-01T09:00:00Z"))),
            ..TimelinePatch::default()
        },
    };
    assert!(matches!(step.apply(&seeded()), Err(StepError::Validation(ValidationError::InvertedTimeRange { .. }))));
}

// =============================================================
// View steps
// =============================================================

#[test]
fn zero_zoom_rejected() {
    let step = Step::SetViewport { patch: ViewportPatch { center: None, zoom: Some(0.0) } };
    assert_eq!(step.apply(&seeded()), Err(StepError::Validation(ValidationError::InvalidZoom(0.0))));
}

#[test]
fn viewport_patch_keeps_unset_fields() {
    let step = Step::SetViewport { patch: ViewportPatch { center: None, zoom: Some(3.0) } };
    let next = step.apply(&seeded()).unwrap();
    assert_eq!(next.viewport, Viewport { center: Vec2::default(), zoom: 3.0 });
}

// =============================================================
// Invert failures
// =============================================================

#[test]
fn invert_remove_without_prior_block_is_invariant_violation() {
    let err = Step::RemoveBlock { block_id: "ghost".into() }.invert(&seeded()).unwrap_err();
    assert_eq!(err, InvariantViolation::MissingBlock { step: "remove-block", id: "ghost".into() });
}

#[test]
fn invert_missing_timeline_item() {
    let err = Step::RemoveTimelineItem { timeline_id: "t9".into() }.invert(&seeded()).unwrap_err();
    assert!(matches!(err, InvariantViolation::MissingTimelineItem { .. }));
}

// =============================================================
// Serde
// =============================================================

#[test]
fn step_serializes_with_op_tag() {
    let step = Step::RemoveConnector { connector_id: "c1".into() };
    let value = serde_json::to_value(&step).unwrap();
    assert_eq!(value, json!({"op": "remove_connector", "connector_id": "c1"}));
    let back: Step = serde_json::from_value(value).unwrap();
    assert_eq!(back, step);
}

#[test]
fn names_are_kebab_case() {
    assert_eq!(Step::SetSelection { selection: Selection::default() }.name(), "set-selection");
    assert_eq!(Step::AddTimelineItem { item: item("t", "b1") }.name(), "add-timeline-item");
}
