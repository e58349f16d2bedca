use super::*;
use editor::doc::{AttractionInfo, FlightInfo, HotelInfo, ImageInfo, NoteInfo, TransportInfo};
use editor::factory::default_layout;
use editor::{Connector, TimeRange, Vec2};

fn block(id: &str, x: f64, z: i64, payload: BlockPayload) -> Block {
    let mut layout = default_layout(Vec2::new(x, 0.0));
    layout.z_index = z;
    Block { id: id.into(), layout, created_at: 0, updated_at: 0, source: None, payload }
}

fn note(id: &str, x: f64, z: i64) -> Block {
    block(id, x, z, BlockPayload::Note(NoteInfo { text: format!("note {id}") }))
}

fn sample(kind: BlockKind) -> BlockPayload {
    let time = TimeRange::new("2025-03-01T08:00:00Z", "2025-03-01T10:00:00Z");
    match kind {
        BlockKind::Flight => BlockPayload::Flight(FlightInfo {
            title: "Shanghai to Tokyo".into(),
            from_airport: "PVG".into(),
            to_airport: "NRT".into(),
            carrier: None,
            flight_number: Some("MU523".into()),
            time,
        }),
        BlockKind::Hotel => {
            BlockPayload::Hotel(HotelInfo { title: "Park Hyatt".into(), address: "Shinjuku".into(), time })
        }
        BlockKind::Attraction => BlockPayload::Attraction(AttractionInfo {
            title: "Senso-ji".into(),
            address: None,
            city: None,
            estimated_stay_hours: None,
            date: None,
        }),
        BlockKind::Transport => BlockPayload::Transport(TransportInfo {
            title: "Narita Express".into(),
            from: None,
            to: None,
            time: None,
            mode: None,
        }),
        BlockKind::Note => BlockPayload::Note(NoteInfo { text: "buy a Suica card at the station".into() }),
        BlockKind::Image => BlockPayload::Image(ImageInfo { url: "https://example.com/a.png".into(), alt: None }),
    }
}

fn doc_with(blocks: Vec<Block>, connectors: Vec<Connector>) -> Document {
    let mut doc = Document::new("d", "Trip");
    for b in blocks {
        doc.blocks.insert(b.id.clone(), b);
    }
    for c in connectors {
        doc.connectors.insert(c.id.clone(), c);
    }
    doc
}

// =============================================================
// Every kind is handled
// =============================================================

#[test]
fn every_kind_has_style_and_label() {
    for kind in BlockKind::ALL {
        let b = block("b", 0.0, 0, sample(kind));
        let style = block_style(kind);
        assert!(style.border_width > 0.0, "{kind:?}");
        assert!(style.border_width <= crate::consts::MAX_BORDER_WIDTH_PX, "{kind:?} border outgrows index queries");
        assert!(!style.background.is_empty(), "{kind:?}");
        assert!(!block_label(&b).is_empty(), "{kind:?} has no label");
    }
}

#[test]
fn unstyled_kinds_share_default() {
    assert_eq!(block_style(BlockKind::Attraction), block_style(BlockKind::Image));
    assert_ne!(block_style(BlockKind::Flight), block_style(BlockKind::Image));
    assert_eq!(block_style(BlockKind::Hotel).background, "#f3e5f5");
}

// =============================================================
// Labels
// =============================================================

#[test]
fn flight_label_prefers_flight_number() {
    assert_eq!(block_label(&block("f", 0.0, 0, sample(BlockKind::Flight))), "MU523");
    let BlockPayload::Flight(info) = sample(BlockKind::Flight) else { unreachable!() };
    let unnumbered = BlockPayload::Flight(FlightInfo { flight_number: Some(String::new()), ..info });
    assert_eq!(block_label(&block("f", 0.0, 0, unnumbered)), "Shanghai to Tokyo");
}

#[test]
fn note_label_is_truncated() {
    assert_eq!(block_label(&block("n", 0.0, 0, sample(BlockKind::Note))), "buy a Suica card at ");
}

#[test]
fn note_label_counts_characters_not_bytes() {
    let b = block("n", 0.0, 0, BlockPayload::Note(NoteInfo { text: "东京".repeat(15) }));
    assert_eq!(block_label(&b).chars().count(), 20);
}

#[test]
fn image_label_falls_back_to_kind() {
    assert_eq!(block_label(&block("i", 0.0, 0, sample(BlockKind::Image))), "image");
}

// =============================================================
// Projection
// =============================================================

#[test]
fn blocks_sorted_by_z_then_id() {
    let doc = doc_with(vec![note("c", 0.0, 1), note("b", 0.0, 0), note("a", 0.0, 1)], vec![]);
    let scene = build_scene(&doc);
    let order: Vec<_> = scene.blocks.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(order, vec!["b", "a", "c"]);
    assert_eq!(scene.block("c").map(|b| b.z_index), Some(1));
}

#[test]
fn bounds_follow_layout() {
    let scene = build_scene(&doc_with(vec![note("a", 40.0, 0)], vec![]));
    assert_eq!(scene.block("a").map(|b| b.bounds), Some(Rect::new(40.0, 0.0, 200.0, 120.0)));
}

#[test]
fn connectors_sit_below_blocks() {
    let doc = doc_with(vec![note("a", 0.0, 0), note("b", 300.0, 0)], vec![Connector::between("c1", "a", "b")]);
    let scene = build_scene(&doc);
    assert_eq!(scene.connectors.len(), 1);
    assert_eq!(scene.connectors[0].z_index, -1);
    assert!(scene.connectors[0].style.dashed);
}

#[test]
fn dangling_connectors_are_skipped() {
    let doc = doc_with(vec![note("a", 0.0, 0)], vec![Connector::between("c1", "a", "gone")]);
    assert!(build_scene(&doc).connectors.is_empty());
}

#[test]
fn empty_document_builds_empty_scene() {
    let scene = build_scene(&Document::new("d", "Trip"));
    assert!(scene.is_empty());
    assert!(scene.block("a").is_none());
}
