//! Document model: blocks, connectors, timeline items, and the snapshot that owns them.
//!
//! A [`Document`] is an immutable value. The three entity tables are
//! persistent ordered maps, so `clone()` is O(1) and an insert or removal
//! copies only the path to the touched key. Nothing in this module mutates a
//! published snapshot; the step engine builds new ones.
//!
//! Blocks are a closed tagged union ([`BlockPayload`]) sharing a common
//! envelope ([`Block`]) with layout, timestamps, and an optional external
//! source reference.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use im::OrdMap;
use serde::{Deserialize, Serialize};

/// Unique identifier for a block.
pub type BlockId = String;
/// Unique identifier for a connector.
pub type ConnectorId = String;
/// Unique identifier for a timeline item.
pub type TimelineId = String;

// =============================================================
// Geometry primitives
// =============================================================

/// A point or offset in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn offset(self, delta: Vec2) -> Self {
        Self { x: self.x + delta.x, y: self.y + delta.y }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width and height in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Start/end pair of ISO-8601 instants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

impl TimeRange {
    #[must_use]
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self { start: start.into(), end: end.into() }
    }
}

// =============================================================
// Layout
// =============================================================

/// Placement of a block on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockLayout {
    /// Top-left corner in world coordinates.
    pub position: Vec2,
    pub size: Size,
    /// Clockwise rotation in degrees.
    pub rotation: f64,
    /// Stacking order; lower values are drawn beneath higher values.
    pub z_index: i64,
    /// Locked blocks are still movable through commands; the host decides
    /// whether to honor the flag for pointer gestures.
    pub locked: bool,
}

impl BlockLayout {
    /// Return a copy with every present field of `patch` applied.
    #[must_use]
    pub fn patched(&self, patch: &LayoutPatch) -> Self {
        Self {
            position: patch.position.unwrap_or(self.position),
            size: patch.size.unwrap_or(self.size),
            rotation: patch.rotation.unwrap_or(self.rotation),
            z_index: patch.z_index.unwrap_or(self.z_index),
            locked: patch.locked.unwrap_or(self.locked),
        }
    }
}

/// Sparse update for a block layout. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

impl LayoutPatch {
    /// Patch that only moves the block.
    #[must_use]
    pub fn position(position: Vec2) -> Self {
        Self { position: Some(position), ..Self::default() }
    }

    /// Patch that only resizes the block.
    #[must_use]
    pub fn size(size: Size) -> Self {
        Self { size: Some(size), ..Self::default() }
    }

    /// Patch that overwrites every field, used to restore a full layout.
    #[must_use]
    pub fn full(layout: &BlockLayout) -> Self {
        Self {
            position: Some(layout.position),
            size: Some(layout.size),
            rotation: Some(layout.rotation),
            z_index: Some(layout.z_index),
            locked: Some(layout.locked),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.position.is_none()
            && self.size.is_none()
            && self.rotation.is_none()
            && self.z_index.is_none()
            && self.locked.is_none()
    }
}

// =============================================================
// Blocks
// =============================================================

/// Kind tag for a block. Mirrors the variants of [`BlockPayload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Flight,
    Hotel,
    Attraction,
    Transport,
    Note,
    Image,
}

impl BlockKind {
    /// Every kind, in declaration order.
    pub const ALL: [BlockKind; 6] = [
        BlockKind::Flight,
        BlockKind::Hotel,
        BlockKind::Attraction,
        BlockKind::Transport,
        BlockKind::Note,
        BlockKind::Image,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flight => "flight",
            Self::Hotel => "hotel",
            Self::Attraction => "attraction",
            Self::Transport => "transport",
            Self::Note => "note",
            Self::Image => "image",
        }
    }
}

/// Means of travel for a transport block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Train,
    Metro,
    Bus,
    Car,
    Walk,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightInfo {
    pub title: String,
    pub from_airport: String,
    pub to_airport: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<String>,
    /// Departure and arrival.
    pub time: TimeRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelInfo {
    pub title: String,
    pub address: String,
    /// Check-in and check-out.
    pub time: TimeRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttractionInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_stay_hours: Option<f64>,
    /// Planned visit date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<TransportMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteInfo {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Kind-specific block data, tagged by `kind` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlockPayload {
    Flight(FlightInfo),
    Hotel(HotelInfo),
    Attraction(AttractionInfo),
    Transport(TransportInfo),
    Note(NoteInfo),
    Image(ImageInfo),
}

impl BlockPayload {
    #[must_use]
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Flight(_) => BlockKind::Flight,
            Self::Hotel(_) => BlockKind::Hotel,
            Self::Attraction(_) => BlockKind::Attraction,
            Self::Transport(_) => BlockKind::Transport,
            Self::Note(_) => BlockKind::Note,
            Self::Image(_) => BlockKind::Image,
        }
    }
}

/// Reference to the record a block was imported from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSource {
    pub provider: String,
    pub external_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A block as stored in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub layout: BlockLayout,
    /// Creation time in Unix milliseconds.
    pub created_at: i64,
    /// Last layout or content change in Unix milliseconds.
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ExternalSource>,
    #[serde(flatten)]
    pub payload: BlockPayload,
}

impl Block {
    #[must_use]
    pub fn kind(&self) -> BlockKind {
        self.payload.kind()
    }

    /// Time span of time-bearing kinds (flight, hotel, and transport when set).
    #[must_use]
    pub fn time_range(&self) -> Option<&TimeRange> {
        match &self.payload {
            BlockPayload::Flight(f) => Some(&f.time),
            BlockPayload::Hotel(h) => Some(&h.time),
            BlockPayload::Transport(t) => t.time.as_ref(),
            BlockPayload::Attraction(_) | BlockPayload::Note(_) | BlockPayload::Image(_) => None,
        }
    }

    /// Display title, or `None` for kinds without one.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match &self.payload {
            BlockPayload::Flight(f) => Some(&f.title),
            BlockPayload::Hotel(h) => Some(&h.title),
            BlockPayload::Attraction(a) => Some(&a.title),
            BlockPayload::Transport(t) => Some(&t.title),
            BlockPayload::Note(_) | BlockPayload::Image(_) => None,
        }
    }
}

// =============================================================
// Connectors
// =============================================================

/// Arrowhead placement on a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowHead {
    None,
    #[default]
    End,
    Both,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorStyle {
    /// CSS color string.
    pub color: String,
    pub width: f64,
    pub dashed: bool,
    pub arrow_head: ArrowHead,
}

impl Default for ConnectorStyle {
    fn default() -> Self {
        Self { color: "#666666".into(), width: 2.0, dashed: true, arrow_head: ArrowHead::End }
    }
}

/// Directed relation between two blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub id: ConnectorId,
    pub from: BlockId,
    pub to: BlockId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,
    pub style: ConnectorStyle,
}

impl Connector {
    /// Connector with the default style.
    #[must_use]
    pub fn between(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            label: None,
            duration_minutes: None,
            style: ConnectorStyle::default(),
        }
    }

    #[must_use]
    pub fn touches(&self, block_id: &str) -> bool {
        self.from == block_id || self.to == block_id
    }
}

// =============================================================
// Timeline
// =============================================================

/// Structured itinerary entry tied to a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub id: TimelineId,
    pub block_id: BlockId,
    /// Calendar day, `YYYY-MM-DD`.
    pub day: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    /// Sort key within a day.
    pub order: i64,
}

impl TimelineItem {
    #[must_use]
    pub fn patched(&self, patch: &TimelinePatch) -> Self {
        Self {
            id: self.id.clone(),
            block_id: patch.block_id.clone().unwrap_or_else(|| self.block_id.clone()),
            day: patch.day.clone().unwrap_or_else(|| self.day.clone()),
            time_range: match &patch.time_range {
                Some(range) => range.clone(),
                None => self.time_range.clone(),
            },
            order: patch.order.unwrap_or(self.order),
        }
    }
}

/// Sparse update for a timeline item.
///
/// `time_range` is doubly optional: `Some(None)` clears the range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelinePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<Option<TimeRange>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl TimelinePatch {
    /// Patch that restores every field of `item`.
    #[must_use]
    pub fn full(item: &TimelineItem) -> Self {
        Self {
            block_id: Some(item.block_id.clone()),
            day: Some(item.day.clone()),
            time_range: Some(item.time_range.clone()),
            order: Some(item.order),
        }
    }
}

// =============================================================
// Document
// =============================================================

/// One trip board: its blocks, connectors, and timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub blocks: OrdMap<BlockId, Block>,
    pub connectors: OrdMap<ConnectorId, Connector>,
    pub timeline: OrdMap<TimelineId, TimelineItem>,
}

impl Document {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            blocks: OrdMap::new(),
            connectors: OrdMap::new(),
            timeline: OrdMap::new(),
        }
    }

    #[must_use]
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    #[must_use]
    pub fn connector(&self, id: &str) -> Option<&Connector> {
        self.connectors.get(id)
    }

    #[must_use]
    pub fn timeline_item(&self, id: &str) -> Option<&TimelineItem> {
        self.timeline.get(id)
    }

    /// Connectors with `block_id` at either end, ordered by connector id.
    pub fn connectors_touching<'a>(&'a self, block_id: &'a str) -> impl Iterator<Item = &'a Connector> + 'a {
        self.connectors.values().filter(move |c| c.touches(block_id))
    }

    /// Timeline items that reference `block_id`, ordered by item id.
    pub fn timeline_for_block<'a>(&'a self, block_id: &'a str) -> impl Iterator<Item = &'a TimelineItem> + 'a {
        self.timeline.values().filter(move |t| t.block_id == block_id)
    }

    /// Timeline items sorted for display: by day, then order key, then id.
    #[must_use]
    pub fn sorted_timeline(&self) -> Vec<&TimelineItem> {
        let mut items: Vec<&TimelineItem> = self.timeline.values().collect();
        items.sort_by(|a, b| a.day.cmp(&b.day).then(a.order.cmp(&b.order)).then_with(|| a.id.cmp(&b.id)));
        items
    }
}
