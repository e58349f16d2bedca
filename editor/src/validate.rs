//! Validation: structural invariants every step enforces, plus pluggable
//! business rules.
//!
//! Core invariants (positive size, finite geometry, ordered time ranges,
//! connector endpoints) are never optional. Content rules such as "a flight
//! needs both airports" live behind [`BlockRules`] so hosts can swap them.

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::doc::{Block, BlockKind, BlockPayload, Connector, Document, TimeRange, TimelineItem, Vec2};
use crate::error::{StepError, StructuralError, ValidationError};
use crate::view::Viewport;

// =============================================================
// Rules
// =============================================================

/// Content rules applied after the core invariants pass.
pub trait BlockRules {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] describing the first rule the block breaks.
    fn check(&self, block: &Block) -> Result<(), ValidationError>;
}

/// Rules for trip planning boards.
#[derive(Debug, Clone, Copy, Default)]
pub struct TripRules;

/// Accepts every block that satisfies the core invariants.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRules;

impl BlockRules for TripRules {
    fn check(&self, block: &Block) -> Result<(), ValidationError> {
        let kind = block.kind();
        let reject = |reason: &str| Err(ValidationError::Rule { kind, reason: reason.to_owned() });
        match &block.payload {
            BlockPayload::Flight(f) => {
                if f.from_airport.is_empty() || f.to_airport.is_empty() {
                    return reject("flight needs departure and arrival airports");
                }
            }
            BlockPayload::Hotel(h) => {
                if h.address.is_empty() {
                    return reject("hotel needs an address");
                }
            }
            BlockPayload::Attraction(a) => {
                if a.title.is_empty() {
                    return reject("attraction needs a title");
                }
                if let Some(date) = &a.date {
                    parse_instant(date)?;
                }
            }
            BlockPayload::Transport(t) => {
                if t.title.is_empty() {
                    return reject("transport needs a title");
                }
            }
            BlockPayload::Note(n) => {
                if n.text.is_empty() {
                    return reject("note text must not be empty");
                }
            }
            BlockPayload::Image(_) => {}
        }
        Ok(())
    }
}

impl BlockRules for NoRules {
    fn check(&self, _block: &Block) -> Result<(), ValidationError> {
        Ok(())
    }
}

// =============================================================
// Entity checks
// =============================================================

/// Core invariants followed by `rules`.
///
/// # Errors
///
/// Returns the first violated invariant or rule.
pub fn validate_block(block: &Block, rules: &dyn BlockRules) -> Result<(), ValidationError> {
    let layout = &block.layout;
    if !(layout.size.width > 0.0 && layout.size.height > 0.0) {
        return Err(ValidationError::NonPositiveSize { width: layout.size.width, height: layout.size.height });
    }
    if !layout.position.is_finite() {
        return Err(ValidationError::NonFinitePosition);
    }
    let far = layout.position.offset(Vec2::new(layout.size.width, layout.size.height));
    if !(layout.size.width.is_finite() && layout.size.height.is_finite() && far.is_finite()) {
        return Err(ValidationError::NonFiniteSize { width: layout.size.width, height: layout.size.height });
    }
    if !layout.rotation.is_finite() {
        return Err(ValidationError::NonFiniteRotation);
    }
    if let Some(range) = block.time_range() {
        validate_time_range(range)?;
    }
    rules.check(block)
}

/// Self-reference and endpoint existence.
///
/// # Errors
///
/// Self-referencing connectors are a validation failure; missing endpoints
/// are structural.
pub fn validate_connector(connector: &Connector, doc: &Document) -> Result<(), StepError> {
    if connector.from == connector.to {
        return Err(ValidationError::SelfReferencingConnector(connector.id.clone()).into());
    }
    for endpoint in [&connector.from, &connector.to] {
        if !doc.blocks.contains_key(endpoint) {
            return Err(StructuralError::DanglingEndpoint { connector: connector.id.clone(), block: endpoint.clone() }
                .into());
        }
    }
    Ok(())
}

/// Referenced block exists, the day parses, and any time range is ordered.
///
/// # Errors
///
/// Returns a structural error for a missing block, otherwise a validation error.
pub fn validate_timeline_item(item: &TimelineItem, doc: &Document) -> Result<(), StepError> {
    if !doc.blocks.contains_key(&item.block_id) {
        return Err(StructuralError::BlockNotFound(item.block_id.clone()).into());
    }
    parse_instant(&item.day)?;
    if let Some(range) = &item.time_range {
        validate_time_range(range)?;
    }
    Ok(())
}

/// # Errors
///
/// Rejects non-finite centers and zoom factors that are not strictly positive.
pub fn validate_viewport(viewport: &Viewport) -> Result<(), ValidationError> {
    if !viewport.center.is_finite() {
        return Err(ValidationError::NonFinitePosition);
    }
    if !(viewport.zoom.is_finite() && viewport.zoom > 0.0) {
        return Err(ValidationError::InvalidZoom(viewport.zoom));
    }
    Ok(())
}

/// Both ends parse and `start < end`.
///
/// # Errors
///
/// [`ValidationError::InvalidInstant`] or [`ValidationError::InvertedTimeRange`].
pub fn validate_time_range(range: &TimeRange) -> Result<(), ValidationError> {
    let start = parse_instant(&range.start)?;
    let end = parse_instant(&range.end)?;
    if start >= end {
        return Err(ValidationError::InvertedTimeRange { start: range.start.clone(), end: range.end.clone() });
    }
    Ok(())
}

// =============================================================
// Time parsing
// =============================================================

/// Parse an ISO-8601 instant.
///
/// Accepts RFC 3339 (`2025-03-01T08:00:00Z`), a naive date-time taken as UTC
/// (`2025-03-01T08:00:00`, optional fraction), or a bare date at midnight UTC.
///
/// # Errors
///
/// [`ValidationError::InvalidInstant`] when none of the forms match.
pub fn parse_instant(raw: &str) -> Result<OffsetDateTime, ValidationError> {
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(dt);
    }
    let naive = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let naive_fraction = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
    for format in [naive, naive_fraction] {
        if let Ok(dt) = PrimitiveDateTime::parse(raw, format) {
            return Ok(dt.assume_utc());
        }
    }
    if let Ok(date) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Ok(date.midnight().assume_utc());
    }
    Err(ValidationError::InvalidInstant(raw.to_owned()))
}

/// Unix milliseconds of an ISO-8601 instant.
///
/// # Errors
///
/// Propagates [`parse_instant`] failures.
pub fn instant_ms(raw: &str) -> Result<i64, ValidationError> {
    let dt = parse_instant(raw)?;
    let ms = dt.unix_timestamp_nanos() / 1_000_000;
    i64::try_from(ms).map_err(|_| ValidationError::InvalidInstant(raw.to_owned()))
}

/// UTC calendar day (`YYYY-MM-DD`) of an ISO-8601 instant.
///
/// # Errors
///
/// Propagates [`parse_instant`] failures.
pub fn utc_day(raw: &str) -> Result<String, ValidationError> {
    let date = parse_instant(raw)?.to_offset(UtcOffset::UTC).date();
    date.format(format_description!("[year]-[month]-[day]"))
        .map_err(|_| ValidationError::InvalidInstant(raw.to_owned()))
}

/// Kinds whose core validation includes a time range check.
#[must_use]
pub fn is_time_bearing(kind: BlockKind) -> bool {
    match kind {
        BlockKind::Flight | BlockKind::Hotel | BlockKind::Transport => true,
        BlockKind::Attraction | BlockKind::Note | BlockKind::Image => false,
    }
}
