//! Block and connector constructors.
//!
//! Every factory takes its id generator and timestamp explicitly and
//! validates the result with [`TripRules`] before handing it back.

use crate::doc::{
    Block, BlockLayout, BlockPayload, Connector, ExternalSource, FlightInfo, NoteInfo, Size, TimeRange,
    Vec2,
};
use crate::error::ValidationError;
use crate::ids::IdGenerator;
use crate::validate::{TripRules, validate_block};

/// Provider tag recorded on imported flights.
pub const TRIP_PROVIDER: &str = "trip.com";

/// Default block footprint.
pub const DEFAULT_BLOCK_SIZE: Size = Size { width: 200.0, height: 120.0 };

/// Unrotated, unlocked 200x120 layout at `position`.
#[must_use]
pub fn default_layout(position: Vec2) -> BlockLayout {
    BlockLayout { position, size: DEFAULT_BLOCK_SIZE, rotation: 0.0, z_index: 0, locked: false }
}

/// Input for [`create_flight_block`].
#[derive(Debug, Clone, Default)]
pub struct FlightInput {
    pub title: String,
    pub from_airport: String,
    pub to_airport: String,
    pub time: TimeRange,
    pub position: Vec2,
    pub carrier: Option<String>,
    pub flight_number: Option<String>,
    /// Booking id on the provider side, when imported.
    pub source_external_id: Option<String>,
}

/// # Errors
///
/// Returns the first invariant or trip rule the flight breaks.
pub fn create_flight_block(input: FlightInput, ids: &mut dyn IdGenerator, now: i64) -> Result<Block, ValidationError> {
    let block = Block {
        id: ids.next_id("block"),
        layout: default_layout(input.position),
        created_at: now,
        updated_at: now,
        source: input.source_external_id.map(|external_id| ExternalSource {
            provider: TRIP_PROVIDER.into(),
            external_id,
            url: None,
        }),
        payload: BlockPayload::Flight(FlightInfo {
            title: input.title,
            from_airport: input.from_airport,
            to_airport: input.to_airport,
            carrier: input.carrier,
            flight_number: input.flight_number,
            time: input.time,
        }),
    };
    validate_block(&block, &TripRules)?;
    Ok(block)
}

/// # Errors
///
/// Rejects empty text.
pub fn create_note_block(
    text: impl Into<String>,
    position: Vec2,
    ids: &mut dyn IdGenerator,
    now: i64,
) -> Result<Block, ValidationError> {
    let block = Block {
        id: ids.next_id("block"),
        layout: default_layout(position),
        created_at: now,
        updated_at: now,
        source: None,
        payload: BlockPayload::Note(NoteInfo { text: text.into() }),
    };
    validate_block(&block, &TripRules)?;
    Ok(block)
}

/// Connector with the default dashed arrow style.
///
/// # Errors
///
/// Rejects `from == to`. Endpoint existence is checked when the connector is
/// added to a document.
pub fn create_connector(
    from: impl Into<String>,
    to: impl Into<String>,
    ids: &mut dyn IdGenerator,
) -> Result<Connector, ValidationError> {
    let connector = Connector::between(ids.next_id("connector"), from, to);
    if connector.from == connector.to {
        return Err(ValidationError::SelfReferencingConnector(connector.id));
    }
    Ok(connector)
}
