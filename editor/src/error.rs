//! Error taxonomy for the document engine.
//!
//! [`ValidationError`] and [`StructuralError`] are ordinary rejections: the
//! edit was ill-formed and the document is untouched. [`InvariantViolation`]
//! means the history and document disagree, which a well-formed history
//! never produces.

use crate::doc::BlockKind;

// =============================================================================
// STEP LEVEL
// =============================================================================

/// An entity would violate one of its invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("block size must be positive, got {width}x{height}")]
    NonPositiveSize { width: f64, height: f64 },
    #[error("block extent must be finite, got {width}x{height}")]
    NonFiniteSize { width: f64, height: f64 },
    #[error("block position must be finite")]
    NonFinitePosition,
    #[error("block rotation must be finite")]
    NonFiniteRotation,
    #[error("time must be a valid ISO-8601 instant: {0:?}")]
    InvalidInstant(String),
    #[error("time range start must be before end: {start} >= {end}")]
    InvertedTimeRange { start: String, end: String },
    #[error("connector {0} references itself")]
    SelfReferencingConnector(String),
    #[error("viewport zoom must be finite and positive, got {0}")]
    InvalidZoom(f64),
    #[error("{kind:?} block rejected: {reason}")]
    Rule { kind: BlockKind, reason: String },
}

/// A step referenced an entity that is missing or already present.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
    #[error("block already exists: {0}")]
    DuplicateBlock(String),
    #[error("block not found: {0}")]
    BlockNotFound(String),
    #[error("connector already exists: {0}")]
    DuplicateConnector(String),
    #[error("connector not found: {0}")]
    ConnectorNotFound(String),
    #[error("connector {connector} references missing block {block}")]
    DanglingEndpoint { connector: String, block: String },
    #[error("timeline item already exists: {0}")]
    DuplicateTimelineItem(String),
    #[error("timeline item not found: {0}")]
    TimelineItemNotFound(String),
    #[error("block {block} is still referenced by {referrer}")]
    BlockStillReferenced { block: String, referrer: String },
}

/// Reason a single step failed to apply.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Structural(#[from] StructuralError),
}

/// `invert` could not find the entity it needs to restore.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("cannot invert {step}: block {id} missing from prior state")]
    MissingBlock { step: &'static str, id: String },
    #[error("cannot invert {step}: connector {id} missing from prior state")]
    MissingConnector { step: &'static str, id: String },
    #[error("cannot invert {step}: timeline item {id} missing from prior state")]
    MissingTimelineItem { step: &'static str, id: String },
}

// =============================================================================
// TRANSACTION / COMMAND LEVEL
// =============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransactionError {
    #[error("step {index} ({step}) failed: {source}")]
    StepFailed {
        index: usize,
        step: &'static str,
        #[source]
        source: StepError,
    },
    #[error("step {index} could not be inverted: {source}")]
    Invert {
        index: usize,
        #[source]
        source: InvariantViolation,
    },
}

/// Which stack an undo or redo was drawing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

impl std::fmt::Display for HistoryDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undo => f.write_str("undo"),
            Self::Redo => f.write_str("redo"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// The command's transaction was rejected; the state is unchanged.
    #[error("command rejected: {0}")]
    Rejected(#[from] TransactionError),
    /// A history entry failed to replay. State and stacks are unchanged.
    #[error("history corrupt on {direction}: {source}")]
    HistoryCorrupt {
        direction: HistoryDirection,
        #[source]
        source: TransactionError,
    },
    /// Command input failed validation before a transaction was built.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),
}
