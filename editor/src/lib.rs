//! Document engine for the trip planning whiteboard.
//!
//! Every edit to the board flows through this crate as a [`step::Step`]
//! grouped into a [`transaction::Transaction`]. Transactions apply atomically
//! to an immutable [`state::EditorState`] snapshot and yield a fresh snapshot
//! plus the inverse transaction, which the [`history::HistoryState`] keeps for
//! undo and redo. The host UI talks to the [`command`] layer only; it never
//! builds steps by hand.
//!
//! Snapshots are built on persistent maps and vectors from `im`, so cloning a
//! state is cheap and an edit copies only the branches it touches. A renderer
//! holding an older snapshot never observes a half-applied edit.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`doc`] | Blocks, connectors, timeline items and the document snapshot |
//! | [`view`] | Viewport and selection |
//! | [`state`] | The editor snapshot handed between commands |
//! | [`validate`] | Entity invariants and pluggable business rules |
//! | [`step`] | Smallest invertible mutation |
//! | [`transaction`] | Atomic batches of steps and their inverses |
//! | [`history`] | Undo/redo stacks with group coalescing |
//! | [`command`] | Named high-level edits used by the host |
//! | [`factory`] | Block and connector constructors |
//! | [`ids`] | Injectable id generators |
//! | [`error`] | Error taxonomy |

pub mod command;
pub mod doc;
pub mod error;
pub mod factory;
pub mod history;
pub mod ids;
pub mod state;
pub mod step;
pub mod transaction;
pub mod validate;
pub mod view;

pub use doc::{
    Block, BlockId, BlockKind, BlockLayout, BlockPayload, Connector, ConnectorId, ConnectorStyle, Document, LayoutPatch,
    Size, TimeRange, TimelineId, TimelineItem, TimelinePatch, Vec2,
};
pub use error::{CommandError, InvariantViolation, StepError, StructuralError, TransactionError, ValidationError};
pub use history::{HistoryEntry, HistoryState};
pub use state::EditorState;
pub use step::Step;
pub use transaction::{Transaction, TransactionMeta, TransactionSource};
pub use view::{Selection, Viewport, ViewportPatch};
