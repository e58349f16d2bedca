//! The editor snapshot threaded through every command.

use serde::{Deserialize, Serialize};

use crate::doc::Document;
use crate::history::HistoryState;
use crate::view::{Selection, Viewport};

/// Immutable editor snapshot: document, view state, and undo history.
///
/// Commands take `&EditorState` and return a new one. Cloning is cheap
/// because every collection inside is persistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorState {
    pub doc: Document,
    pub viewport: Viewport,
    pub selection: Selection,
    #[serde(default)]
    pub history: HistoryState,
}

impl EditorState {
    /// Fresh state around an existing document.
    #[must_use]
    pub fn new(doc: Document) -> Self {
        Self { doc, viewport: Viewport::default(), selection: Selection::default(), history: HistoryState::default() }
    }

    /// Empty untitled board.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Document::new("untitled", "Untitled trip"))
    }

    /// Same document, viewport and selection with a different history.
    #[must_use]
    pub fn with_history(&self, history: HistoryState) -> Self {
        Self { history, ..self.clone() }
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::empty()
    }
}
