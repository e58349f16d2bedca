//! Transient drag offset layered over committed block positions.

#[cfg(test)]
#[path = "preview_test.rs"]
mod preview_test;

use std::collections::BTreeSet;

use crate::geom::{Point, Rect};

/// An in-flight drag. Never touches the document.
#[derive(Debug, Clone, PartialEq)]
pub struct DragPreview {
    ids: BTreeSet<String>,
    offset: Point,
}

impl DragPreview {
    #[must_use]
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { ids: ids.into_iter().map(Into::into).collect(), offset: Point::default() }
    }

    #[must_use]
    pub fn ids(&self) -> &BTreeSet<String> {
        &self.ids
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Cumulative offset from the drag start.
    #[must_use]
    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Replace the offset, returning the previous one.
    pub fn set_offset(&mut self, offset: Point) -> Point {
        std::mem::replace(&mut self.offset, offset)
    }

    /// `bounds` shifted if `id` is being dragged.
    #[must_use]
    pub fn apply(&self, id: &str, bounds: Rect) -> Rect {
        if self.contains(id) { bounds.translate(self.offset.x, self.offset.y) } else { bounds }
    }
}
