//! Viewport and selection: per-session view state carried in the editor snapshot.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::doc::{BlockId, ConnectorId, Vec2};

/// World-space center point and zoom factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: Vec2,
    /// Scale factor, strictly positive (1.0 = no zoom).
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { center: Vec2::default(), zoom: 1.0 }
    }
}

impl Viewport {
    #[must_use]
    pub fn patched(&self, patch: &ViewportPatch) -> Self {
        Self { center: patch.center.unwrap_or(self.center), zoom: patch.zoom.unwrap_or(self.zoom) }
    }
}

/// Sparse viewport update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewportPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
}

impl From<Viewport> for ViewportPatch {
    fn from(viewport: Viewport) -> Self {
        Self { center: Some(viewport.center), zoom: Some(viewport.zoom) }
    }
}

/// Selected blocks and connectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub block_ids: BTreeSet<BlockId>,
    pub connector_ids: BTreeSet<ConnectorId>,
}

impl Selection {
    /// Selection of the given blocks and no connectors.
    pub fn blocks<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<BlockId>,
    {
        Self { block_ids: ids.into_iter().map(Into::into).collect(), connector_ids: BTreeSet::new() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.block_ids.is_empty() && self.connector_ids.is_empty()
    }
}
