//! Broad-phase spatial index for hit-testing and dirty-region culling.
//!
//! The plane is split into square cells. Every id is registered in each cell
//! its bounds overlap, so a query returns *candidates*: ids sharing a cell with
//! the query. Callers confirm with an exact geometric test. The index never
//! produces false negatives for bounds it was given.
//!
//! Bounds spanning more than [`MAX_CELLS_PER_ENTRY`] cells are kept in a side
//! list that every query scans, so one huge block cannot stall an insert.
//! Bounds with a NaN or infinite edge are not indexed at all.

#[cfg(test)]
#[path = "spatial_test.rs"]
mod spatial_test;

use std::collections::{BTreeSet, HashMap};

use crate::consts::{GRID_CELL_SIZE, MAX_CELLS_PER_ENTRY};
use crate::geom::{Point, Rect};

type CellKey = (i64, i64);

/// Broad-phase lookup of ids by location.
pub trait SpatialIndex {
    /// Register `id` with `bounds`, replacing any previous registration.
    fn insert(&mut self, id: &str, bounds: Rect);

    /// Forget `id`. Unknown ids are ignored.
    fn remove(&mut self, id: &str);

    fn update(&mut self, id: &str, bounds: Rect) {
        self.remove(id);
        self.insert(id, bounds);
    }

    /// Ids registered in the cell containing `p`, sorted.
    fn query_point(&self, p: Point) -> Vec<String>;

    /// Ids registered in any cell `rect` overlaps, sorted and de-duplicated.
    fn query_rect(&self, rect: &Rect) -> Vec<String>;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Uniform grid of square cells.
#[derive(Debug, Clone)]
pub struct GridIndex {
    cell_size: f64,
    cells: HashMap<CellKey, BTreeSet<String>>,
    objects: HashMap<String, Vec<CellKey>>,
    oversized: HashMap<String, Rect>,
}

impl Default for GridIndex {
    fn default() -> Self {
        Self::new(GRID_CELL_SIZE)
    }
}

impl GridIndex {
    /// Grid with the given cell edge length. Non-positive or non-finite sizes
    /// fall back to the default.
    #[must_use]
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 { cell_size } else { GRID_CELL_SIZE };
        Self { cell_size, cells: HashMap::new(), objects: HashMap::new(), oversized: HashMap::new() }
    }

    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_coord(&self, v: f64) -> i64 {
        (v / self.cell_size).floor() as i64
    }

    fn cell_of(&self, p: Point) -> CellKey {
        (self.cell_coord(p.x), self.cell_coord(p.y))
    }

    /// Ids kept in the side list because their bounds cover too many cells.
    #[must_use]
    pub fn oversized_count(&self) -> usize {
        self.oversized.len()
    }

    /// Corner cells of `rect`, edges included.
    fn cell_range(&self, rect: &Rect) -> (CellKey, CellKey) {
        (self.cell_of(Point::new(rect.x, rect.y)), self.cell_of(Point::new(rect.right(), rect.bottom())))
    }

    /// Number of cells `rect` overlaps, saturating.
    fn cell_span(&self, rect: &Rect) -> u64 {
        let ((min_x, min_y), (max_x, max_y)) = self.cell_range(rect);
        let columns = max_x.abs_diff(min_x).saturating_add(1);
        let rows = max_y.abs_diff(min_y).saturating_add(1);
        columns.saturating_mul(rows)
    }

    /// Inclusive range of cells `rect` overlaps, edges included.
    fn cells_for(&self, rect: &Rect) -> impl Iterator<Item = CellKey> + use<> {
        let ((min_x, min_y), (max_x, max_y)) = self.cell_range(rect);
        (min_x..=max_x).flat_map(move |cx| (min_y..=max_y).map(move |cy| (cx, cy)))
    }
}

impl SpatialIndex for GridIndex {
    fn insert(&mut self, id: &str, bounds: Rect) {
        self.remove(id);
        if !bounds.is_finite() {
            tracing::warn!(id, "bounds are not finite, left out of the spatial index");
            return;
        }
        if self.cell_span(&bounds) > MAX_CELLS_PER_ENTRY {
            self.oversized.insert(id.to_owned(), bounds);
            return;
        }
        let keys: Vec<CellKey> = self.cells_for(&bounds).collect();
        for key in &keys {
            self.cells.entry(*key).or_default().insert(id.to_owned());
        }
        self.objects.insert(id.to_owned(), keys);
    }

    fn remove(&mut self, id: &str) {
        self.oversized.remove(id);
        let Some(keys) = self.objects.remove(id) else {
            return;
        };
        for key in keys {
            if let Some(bucket) = self.cells.get_mut(&key) {
                bucket.remove(id);
                if bucket.is_empty() {
                    self.cells.remove(&key);
                }
            }
        }
    }

    fn query_point(&self, p: Point) -> Vec<String> {
        let mut found: BTreeSet<String> = self.cells.get(&self.cell_of(p)).cloned().unwrap_or_default();
        found.extend(self.oversized.iter().filter(|(_, b)| b.contains_point(p)).map(|(id, _)| id.clone()));
        found.into_iter().collect()
    }

    fn query_rect(&self, rect: &Rect) -> Vec<String> {
        let ((min_x, min_y), (max_x, max_y)) = self.cell_range(rect);
        let span = self.cell_span(rect);

        let mut found: BTreeSet<String> =
            self.oversized.iter().filter(|(_, b)| b.intersects(rect)).map(|(id, _)| id.clone()).collect();
        // Wide queries walk the occupied cells instead of the covered range.
        if usize::try_from(span).map_or(true, |span| span > self.cells.len()) {
            for ((cx, cy), bucket) in &self.cells {
                if (min_x..=max_x).contains(cx) && (min_y..=max_y).contains(cy) {
                    found.extend(bucket.iter().cloned());
                }
            }
        } else {
            for key in self.cells_for(rect) {
                if let Some(bucket) = self.cells.get(&key) {
                    found.extend(bucket.iter().cloned());
                }
            }
        }
        found.into_iter().collect()
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.objects.clear();
        self.oversized.clear();
    }

    fn len(&self) -> usize {
        self.objects.len() + self.oversized.len()
    }
}
