//! Uniform-grid spatial hash.
//!
//! Points are bucketed by the cell `(floor(x / cell), floor(y / cell))`.
//! Circle queries visit every cell overlapping the circle's bounding box and
//! return every key found there. That is a deliberate over-approximation:
//! callers must re-check the exact distance against live positions.
//!
//! There is no removal or update. The engine clears and re-inserts all live
//! entities whenever it needs fresh answers, so stale entries cannot exist.

use std::collections::{BTreeSet, HashMap};

use glam::Vec2;

/// Integer grid coordinate of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    /// Column index
    pub x: i32,
    /// Row index
    pub y: i32,
}

/// Uniform-grid bucket index keyed by an ordered identifier.
///
/// # Note on `HashMap` Usage
///
/// Buckets live in a `HashMap`, whose iteration order is unspecified. Query
/// results are collected into a `BTreeSet`, so the returned ids are sorted
/// and independent of both insertion order and bucket order.
///
/// # Example
///
/// ```
/// use emberfall_grid::SpatialHash;
/// use glam::Vec2;
///
/// let mut hash = SpatialHash::new(32.0);
/// hash.insert(7_u32, Vec2::new(40.0, 40.0));
/// hash.insert(3_u32, Vec2::new(45.0, 41.0));
///
/// assert_eq!(hash.query_circle(Vec2::new(42.0, 40.0), 10.0), vec![3, 7]);
///
/// hash.clear();
/// assert!(hash.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct SpatialHash<K> {
    cell_size: f32,
    buckets: HashMap<CellKey, Vec<(K, Vec2)>>,
    len: usize,
}

impl<K: Copy + Ord> SpatialHash<K> {
    /// Creates an empty hash with the given cell size.
    ///
    /// `cell_size` must be positive and finite.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        debug_assert!(cell_size > 0.0 && cell_size.is_finite());
        Self {
            cell_size,
            buckets: HashMap::new(),
            len: 0,
        }
    }

    /// Returns the cell size this hash was built with.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Discards every entry. Bucket allocations are kept for reuse.
    pub fn clear(&mut self) {
        for bucket in self.buckets.values_mut() {
            bucket.clear();
        }
        self.len = 0;
    }

    /// Places one point in the bucket covering `pos`.
    ///
    /// Inserting the same key twice stores it twice; queries de-duplicate.
    pub fn insert(&mut self, key: K, pos: Vec2) {
        let cell = self.cell_of(pos);
        self.buckets.entry(cell).or_default().push((key, pos));
        self.len += 1;
    }

    /// Returns the de-duplicated, sorted keys stored in every cell that
    /// overlaps the square bounding box of the circle.
    #[must_use]
    pub fn query_circle(&self, center: Vec2, radius: f32) -> Vec<K> {
        let reach = Vec2::splat(radius.max(0.0));
        let min = self.cell_of(center - reach);
        let max = self.cell_of(center + reach);

        let mut seen = BTreeSet::new();
        for cx in min.x..=max.x {
            for cy in min.y..=max.y {
                if let Some(bucket) = self.buckets.get(&CellKey { x: cx, y: cy }) {
                    seen.extend(bucket.iter().map(|(key, _)| *key));
                }
            }
        }
        seen.into_iter().collect()
    }

    /// Returns the bucket coordinate covering `pos`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_of(&self, pos: Vec2) -> CellKey {
        CellKey {
            x: (pos.x / self.cell_size).floor() as i32,
            y: (pos.y / self.cell_size).floor() as i32,
        }
    }

    /// Returns the number of stored points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing has been inserted since the last clear.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}
