//! # Emberfall Grid
//!
//! Spatial substrate for the Emberfall arena simulation.
//!
//! The arena is a flat square world. Two primitives cover everything the
//! engine needs spatially:
//!
//! - **[`SpatialHash`]**: a uniform-grid bucket index over point entities,
//!   rebuilt from scratch every tick and queried with circles
//! - **[`Square`]**: an axis-aligned square area (hazards, ring cells)
//!
//! ## Quick Start
//!
//! ```
//! use emberfall_grid::{SpatialHash, Square};
//! use glam::Vec2;
//!
//! let mut hash = SpatialHash::new(32.0);
//! hash.insert(1_u32, Vec2::new(10.0, 10.0));
//! hash.insert(2_u32, Vec2::new(200.0, 200.0));
//!
//! // Candidates only: callers re-check the exact distance.
//! let near = hash.query_circle(Vec2::new(12.0, 12.0), 8.0);
//! assert_eq!(near, vec![1]);
//!
//! let fire = Square::new(Vec2::new(50.0, 50.0), 20.0);
//! assert!(fire.contains(Vec2::new(60.0, 40.0)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod grid;

pub use grid::{CellKey, SpatialHash};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned square area, described by its center and side length.
///
/// Containment is inclusive on every edge: a point exactly `size / 2` away
/// from the center along an axis is inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Square {
    /// Center of the square
    pub center: Vec2,
    /// Side length
    pub size: f32,
}

impl Square {
    /// Create a square from its center and side length.
    #[must_use]
    pub const fn new(center: Vec2, size: f32) -> Self {
        Self { center, size }
    }

    /// Half the side length.
    #[must_use]
    pub fn half(&self) -> f32 {
        self.size / 2.0
    }

    /// Check if a point is inside the square (edges included).
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        self.contains_with_margin(point, 0.0)
    }

    /// Check if a point is inside the square grown by `margin` on every side.
    #[must_use]
    pub fn contains_with_margin(&self, point: Vec2, margin: f32) -> bool {
        let half = self.half() + margin;
        (point.x - self.center.x).abs() <= half && (point.y - self.center.y).abs() <= half
    }

    /// Minimum corner.
    #[must_use]
    pub fn min(&self) -> Vec2 {
        self.center - Vec2::splat(self.half())
    }

    /// Maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.center + Vec2::splat(self.half())
    }
}
