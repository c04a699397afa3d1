//! Region quadtree over a borrowed, static set of D-dimensional points.
//!
//! A [`QuadTree`](quadtree::QuadTree) generalizes to a 2^D-tree: every cell has up to `2^D` lazily
//! created children, one per orthant. It answers axis-aligned range queries by pruning cells whose
//! bounding box does not intersect the query.
//!
//! # Contracts:
//! - Rectangles are open on their lower boundary and closed on their upper boundary, see
//!   [`Rectangle::contains`].
//! - Points outside the tree's bounding box are silently left out of the index. They still count
//!   towards [`QuadTree::point_count`](quadtree::QuadTree::point_count).
//! - The point buffer is borrowed, never copied; the tree cannot outlive it.
//!
pub mod config;
pub mod error;
pub mod quadtree;
pub mod rectangle;

pub use config::Config;
pub use error::{Error, Result};
pub use quadtree::{Cell, QuadTree};
pub use rectangle::{child_offset_sign, Rectangle};

use std::ops::{Add, AddAssign, Deref, DerefMut};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<const D: usize>(pub [f64; D]);

impl<const D: usize> Default for Point<D> {
    fn default() -> Self {
        Self::origin()
    }
}

impl<const D: usize> AddAssign for Point<D> {
    fn add_assign(&mut self, p: Self) {
        for (a, b) in self.0.iter_mut().zip(p.0.iter()) {
            *a += b;
        }
    }
}

impl<const D: usize> Deref for Point<D> {
    type Target = [f64; D];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const D: usize> DerefMut for Point<D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<const D: usize> Add for Point<D> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl<const D: usize> From<[f64; D]> for Point<D> {
    fn from(coords: [f64; D]) -> Self {
        Self(coords)
    }
}

impl<const D: usize> Point<D> {
    pub fn new(coords: [f64; D]) -> Self {
        Self(coords)
    }

    pub fn origin() -> Self {
        Self([0.0; D])
    }

    pub fn coords(&self) -> &[f64; D] {
        &self.0
    }

    /// Bounds checked read of a single axis.
    pub fn get(&self, axis: usize) -> Result<f64> {
        self.0
            .get(axis)
            .copied()
            .ok_or(Error::AxisOutOfRange { axis, dim: D })
    }

    /// Bounds checked write of a single axis.
    pub fn set(&mut self, axis: usize, value: f64) -> Result<()> {
        let slot = self
            .0
            .get_mut(axis)
            .ok_or(Error::AxisOutOfRange { axis, dim: D })?;
        *slot = value;
        Ok(())
    }

    /// Classify `p` relative to `self`.
    /// Bit `i` of the result is set iff `p[i] <= self[i]`, so ties go to the lower side.
    pub fn quadrant(&self, p: &Self) -> u32 {
        debug_assert!(D < 32, "quadrant codes are limited to 31 dimensions");
        self.0
            .iter()
            .zip(p.0.iter())
            .enumerate()
            .fold(0, |quad, (i, (c, x))| {
                if x <= c {
                    quad | (1u32 << i)
                } else {
                    quad
                }
            })
    }
}
