mod cell;

pub use cell::Cell;

use crate::{Config, Error, Point, Rectangle, Result};
use rayon::prelude::*;
use tracing::debug;

/// Static 2^D-tree over a borrowed point buffer.
///
/// Built once from a bounding box and a slice of points; afterwards it only answers queries.
/// Results are indices into the borrowed slice, in no particular order.
#[derive(Debug, Clone)]
pub struct QuadTree<'a, const D: usize, const CAP: usize = 4> {
    root: Cell<D, CAP>,
    num_points: usize,
    points: &'a [Point<D>],
    // indices outside of the bounding box, never stored in any cell
    rejected: Vec<usize>,
    config: Config,
}

impl<'a, const D: usize, const CAP: usize> QuadTree<'a, D, CAP> {
    /// Index every point of `points` that lies inside `bounds`.
    ///
    /// Points outside of `bounds` are skipped without an error. They are still counted by
    /// [`point_count`](Self::point_count) and listed by [`rejected`](Self::rejected), but no query
    /// will ever return them.
    pub fn build(bounds: Rectangle<D>, points: &'a [Point<D>]) -> Self {
        Self::with_config(bounds, points, Config::default())
    }

    pub fn with_config(bounds: Rectangle<D>, points: &'a [Point<D>], config: Config) -> Self {
        let mut root = Cell::new(bounds);
        let mut rejected = Vec::new();

        for (index, p) in points.iter().enumerate() {
            if let Err(index) = root.insert(index, p, config.max_depth) {
                debug!(index, "point is outside of the bounding box, skipping");
                rejected.push(index);
            }
        }

        let tree = Self {
            root,
            num_points: points.len(),
            points,
            rejected,
            config,
        };
        debug!(
            points = tree.num_points,
            rejected = tree.rejected.len(),
            cells = tree.cell_count(),
            height = tree.height(),
            "built quadtree"
        );
        tree
    }

    /// Build with a bounding box fitted around `points`, so no point is rejected.
    pub fn build_fitted(points: &'a [Point<D>]) -> Self {
        // an empty buffer gets an empty box, there is nothing to index anyway
        let bounds = Rectangle::enclosing(points.iter()).unwrap_or_default();
        Self::build(bounds, points)
    }

    /// Length of the point buffer the tree was built from, including rejected points.
    pub fn point_count(&self) -> usize {
        self.num_points
    }

    /// Number of points a query can return.
    pub fn indexed_count(&self) -> usize {
        self.num_points - self.rejected.len()
    }

    /// Indices of the points that were outside of the bounding box, in ascending order.
    pub fn rejected(&self) -> &[usize] {
        &self.rejected
    }

    pub fn point_at(&self, index: usize) -> Result<&'a Point<D>> {
        self.points.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.points.len(),
        })
    }

    pub fn points(&self) -> &'a [Point<D>] {
        self.points
    }

    pub fn bounding_box(&self) -> &Rectangle<D> {
        self.root.bounding_box()
    }

    pub fn root(&self) -> &Cell<D, CAP> {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cell_count(&self) -> usize {
        self.root.cell_count()
    }

    pub fn height(&self) -> u32 {
        self.root.height()
    }

    /// Indices of all points contained in `query`.
    pub fn range_search(&self, query: &Rectangle<D>) -> Vec<usize> {
        let mut out = Vec::new();
        self.range_search_into(query, &mut out);
        out
    }

    /// Like [`range_search`](Self::range_search) but appends to `out`, so a buffer can be reused
    /// between queries.
    pub fn range_search_into(&self, query: &Rectangle<D>, out: &mut Vec<usize>) {
        self.root.range_search(self.points, query, out);
    }

    pub fn range_search_points(&self, query: &Rectangle<D>) -> Vec<(usize, &'a Point<D>)> {
        let points = self.points;
        self.range_search(query)
            .into_iter()
            .map(|i| (i, &points[i]))
            .collect()
    }

    /// Answer every query of `queries` in parallel. `result[i]` belongs to `queries[i]`.
    pub fn par_range_search(&self, queries: &[Rectangle<D>]) -> Vec<Vec<usize>> {
        queries.par_iter().map(|q| self.range_search(q)).collect()
    }

    /// Index of an indexed point with exactly the coordinates of `p`.
    pub fn find(&self, p: &Point<D>) -> Option<usize> {
        self.root.find(self.points, p)
    }

    pub fn contains_point(&self, p: &Point<D>) -> bool {
        self.find(p).is_some()
    }
}
