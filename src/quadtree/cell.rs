use crate::{Point, Rectangle};
use arrayvec::ArrayVec;
use tracing::{debug, trace, warn};

type Children<const D: usize, const CAP: usize> = Option<Box<[Option<Cell<D, CAP>>]>>;

/// One node of the tree.
///
/// Stores up to `CAP` point indices itself. Once full, further points are routed to one of `2^D`
/// children, which are created the first time a point lands in their quadrant.
/// Indices refer to a point buffer owned by the caller; the cell never stores coordinates.
#[derive(Debug, Clone)]
pub struct Cell<const D: usize, const CAP: usize = 4> {
    bounds: Rectangle<D>,
    depth: u32,

    // slots are allocated on the first subdivision, one per quadrant code
    children: Children<D, CAP>,

    items: ArrayVec<usize, CAP>,
    // only ever filled at max depth, or if a child's box rounds away from a point
    overflow: Vec<usize>,
}

impl<const D: usize, const CAP: usize> Cell<D, CAP> {
    pub fn new(bounds: Rectangle<D>) -> Self {
        assert!(D >= 1, "a cell needs at least one axis");
        assert!(D < 32, "quadrant codes are limited to 31 dimensions");
        Self::with_depth(bounds, 0)
    }

    /// Cell bounded by a square (cube, ...) box.
    pub fn with_center(center: Point<D>, half_width: f64) -> Self {
        Self::new(Rectangle::new(center, half_width))
    }

    fn with_depth(bounds: Rectangle<D>, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            children: None,
            items: ArrayVec::new(),
            overflow: Vec::new(),
        }
    }

    pub fn center(&self) -> Point<D> {
        self.bounds.center()
    }

    pub fn half_width(&self, axis: usize) -> f64 {
        self.bounds.half_width(axis)
    }

    pub fn bounding_box(&self) -> &Rectangle<D> {
        &self.bounds
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// A cell stays a leaf until its local buffer overflows.
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Indices stored directly in this cell, not in its children.
    pub fn local_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.items.iter().chain(self.overflow.iter()).copied()
    }

    pub fn child(&self, quadrant: u32) -> Option<&Self> {
        self.children
            .as_ref()
            .and_then(|c| c.get(quadrant as usize))
            .and_then(Option::as_ref)
    }

    /// The children that exist, with their quadrant codes.
    pub fn children(&self) -> impl Iterator<Item = (u32, &Self)> + '_ {
        self.children
            .iter()
            .flat_map(|c| c.iter().enumerate())
            .filter_map(|(k, c)| c.as_ref().map(|c| (k as u32, c)))
    }

    /// Number of indices stored in this subtree.
    pub fn len(&self) -> usize {
        self.items.len()
            + self.overflow.len()
            + self.children().map(|(_, c)| c.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of cells in this subtree, self included.
    pub fn cell_count(&self) -> usize {
        1 + self
            .children()
            .map(|(_, c)| c.cell_count())
            .sum::<usize>()
    }

    /// Number of levels in this subtree. A lone leaf has height 1.
    pub fn height(&self) -> u32 {
        1 + self
            .children()
            .map(|(_, c)| c.height())
            .max()
            .unwrap_or(0)
    }

    /// Insert the point `p`, known to the caller by `index`.
    ///
    /// Returns the index back if `p` is outside of this cell's bounding box.
    /// Cells at `max_depth` do not subdivide; they keep every further index locally.
    pub fn insert(&mut self, index: usize, p: &Point<D>, max_depth: u32) -> Result<(), usize> {
        if !self.bounds.contains(p) {
            return Err(index);
        }

        if self.items.try_push(index).is_ok() {
            return Ok(());
        }

        if self.depth >= max_depth {
            if self.overflow.is_empty() {
                warn!(
                    depth = self.depth,
                    index, "cell at max depth is full, spilling into its overflow bucket"
                );
            }
            self.overflow.push(index);
            return Ok(());
        }

        let k = self.bounds.center().quadrant(p);
        let bounds = self.bounds;
        let depth = self.depth + 1;

        let children = self
            .children
            .get_or_insert_with(|| (0..1usize << D).map(|_| None).collect());
        let child = children[k as usize].get_or_insert_with(|| {
            trace!(depth, quadrant = k, "creating child cell");
            Self::with_depth(bounds.child(k), depth)
        });

        match child.insert(index, p, max_depth) {
            Ok(()) => Ok(()),
            Err(index) => {
                debug!(
                    index,
                    depth = self.depth,
                    "point fell between child boxes, keeping it locally"
                );
                self.overflow.push(index);
                Ok(())
            }
        }
    }

    /// Push the index of every point of this subtree contained in `query` to `out`.
    ///
    /// `points` must be the buffer the indices were inserted from.
    pub fn range_search(&self, points: &[Point<D>], query: &Rectangle<D>, out: &mut Vec<usize>) {
        let window = self.bounds.intersection(query);
        if window.is_empty() {
            return;
        }
        self.search(points, query, &window, out);
    }

    /// `window` is `query` narrowed down to the boxes visited so far; it only drives pruning.
    /// Points are tested against `query` itself so rounding in the narrowed boxes can not drop
    /// points on the query's boundary.
    fn search(
        &self,
        points: &[Point<D>],
        query: &Rectangle<D>,
        window: &Rectangle<D>,
        out: &mut Vec<usize>,
    ) {
        for (_, child) in self.children() {
            let narrowed = child.bounds.intersection(window);
            if !narrowed.is_empty() {
                child.search(points, query, &narrowed, out);
            }
        }

        for i in self.local_indices() {
            if query.contains(&points[i]) {
                out.push(i);
            }
        }
    }

    /// Index of a stored point with exactly the coordinates of `p`, if any.
    pub fn find(&self, points: &[Point<D>], p: &Point<D>) -> Option<usize> {
        if !self.bounds.contains(p) {
            return None;
        }

        if let Some(i) = self.local_indices().find(|i| points[*i] == *p) {
            return Some(i);
        }

        let k = self.bounds.center().quadrant(p);
        self.child(k).and_then(|c| c.find(points, p))
    }
}
