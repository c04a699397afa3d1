use crate::{Error, Point, Result};
use std::ops::BitAnd;

/// Direction in which the child in `quadrant` is offset from its parent's center along `axis`.
/// A set bit means the child covers the lower half of that axis.
#[inline]
pub fn child_offset_sign(quadrant: u32, axis: usize) -> f64 {
    if quadrant & (1u32 << axis) != 0 {
        -1.0
    } else {
        1.0
    }
}

/// Axis aligned box stored as a center and per-axis half-widths.
///
/// Half-widths are never negative. A box with a zero half-width on any axis is empty: it has no
/// volume and contains no point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle<const D: usize> {
    center: Point<D>,
    half_widths: [f64; D],
}

impl<const D: usize> Default for Rectangle<D> {
    fn default() -> Self {
        Self {
            center: Point::origin(),
            half_widths: [0.0; D],
        }
    }
}

impl<const D: usize> Rectangle<D> {
    /// Box with the same half-width on every axis.
    pub fn new(center: Point<D>, half_width: f64) -> Self {
        Self::with_half_widths(center, [half_width; D])
    }

    pub fn with_half_widths(center: Point<D>, half_widths: [f64; D]) -> Self {
        debug_assert!(
            half_widths.iter().all(|l| *l >= 0.0),
            "negative half-width: {:?}",
            half_widths
        );
        Self {
            center,
            half_widths,
        }
    }

    /// Box spanning `(lower, upper]` on every axis. Inverted axes collapse to an empty box.
    pub fn from_bounds(lower: Point<D>, upper: Point<D>) -> Self {
        let mut center = Point::<D>::origin();
        let mut half_widths = [0.0; D];
        for i in 0..D {
            center[i] = (lower[i] + upper[i]) / 2.0;
            half_widths[i] = ((upper[i] - lower[i]) / 2.0).max(0.0);
        }
        Self {
            center,
            half_widths,
        }
    }

    /// A non-empty box containing every point of `points`, or `None` if there are no points.
    ///
    /// The lower boundary is open, so the box is pushed slightly below the smallest coordinate
    /// on each axis.
    pub fn enclosing<'a, It>(points: It) -> Option<Self>
    where
        It: IntoIterator<Item = &'a Point<D>>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut min = *first;
        let mut max = *first;
        for p in points {
            for i in 0..D {
                if p[i] < min[i] {
                    min[i] = p[i];
                }
                if p[i] > max[i] {
                    max[i] = p[i];
                }
            }
        }

        let mut center = Point::<D>::origin();
        let mut half_widths = [0.0; D];
        for i in 0..D {
            let (c, l) = fit_axis(min[i], max[i]);
            center[i] = c;
            half_widths[i] = l;
        }
        Some(Self {
            center,
            half_widths,
        })
    }

    pub fn center(&self) -> Point<D> {
        self.center
    }

    /// Half-width along `axis`. Panics if `axis >= D`.
    pub fn half_width(&self, axis: usize) -> f64 {
        self.half_widths[axis]
    }

    pub fn half_width_checked(&self, axis: usize) -> Result<f64> {
        self.half_widths
            .get(axis)
            .copied()
            .ok_or(Error::AxisOutOfRange { axis, dim: D })
    }

    pub fn half_widths(&self) -> &[f64; D] {
        &self.half_widths
    }

    /// The excluded lower corner.
    pub fn lower(&self) -> Point<D> {
        let mut p = self.center;
        for (x, l) in p.iter_mut().zip(self.half_widths.iter()) {
            *x -= l;
        }
        p
    }

    /// The included upper corner.
    pub fn upper(&self) -> Point<D> {
        let mut p = self.center;
        for (x, l) in p.iter_mut().zip(self.half_widths.iter()) {
            *x += l;
        }
        p
    }

    /// True iff any half-width is exactly zero.
    pub fn is_empty(&self) -> bool {
        self.half_widths.iter().any(|l| *l == 0.0)
    }

    /// `center - L < p <= center + L` on every axis.
    ///
    /// Two boxes tiling space share their boundary, and a point lying on it belongs to exactly
    /// one of them.
    #[inline]
    pub fn contains(&self, p: &Point<D>) -> bool {
        self.center
            .iter()
            .zip(self.half_widths.iter())
            .zip(p.iter())
            .all(|((c, l), x)| *x <= c + l && *x > c - l)
    }

    /// Overlap of two boxes. Disjoint or edge-touching boxes produce an empty box.
    pub fn intersection(&self, other: &Self) -> Self {
        let mut center = Point::<D>::origin();
        let mut half_widths = [0.0; D];
        for i in 0..D {
            let low = (self.center[i] - self.half_widths[i])
                .max(other.center[i] - other.half_widths[i]);
            let high = (self.center[i] + self.half_widths[i])
                .min(other.center[i] + other.half_widths[i]);

            center[i] = (low + high) / 2.0;
            half_widths[i] = ((high - low) / 2.0).max(0.0);
        }
        Self {
            center,
            half_widths,
        }
    }

    pub fn intersects(&self, other: &Self) -> bool {
        !self.intersection(other).is_empty()
    }

    /// Bounding box of the child in `quadrant` (see [`Point::quadrant`]): half as wide on every
    /// axis, its center moved half of the child's extent towards the quadrant.
    pub fn child(&self, quadrant: u32) -> Self {
        let mut center = self.center;
        let mut half_widths = self.half_widths;
        for i in 0..D {
            half_widths[i] /= 2.0;
            center[i] += child_offset_sign(quadrant, i) * half_widths[i];
        }
        Self {
            center,
            half_widths,
        }
    }
}

impl<const D: usize> BitAnd for Rectangle<D> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersection(&rhs)
    }
}

impl<'a, const D: usize> BitAnd<&'a Rectangle<D>> for &'a Rectangle<D> {
    type Output = Rectangle<D>;

    fn bitand(self, rhs: &'a Rectangle<D>) -> Rectangle<D> {
        self.intersection(rhs)
    }
}

/// Center and half-width of an axis covering `(lo, hi]` with `lo < min` and `max <= hi`.
fn fit_axis(min: f64, max: f64) -> (f64, f64) {
    let mut pad = (max - min).abs().max(min.abs()).max(max.abs()).max(1.0) * 1e-9;
    for _ in 0..64 {
        let lo = min - pad;
        let hi = max + pad;
        let c = (lo + hi) / 2.0;
        let l = (hi - lo) / 2.0;
        if c - l < min && max <= c + l {
            return (c, l);
        }
        pad *= 2.0;
    }
    // only reachable with non-finite coordinates
    ((min + max) / 2.0, ((max - min) / 2.0).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p2(x: f64, y: f64) -> Point<2> {
        Point::new([x, y])
    }

    #[test]
    fn default_is_empty() {
        let r = Rectangle::<2>::default();
        assert!(r.is_empty());
        assert_eq!(r.center(), Point::origin());
    }

    #[test]
    fn empty_if_any_axis_is_degenerate() {
        let r = Rectangle::with_half_widths(p2(0.0, 0.0), [3.0, 0.0]);
        assert!(r.is_empty());
        assert!(!r.contains(&p2(0.0, 0.0)));

        assert!(!Rectangle::new(p2(2.0, 2.0), 4.0).is_empty());
    }

    #[test]
    fn accessors() {
        let q = p2(2.0, 2.0);
        let r = Rectangle::with_half_widths(q, [4.0, 1.5]);
        assert_eq!(r.center(), q);
        assert_eq!(r.half_width(0), 4.0);
        assert_eq!(r.half_width(1), 1.5);
        assert_eq!(
            r.half_width_checked(2),
            Err(Error::AxisOutOfRange { axis: 2, dim: 2 })
        );
        assert_eq!(r.lower(), p2(-2.0, 0.5));
        assert_eq!(r.upper(), p2(6.0, 3.5));
    }

    #[test]
    fn contains_inside_and_outside() {
        let r = Rectangle::new(p2(2.0, 2.0), 4.0);
        assert!(r.contains(&p2(1.0, 4.0)));
        assert!(!r.contains(&p2(10.0, 10.0)));
    }

    #[test]
    fn contains_own_center() {
        let rects = [
            Rectangle::new(p2(2.0, 2.0), 4.0),
            Rectangle::with_half_widths(p2(-7.5, 1e6), [1e-9, 3.0]),
            Rectangle::new(p2(0.0, 0.0), f64::MIN_POSITIVE),
        ];
        for r in rects.iter() {
            assert!(r.contains(&r.center()), "{:?}", r);
        }
    }

    #[test]
    fn lower_boundary_is_open_upper_is_closed() {
        let r = Rectangle::new(p2(5.0, 5.0), 5.0);
        assert!(r.contains(&p2(10.0, 10.0)));
        assert!(!r.contains(&p2(0.0, 0.0)));
        assert!(!r.contains(&p2(0.0, 5.0)));
        assert!(r.contains(&p2(10.0, 0.5)));
    }

    #[test]
    fn shared_edge_belongs_to_exactly_one_box() {
        let left = Rectangle::new(p2(5.0, 5.0), 5.0);
        let right = Rectangle::new(p2(15.0, 5.0), 5.0);
        for y in [0.5, 2.0, 5.0, 10.0].iter() {
            let p = p2(10.0, *y);
            assert!(left.contains(&p));
            assert!(!right.contains(&p));
        }
    }

    #[test]
    fn intersection_of_nested_boxes() {
        let r = Rectangle::new(p2(0.0, 0.0), 10.0);
        let s = Rectangle::new(p2(1.0, 4.0), 1.0);
        let t = r & s;
        assert!(!t.is_empty());
        assert_eq!(t, Rectangle::new(p2(1.0, 4.0), 1.0));
    }

    #[test]
    fn intersection_of_disjoint_boxes_is_empty() {
        let r = Rectangle::new(p2(2.0, 2.0), 4.0);
        let s = Rectangle::new(p2(10.0, 10.0), 1.0);
        let t = &r & &s;
        assert!(t.is_empty());
        assert!(!r.intersects(&s));
    }

    #[test]
    fn intersection_of_edge_touching_boxes_is_empty() {
        let a = Rectangle::new(p2(5.0, 5.0), 5.0);
        let b = Rectangle::new(p2(15.0, 5.0), 5.0);
        assert!((a & b).is_empty());
    }

    #[test]
    fn intersection_of_overlapping_boxes() {
        let r = Rectangle::new(p2(2.0, 2.0), 4.0);
        let s = Rectangle::new(p2(10.0, 10.0), 5.0);
        let expected = Rectangle::new(p2(5.5, 5.5), 0.5);
        assert_eq!(r & s, expected);
        assert_eq!(s & r, expected);
    }

    #[test]
    fn intersection_is_commutative_for_containment() {
        let a = Rectangle::with_half_widths(p2(0.25, -1.0), [3.0, 2.5]);
        let b = Rectangle::with_half_widths(p2(2.0, 0.5), [1.75, 4.0]);
        let ab = a & b;
        let ba = b & a;
        assert_eq!(ab.is_empty(), ba.is_empty());
        for i in -16..16 {
            for j in -16..16 {
                let p = p2(i as f64 * 0.25, j as f64 * 0.25);
                assert_eq!(ab.contains(&p), ba.contains(&p), "{:?}", p);
                assert_eq!(ab.contains(&p), a.contains(&p) && b.contains(&p), "{:?}", p);
            }
        }
    }

    #[test]
    fn intersection_with_self_is_identity() {
        let r = Rectangle::with_half_widths(p2(1.5, -2.0), [0.5, 8.0]);
        assert_eq!(r & r, r);
    }

    #[test]
    fn equality_compares_center_and_half_widths() {
        let r = Rectangle::new(p2(2.0, 2.0), 4.0);
        assert_eq!(r, Rectangle::new(p2(2.0, 2.0), 4.0));
        assert_ne!(r, Rectangle::new(p2(2.0, 2.0), 4.5));
        assert_ne!(r, Rectangle::new(p2(2.0, 2.5), 4.0));
    }

    #[test]
    fn from_bounds_matches_center_form() {
        let r = Rectangle::from_bounds(p2(-2.0, 0.0), p2(6.0, 4.0));
        assert_eq!(r, Rectangle::with_half_widths(p2(2.0, 2.0), [4.0, 2.0]));
        assert!(Rectangle::from_bounds(p2(3.0, 0.0), p2(1.0, 4.0)).is_empty());
    }

    #[test]
    fn offset_sign_follows_quadrant_bits() {
        assert_eq!(child_offset_sign(0b00, 0), 1.0);
        assert_eq!(child_offset_sign(0b00, 1), 1.0);
        assert_eq!(child_offset_sign(0b01, 0), -1.0);
        assert_eq!(child_offset_sign(0b01, 1), 1.0);
        assert_eq!(child_offset_sign(0b10, 1), -1.0);
    }

    #[test]
    fn children_tile_the_parent() {
        let parent = Rectangle::with_half_widths(p2(1.0, -1.0), [4.0, 2.0]);
        let center = parent.center();

        assert_eq!(
            parent.child(0b11),
            Rectangle::with_half_widths(p2(-1.0, -2.0), [2.0, 1.0])
        );
        assert_eq!(
            parent.child(0b00),
            Rectangle::with_half_widths(p2(3.0, 0.0), [2.0, 1.0])
        );

        for i in -20..=20 {
            for j in -10..=10 {
                let p = p2(1.0 + i as f64 * 0.2, -1.0 + j as f64 * 0.2);
                if !parent.contains(&p) {
                    continue;
                }
                let k = center.quadrant(&p);
                assert!(parent.child(k).contains(&p), "{:?} in {}", p, k);
                let owners = (0..4).filter(|q| parent.child(*q).contains(&p)).count();
                assert_eq!(owners, 1, "{:?}", p);
            }
        }
    }

    #[test]
    fn enclosing_contains_every_point() {
        let points = vec![p2(0.0, 0.0), p2(10.0, -3.0), p2(4.0, 7.0), p2(10.0, 7.0)];
        let r = Rectangle::enclosing(points.iter()).unwrap();
        assert!(!r.is_empty());
        for p in points.iter() {
            assert!(r.contains(p), "{:?} not in {:?}", p, r);
        }
    }

    #[test]
    fn enclosing_single_point_is_not_empty() {
        let points = [p2(3.0, 3.0)];
        let r = Rectangle::enclosing(points.iter()).unwrap();
        assert!(!r.is_empty());
        assert!(r.contains(&points[0]));
    }

    #[test]
    fn enclosing_nothing() {
        let points: Vec<Point<2>> = vec![];
        assert!(Rectangle::enclosing(points.iter()).is_none());
    }
}
