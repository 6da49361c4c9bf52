use bevy::math::{DVec2, IVec2};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::operations::cross;

/// A segment on the integer lattice. Direction matters for crossover pairing
/// (`first` in one sector matches `first` in the other), not for equality of
/// the geometry it describes; see [`IntLineSegment2::canonical`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntLineSegment2 {
    pub first: IVec2,
    pub second: IVec2,
}

impl IntLineSegment2 {
    pub const fn new(first: IVec2, second: IVec2) -> Self {
        Self { first, second }
    }

    pub fn from_coords(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self::new(IVec2::new(x1, y1), IVec2::new(x2, y2))
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.second, self.first)
    }

    /// Same segment with endpoints in lexicographic order.
    pub fn canonical(&self) -> Self {
        if point_key(self.first) <= point_key(self.second) {
            *self
        } else {
            self.reversed()
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.first == self.second
    }

    pub fn length(&self) -> f64 {
        (self.second - self.first).as_dvec2().length()
    }

    pub fn midpoint(&self) -> DVec2 {
        (self.first.as_dvec2() + self.second.as_dvec2()) * 0.5
    }

    fn sort_key(&self) -> (i32, i32, i32, i32) {
        (self.first.x, self.first.y, self.second.x, self.second.y)
    }
}

impl PartialOrd for IntLineSegment2 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IntLineSegment2 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

#[inline]
pub(crate) fn point_key(p: IVec2) -> (i32, i32) {
    (p.x, p.y)
}

/// A simple polygon on the integer lattice.
///
/// The contour is implicitly closed; a trailing copy of the first point is
/// tolerated on input and stripped by [`Polygon2::new`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polygon2 {
    pub points: Vec<IVec2>,
}

impl Polygon2 {
    pub fn new(mut points: Vec<IVec2>) -> Self {
        points.dedup();
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Self { points }
    }

    /// Axis-aligned rectangle, counterclockwise.
    pub fn rectangle(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(vec![
            IVec2::new(x, y),
            IVec2::new(x + width, y),
            IVec2::new(x + width, y + height),
            IVec2::new(x, y + height),
        ])
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Twice the signed area; positive for counterclockwise contours.
    pub fn signed_area_doubled(&self) -> i64 {
        let n = self.points.len();
        (0..n)
            .map(|i| cross(self.points[i], self.points[(i + 1) % n]))
            .sum()
    }

    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3 || self.signed_area_doubled() == 0
    }

    pub fn is_counterclockwise(&self) -> bool {
        self.signed_area_doubled() > 0
    }

    /// Copy with the requested orientation.
    pub fn oriented(&self, counterclockwise: bool) -> Polygon2 {
        let mut result = self.clone();
        if result.is_counterclockwise() != counterclockwise {
            result.points.reverse();
        }
        result
    }

    /// Contour edges including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (IVec2, IVec2)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Even-odd ray test. Points exactly on the boundary may land either way;
    /// use [`Polygon2::is_on_boundary`] first when that matters.
    pub fn contains_strict(&self, p: DVec2) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            let a = a.as_dvec2();
            let b = b.as_dvec2();
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    pub fn is_on_boundary(&self, p: DVec2) -> bool {
        self.edges()
            .any(|(a, b)| super::operations::is_point_on_segment(p, a.as_dvec2(), b.as_dvec2()))
    }

    pub(crate) fn to_clipper_coords(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.x as f64, p.y as f64)).collect()
    }

    pub(crate) fn from_clipper_coords(coords: Vec<(f64, f64)>) -> Self {
        Self::new(
            coords
                .into_iter()
                .map(|(x, y)| IVec2::new(x.round() as i32, y.round() as i32))
                .collect(),
        )
    }

    fn sort_key(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.points.iter().map(|p| point_key(*p))
    }
}

impl PartialOrd for Polygon2 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Polygon2 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(other.sort_key())
    }
}
