use bevy::math::{DVec2, IVec2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use super::operations::{
    clockness, find_line_line_intersection, segments_properly_intersect, Clockness,
};
use super::polygon::{IntLineSegment2, Polygon2};

/// How far past the boundary [`PolygonTree::find_nearest_land_point`] places
/// its result, so strict point location finds a triangle.
pub const NEAREST_LAND_INSET: f64 = 1e-3;

/// Index into [`PolygonTree`]'s node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolygonNodeId(pub u32);

impl PolygonNodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PolygonNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PolygonNode({})", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolygonNodeKind {
    Land,
    Hole,
}

impl PolygonNodeKind {
    fn child_kind(self) -> Self {
        match self {
            PolygonNodeKind::Land => PolygonNodeKind::Hole,
            PolygonNodeKind::Hole => PolygonNodeKind::Land,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolygonNode {
    pub kind: PolygonNodeKind,
    /// Empty only for the root sentinel.
    pub contour: Polygon2,
    pub parent: Option<PolygonNodeId>,
    pub children: Vec<PolygonNodeId>,
}

/// Land/hole polygon tree with alternating roles by depth.
///
/// Node 0 is always a contourless hole: the "outside world". Its children are
/// land, their children are holes, and so on. Every child's contour lies inside
/// its parent's and contours never cross, which is what lets containment
/// collapse to even-odd parity in [`PolygonTree::contains_point`].
///
/// Land contours are stored counterclockwise, hole contours clockwise.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolygonTree {
    nodes: Vec<PolygonNode>,
}

impl Default for PolygonTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PolygonTree {
    pub const ROOT: PolygonNodeId = PolygonNodeId(0);

    /// A tree holding only the root hole sentinel.
    pub fn new() -> Self {
        Self {
            nodes: vec![PolygonNode {
                kind: PolygonNodeKind::Hole,
                contour: Polygon2::default(),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Append `contour` under `parent`; the role is the opposite of the parent's.
    ///
    /// Containment is the caller's responsibility.
    pub fn add_child(&mut self, parent: PolygonNodeId, contour: Polygon2) -> PolygonNodeId {
        let kind = self.nodes[parent.index()].kind.child_kind();
        let contour = contour.oriented(kind == PolygonNodeKind::Land);
        let id = PolygonNodeId(self.nodes.len() as u32);
        self.nodes.push(PolygonNode {
            kind,
            contour,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Rebuild the nesting of a flat list of non-crossing contours.
    ///
    /// Contours are placed largest-area first; each one's parent is the
    /// smallest already-placed contour containing it. Degenerate contours are
    /// dropped.
    pub fn from_contours(contours: Vec<Polygon2>) -> Self {
        let mut contours: Vec<(i64, Polygon2)> = contours
            .into_iter()
            .filter(|c| !c.is_degenerate())
            .map(|c| (c.signed_area_doubled().abs(), c))
            .collect();
        // Stable sort keeps input order among equal areas, so output is reproducible.
        contours.sort_by(|a, b| b.0.cmp(&a.0));

        let mut tree = Self::new();
        let mut placed: Vec<PolygonNodeId> = Vec::with_capacity(contours.len());
        for (_, contour) in contours {
            let parent = placed
                .iter()
                .rev()
                .copied()
                .find(|&candidate| contour_inside(&contour, &tree.nodes[candidate.index()].contour))
                .unwrap_or(Self::ROOT);
            let id = tree.add_child(parent, contour);
            placed.push(id);
        }
        tree
    }

    pub fn root(&self) -> &PolygonNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: PolygonNodeId) -> &PolygonNode {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[PolygonNode] {
        &self.nodes
    }

    /// Number of nodes including the root sentinel.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn land_node_ids(&self) -> impl Iterator<Item = PolygonNodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == PolygonNodeKind::Land)
            .map(|(i, _)| PolygonNodeId(i as u32))
    }

    /// Every contour except the root's, in arena order.
    pub fn contours(&self) -> impl Iterator<Item = &Polygon2> + '_ {
        self.nodes.iter().skip(1).map(|n| &n.contour)
    }

    pub(crate) fn boundary_edges(&self) -> impl Iterator<Item = (IVec2, IVec2)> + '_ {
        self.contours().flat_map(|c| c.edges())
    }

    fn vertices(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.contours().flat_map(|c| c.points.iter().copied())
    }

    /// Whether `p` is walkable. Boundary points count as walkable.
    pub fn contains_point(&self, p: DVec2) -> bool {
        let mut depth = 0usize;
        for contour in self.contours() {
            if contour.is_on_boundary(p) {
                return true;
            }
            if contour.contains_strict(p) {
                depth += 1;
            }
        }
        depth % 2 == 1
    }

    /// Whether an agent can walk the straight line from `p` to `q`.
    ///
    /// Blocked if the segment properly crosses any boundary edge. Otherwise the
    /// segment is split at every boundary vertex lying on it, and each piece's
    /// midpoint must be walkable; this catches lines that slip through
    /// obstacles vertex-to-vertex.
    pub fn is_segment_unobstructed(&self, p: IVec2, q: IVec2) -> bool {
        if p == q {
            return self.contains_point(p.as_dvec2());
        }
        if self
            .boundary_edges()
            .any(|(a, b)| segments_properly_intersect(p, q, a, b))
        {
            return false;
        }

        let origin = p.as_dvec2();
        let direction = (q - p).as_dvec2();
        let len_sq = direction.length_squared();

        let mut cuts: SmallVec<[f64; 8]> = SmallVec::new();
        cuts.push(0.0);
        cuts.push(1.0);
        for v in self.vertices() {
            if v == p || v == q || clockness(p, v, q) != Clockness::Neutral {
                continue;
            }
            let t = (v.as_dvec2() - origin).dot(direction) / len_sq;
            if t > 0.0 && t < 1.0 {
                cuts.push(t);
            }
        }
        cuts.sort_by(|a, b| a.total_cmp(b));

        cuts.windows(2).all(|w| {
            w[1] - w[0] <= f64::EPSILON
                || self.contains_point(origin + direction * ((w[0] + w[1]) * 0.5))
        })
    }

    /// `p` itself if walkable, else the closest boundary point pushed
    /// `NEAREST_LAND_INSET` into the land. `None` for an empty tree.
    ///
    /// Land contours run counterclockwise and holes clockwise, so land is
    /// always on the left of a boundary edge. The point also moves toward the
    /// edge's midpoint so that it clears convex corners.
    pub fn find_nearest_land_point(&self, p: DVec2) -> Option<DVec2> {
        if self.contains_point(p) {
            return Some(p);
        }
        let (closest, a, b) = self
            .boundary_edges()
            .map(|(a, b)| {
                let (a, b) = (a.as_dvec2(), b.as_dvec2());
                (closest_point_on_segment(p, a, b), a, b)
            })
            .min_by(|x, y| x.0.distance_squared(p).total_cmp(&y.0.distance_squared(p)))?;

        let inward = (b - a).perp().normalize_or_zero();
        let along = ((a + b) * 0.5 - closest).normalize_or_zero();
        Some(closest + (inward + along) * NEAREST_LAND_INSET)
    }

    /// Closest point to `p` where the segment `p -> q` properly crosses a
    /// boundary edge, if any.
    pub fn try_find_first_obstruction(&self, p: IVec2, q: IVec2) -> Option<DVec2> {
        let ray = IntLineSegment2::new(p, q);
        let origin = p.as_dvec2();
        self.boundary_edges()
            .filter(|&(a, b)| segments_properly_intersect(p, q, a, b))
            .map(|(a, b)| find_line_line_intersection(&ray, &IntLineSegment2::new(a, b)))
            .min_by(|x, y| {
                (*x - origin)
                    .length_squared()
                    .total_cmp(&(*y - origin).length_squared())
            })
    }
}

fn closest_point_on_segment(p: DVec2, a: DVec2, b: DVec2) -> DVec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return a;
    }
    a + ab * ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
}

/// Whether `inner` lies inside `outer`, judged by its first vertex that isn't
/// on `outer`'s boundary. Contours sharing every vertex are not nested.
fn contour_inside(inner: &Polygon2, outer: &Polygon2) -> bool {
    inner
        .points
        .iter()
        .map(|p| p.as_dvec2())
        .find(|p| !outer.is_on_boundary(*p))
        .map(|p| outer.contains_strict(p))
        .unwrap_or(false)
}
