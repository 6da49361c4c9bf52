//! Punched-land construction on top of clipper2's boolean ops and offsetting.

use bevy::math::DVec2;
use clipper2::{difference, intersect, union, EndType, FillRule, JoinType, Paths};

use super::polygon::{IntLineSegment2, Polygon2};
use super::polygon_tree::PolygonTree;
use crate::terrain::config::{DilationJoin, TerrainConfig};

type Coords = Vec<Vec<(f64, f64)>>;

/// Everything that shapes one sector's walkable area, in sector-local space.
pub(crate) struct LandShape<'a> {
    pub included: &'a [Polygon2],
    pub excluded: &'a [Polygon2],
    pub temporary_holes: &'a [Polygon2],
    pub crossovers: &'a [IntLineSegment2],
}

// ============================================================================
// Punched Land
// ============================================================================

/// Walkable area for an agent of `radius`.
///
/// # Algorithm
/// 1. Union the included contours into land.
/// 2. Erode land by `radius` so the agent's center keeps clear of its edges.
/// 3. Punch each crossover opening back in: a strip along the segment, inset
///    by `radius` at both ends, clipped to the uneroded land.
/// 4. Dilate excluded contours and temporary holes by `radius` and subtract.
/// 5. Round to the integer lattice and rebuild the land/hole nesting.
pub(crate) fn punch_land(shape: &LandShape<'_>, radius: f64, config: &TerrainConfig) -> PolygonTree {
    let land = union_all(contours_to_coords(shape.included));
    if land.is_empty() {
        return PolygonTree::new();
    }

    let mut walkable = offset(&land, -radius, config);

    let strips: Coords = shape
        .crossovers
        .iter()
        .filter_map(|segment| crossover_strip(segment, radius))
        .collect();
    if !strips.is_empty() {
        let openings = boolean_op(BooleanOp::Intersect, strips, land);
        walkable = boolean_op(BooleanOp::Union, walkable, openings);
    }

    let obstacles: Coords = contours_to_coords(shape.excluded)
        .into_iter()
        .chain(contours_to_coords(shape.temporary_holes))
        .collect();
    if !obstacles.is_empty() {
        let dilated = offset(&union_all(obstacles), radius, config);
        walkable = boolean_op(BooleanOp::Difference, walkable, dilated);
    }

    PolygonTree::from_contours(
        walkable
            .into_iter()
            .map(Polygon2::from_clipper_coords)
            .filter(|c| !c.is_degenerate())
            .collect(),
    )
}

/// How far past the ideal anchor position a snapped lattice waypoint may sit.
/// The nearest walkable point of the 3×3 neighbourhood is at most √2 away.
pub(crate) const ANCHOR_SNAP_MARGIN: f64 = 2.0;

/// Strip rectangle punching `segment` through the eroded border, or `None` if
/// the opening is too narrow for the agent.
///
/// Half-width is `radius + ANCHOR_SNAP_MARGIN` and the ends extend the same
/// margin past the inset, so snapped anchor waypoints stay inside.
pub(crate) fn crossover_strip(segment: &IntLineSegment2, radius: f64) -> Option<Vec<(f64, f64)>> {
    let length = segment.length();
    if length <= 2.0 * radius {
        return None;
    }
    let first = segment.first.as_dvec2();
    let direction = (segment.second.as_dvec2() - first) / length;
    let inset = (radius - ANCHOR_SNAP_MARGIN).max(0.0);
    let a = first + direction * inset;
    let b = first + direction * (length - inset);
    let side = direction.perp() * (radius + ANCHOR_SNAP_MARGIN);
    Some(
        [a - side, b - side, b + side, a + side]
            .into_iter()
            .map(|p: DVec2| (p.x, p.y))
            .collect(),
    )
}

// ============================================================================
// clipper2 plumbing
// ============================================================================

#[derive(Clone, Copy, Debug)]
enum BooleanOp {
    Union,
    Intersect,
    Difference,
}

fn contours_to_coords(contours: &[Polygon2]) -> Coords {
    contours
        .iter()
        .filter(|c| !c.is_degenerate())
        .map(Polygon2::to_clipper_coords)
        .collect()
}

fn union_all(subject: Coords) -> Coords {
    boolean_op(BooleanOp::Union, subject, Vec::new())
}

fn boolean_op(op: BooleanOp, subject: Coords, clip: Coords) -> Coords {
    match op {
        BooleanOp::Union if subject.is_empty() && clip.is_empty() => return Vec::new(),
        BooleanOp::Intersect | BooleanOp::Difference if subject.is_empty() => return Vec::new(),
        BooleanOp::Difference if clip.is_empty() => return subject,
        BooleanOp::Intersect if clip.is_empty() => return Vec::new(),
        _ => {}
    }

    let subject: Paths = subject.into();
    let clip: Paths = clip.into();
    let result = match op {
        BooleanOp::Union => union(subject, clip, FillRule::NonZero),
        BooleanOp::Intersect => intersect(subject, clip, FillRule::NonZero),
        BooleanOp::Difference => difference(subject, clip, FillRule::NonZero),
    };
    match result {
        Ok(paths) => keep_polygons(paths.into()),
        Err(err) => panic!("clipper2 {op:?} rejected terrain contours: {err:?}"),
    }
}

fn offset(paths: &Coords, delta: f64, config: &TerrainConfig) -> Coords {
    if delta == 0.0 || paths.is_empty() {
        return paths.clone();
    }
    let join = match config.dilation_join {
        DilationJoin::Miter => JoinType::Miter,
        DilationJoin::Round => JoinType::Round,
        DilationJoin::Square => JoinType::Square,
    };
    let input: Paths = paths.clone().into();
    keep_polygons(
        input
            .inflate(delta, join, EndType::Polygon, config.miter_limit)
            .into(),
    )
}

fn keep_polygons(coords: Coords) -> Coords {
    coords.into_iter().filter(|path| path.len() >= 3).collect()
}
