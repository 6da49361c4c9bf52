use bevy::math::DVec2;

use super::polygon_tree::PolygonTree;

/// Angular offset of the extra rays cast either side of each barrier vertex,
/// so the polygon wraps around corners instead of stopping at them.
const CORNER_RAY_OFFSET: f64 = 1e-6;
const MIN_HIT_DISTANCE: f64 = 1e-9;

/// Region of a [`PolygonTree`]'s land in direct sight of one point.
///
/// Vertices are the closest barrier hits of rays cast at every barrier
/// vertex, ordered counterclockwise by angle around the origin.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityPolygon {
    origin: DVec2,
    points: Vec<DVec2>,
}

impl VisibilityPolygon {
    /// Field of view from `origin`, or `None` when `origin` isn't walkable.
    ///
    /// Every boundary edge of the tree is a barrier. Only the contour and hole
    /// children of the land node containing `origin` can be hit first, so this
    /// is the same as restricting to that node.
    pub fn compute(land: &PolygonTree, origin: DVec2) -> Option<Self> {
        if !land.contains_point(origin) {
            return None;
        }
        let barriers: Vec<(DVec2, DVec2)> = land
            .boundary_edges()
            .map(|(a, b)| (a.as_dvec2(), b.as_dvec2()))
            .collect();

        let mut angles: Vec<f64> = Vec::with_capacity(barriers.len() * 3);
        for &(a, _) in &barriers {
            let to_vertex = a - origin;
            if to_vertex.length_squared() < MIN_HIT_DISTANCE {
                continue;
            }
            let angle = to_vertex.y.atan2(to_vertex.x);
            angles.extend([angle - CORNER_RAY_OFFSET, angle, angle + CORNER_RAY_OFFSET]);
        }
        angles.sort_by(|a, b| a.total_cmp(b));
        angles.dedup();

        let mut points: Vec<DVec2> = angles
            .into_iter()
            .filter_map(|angle| cast(origin, DVec2::new(angle.cos(), angle.sin()), &barriers))
            .collect();
        points.dedup_by(|a, b| a.distance_squared(*b) < MIN_HIT_DISTANCE);

        Some(Self { origin, points })
    }

    pub fn origin(&self) -> DVec2 {
        self.origin
    }

    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    pub fn area(&self) -> f64 {
        let n = self.points.len();
        (0..n)
            .map(|i| self.points[i].perp_dot(self.points[(i + 1) % n]))
            .sum::<f64>()
            * 0.5
    }

    /// Even-odd test; points exactly on the outline may land either way.
    pub fn contains(&self, p: DVec2) -> bool {
        let n = self.points.len();
        let mut inside = false;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

/// Closest barrier hit of the ray `origin + t * direction`, `t > 0`.
fn cast(origin: DVec2, direction: DVec2, barriers: &[(DVec2, DVec2)]) -> Option<DVec2> {
    barriers
        .iter()
        .filter_map(|&(a, b)| {
            let edge = b - a;
            let denom = direction.perp_dot(edge);
            if denom.abs() < f64::EPSILON {
                return None;
            }
            let w = a - origin;
            let t = w.perp_dot(edge) / denom;
            let s = w.perp_dot(direction) / denom;
            (t > MIN_HIT_DISTANCE && (-1e-12..=1.0 + 1e-12).contains(&s)).then_some(t)
        })
        .min_by(|a, b| a.total_cmp(b))
        .map(|t| origin + direction * t)
}
