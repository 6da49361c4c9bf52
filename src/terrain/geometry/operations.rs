use bevy::math::{DVec2, IVec2};

use super::polygon::IntLineSegment2;

/// Turn direction of the path `a -> b -> c`.
///
/// Coordinates are y-up: `(0,0) -> (10,0) -> (10,10)` turns left and is
/// `CounterClockwise`.
#[repr(i8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Clockness {
    CounterClockwise = -1,
    Neutral = 0,
    Clockwise = 1,
}

impl Clockness {
    #[inline]
    fn from_sign(value: i64) -> Self {
        match value.signum() {
            1 => Clockness::Clockwise,
            -1 => Clockness::CounterClockwise,
            _ => Clockness::Neutral,
        }
    }

    #[inline]
    fn from_sign_f64(value: f64) -> Self {
        if value > 0.0 {
            Clockness::Clockwise
        } else if value < 0.0 {
            Clockness::CounterClockwise
        } else {
            Clockness::Neutral
        }
    }
}

/// `a.x * b.y - a.y * b.x`, widened so i32 lattice inputs never overflow.
#[inline]
pub fn cross(a: IVec2, b: IVec2) -> i64 {
    a.x as i64 * b.y as i64 - a.y as i64 * b.x as i64
}

/// Orientation of `a -> b -> c`: sign of `cross(b - a, b - c)`.
#[inline]
pub fn clockness(a: IVec2, b: IVec2, c: IVec2) -> Clockness {
    let bax = b.x as i64 - a.x as i64;
    let bay = b.y as i64 - a.y as i64;
    let bcx = b.x as i64 - c.x as i64;
    let bcy = b.y as i64 - c.y as i64;
    Clockness::from_sign(bax * bcy - bay * bcx)
}

/// Orientation from the two legs `ba = b - a` and `bc = b - c` directly.
#[inline]
pub fn clockness_of_vectors(ba: IVec2, bc: IVec2) -> Clockness {
    Clockness::from_sign(cross(ba, bc))
}

/// Float orientation for derived points (triangle vertices, centroids).
#[inline]
pub fn clockness_f64(a: DVec2, b: DVec2, c: DVec2) -> Clockness {
    let ba = b - a;
    let bc = b - c;
    Clockness::from_sign_f64(ba.x * bc.y - ba.y * bc.x)
}

/// Intersection point of the infinite lines through `a` and `b`.
///
/// Panics on parallel (or degenerate) input. Callers are expected to filter
/// with [`segments_properly_intersect`] first.
pub fn find_line_line_intersection(a: &IntLineSegment2, b: &IntLineSegment2) -> DVec2 {
    let p1 = a.first;
    let p2 = a.second;
    let p3 = b.first;
    let p4 = b.second;

    let p1xp2 = cross(p1, p2) as i128; // x1y2 - y1x2
    let p3xp4 = cross(p3, p4) as i128; // x3y4 - y3x4
    let v21 = (p1.x as i128 - p2.x as i128, p1.y as i128 - p2.y as i128);
    let v43 = (p3.x as i128 - p4.x as i128, p3.y as i128 - p4.y as i128);

    let denominator = v21.0 * v43.1 - v21.1 * v43.0;
    assert!(
        denominator != 0,
        "line-line intersection requested for parallel lines {:?} and {:?}",
        a,
        b
    );
    let numerator_x = p1xp2 * v43.0 - v21.0 * p3xp4;
    let numerator_y = p1xp2 * v43.1 - v21.1 * p3xp4;

    DVec2::new(
        numerator_x as f64 / denominator as f64,
        numerator_y as f64 / denominator as f64,
    )
}

/// True when the two segments cross at a single point interior to both.
/// Touching at an endpoint and collinear overlap do not count.
pub fn segments_properly_intersect(a0: IVec2, a1: IVec2, b0: IVec2, b1: IVec2) -> bool {
    let o1 = clockness(a0, a1, b0);
    let o2 = clockness(a0, a1, b1);
    let o3 = clockness(b0, b1, a0);
    let o4 = clockness(b0, b1, a1);
    o1 != Clockness::Neutral
        && o2 != Clockness::Neutral
        && o3 != Clockness::Neutral
        && o4 != Clockness::Neutral
        && o1 != o2
        && o3 != o4
}

/// Point-on-segment test with a small absolute tolerance for float queries.
pub fn is_point_on_segment(p: DVec2, a: DVec2, b: DVec2) -> bool {
    const EPSILON: f64 = 1e-9;
    let ab = b - a;
    let ap = p - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return ap.length_squared() <= EPSILON * EPSILON;
    }
    let cross = ab.perp_dot(ap);
    if cross.abs() > EPSILON * len_sq.sqrt() {
        return false;
    }
    let t = ab.dot(ap) / len_sq;
    (-EPSILON..=1.0 + EPSILON).contains(&t)
}

/// Barycentric point-in-triangle test (http://blackpawn.com/texts/pointinpoly/).
///
/// Strict on every edge: a point with `u == 0`, `v == 0` or `u + v == 1` is
/// outside. Adjacent triangles therefore never both claim a shared boundary
/// point.
pub fn is_point_in_triangle(p: DVec2, points: &[DVec2; 3]) -> bool {
    let a = points[0];
    let b = points[1];
    let c = points[2];

    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;

    let dot00 = v0.dot(v0);
    let dot01 = v0.dot(v1);
    let dot02 = v0.dot(v2);
    let dot11 = v1.dot(v1);
    let dot12 = v1.dot(v2);

    let inv_denom = 1.0 / (dot00 * dot11 - dot01 * dot01);
    let u = (dot11 * dot02 - dot01 * dot12) * inv_denom;
    let v = (dot00 * dot12 - dot01 * dot02) * inv_denom;

    u > 0.0 && v > 0.0 && u + v < 1.0
}

/// Exact incircle determinant. Positive when `d` lies strictly inside the
/// circumcircle of the counterclockwise triangle `a, b, c`.
///
/// Exact for coordinates below 2^28 in magnitude.
pub fn incircle(a: IVec2, b: IVec2, c: IVec2, d: IVec2) -> i128 {
    let adx = a.x as i128 - d.x as i128;
    let ady = a.y as i128 - d.y as i128;
    let bdx = b.x as i128 - d.x as i128;
    let bdy = b.y as i128 - d.y as i128;
    let cdx = c.x as i128 - d.x as i128;
    let cdy = c.y as i128 - d.y as i128;

    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    adx * (bdy * clift - blift * cdy) - ady * (bdx * clift - blift * cdx)
        + alift * (bdx * cdy - bdy * cdx)
}
