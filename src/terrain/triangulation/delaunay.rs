use bevy::math::IVec2;
use bevy::log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::terrain::geometry::{cross, incircle};

/// Counterclockwise vertex-index triple into the land node's vertex list.
pub(crate) type IndexTriangle = [u32; 3];

/// Undirected edge key with the smaller index first.
#[inline]
pub(crate) fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

#[inline]
pub(crate) fn doubled_area(vertices: &[IVec2], tri: &IndexTriangle) -> i64 {
    let a = vertices[tri[0] as usize];
    let b = vertices[tri[1] as usize];
    let c = vertices[tri[2] as usize];
    cross(b - a, c - a)
}

/// Map every undirected edge to the `(triangle, opposite vertex slot)` pairs
/// that use it.
pub(crate) fn edge_incidence(triangles: &[IndexTriangle]) -> FxHashMap<(u32, u32), SmallVec<[(usize, usize); 2]>> {
    let mut incidence: FxHashMap<(u32, u32), SmallVec<[(usize, usize); 2]>> = FxHashMap::default();
    for (t, tri) in triangles.iter().enumerate() {
        for j in 0..3 {
            let key = edge_key(tri[(j + 1) % 3], tri[(j + 2) % 3]);
            incidence.entry(key).or_default().push((t, j));
        }
    }
    incidence
}

/// Lawson-flip `triangles` until no unconstrained edge is locally non-Delaunay.
///
/// # Algorithm
/// Each pass rebuilds edge incidence, then visits every interior edge not in
/// `constraints`. For triangles `(a, b, c)` and `(c, b, d)` sharing `b-c`, the
/// edge flips to `a-d` when `d` lies strictly inside the circumcircle of
/// `a, b, c` and both replacement triangles are strictly counterclockwise
/// (i.e. the quad is convex). A triangle flipped once is left alone for the
/// rest of the pass since its incidence entries are stale.
///
/// Returns the number of flips performed.
pub(crate) fn refine_constrained_delaunay(
    vertices: &[IVec2],
    triangles: &mut [IndexTriangle],
    constraints: &FxHashSet<(u32, u32)>,
    max_passes: usize,
) -> usize {
    let mut total_flips = 0;
    for pass in 0..max_passes {
        let incidence = edge_incidence(triangles);
        let mut dirty = vec![false; triangles.len()];
        let mut flips = 0;

        // Deterministic visiting order regardless of hash iteration.
        let mut edges: Vec<_> = incidence
            .iter()
            .filter(|(key, uses)| uses.len() == 2 && !constraints.contains(*key))
            .map(|(key, uses)| (*key, uses[0], uses[1]))
            .collect();
        edges.sort_unstable_by_key(|(key, _, _)| *key);

        for (_, (t1, j1), (t2, j2)) in edges {
            if dirty[t1] || dirty[t2] {
                continue;
            }
            let first = triangles[t1];
            let second = triangles[t2];
            let a = first[j1];
            let b = first[(j1 + 1) % 3];
            let c = first[(j1 + 2) % 3];
            let d = second[j2];

            let [pa, pb, pc, pd] = [a, b, c, d].map(|i| vertices[i as usize]);
            if incircle(pa, pb, pc, pd) <= 0 {
                continue;
            }
            let replacement_a: IndexTriangle = [a, b, d];
            let replacement_b: IndexTriangle = [a, d, c];
            if doubled_area(vertices, &replacement_a) <= 0 || doubled_area(vertices, &replacement_b) <= 0 {
                continue;
            }

            triangles[t1] = replacement_a;
            triangles[t2] = replacement_b;
            dirty[t1] = true;
            dirty[t2] = true;
            flips += 1;
        }

        total_flips += flips;
        if flips == 0 {
            debug!("[TRIANGULATOR] Delaunay converged after {} passes, {} flips", pass + 1, total_flips);
            return total_flips;
        }
    }
    debug!(
        "[TRIANGULATOR] Delaunay pass cap {} reached after {} flips",
        max_passes, total_flips
    );
    total_flips
}
