use bevy::math::DVec2;
use serde::{Deserialize, Serialize};

use super::spatial_index::TriangleGridIndex;
use crate::terrain::geometry::{is_point_in_triangle, PolygonNodeId};
use crate::terrain::math::IntRect2;

/// Marks a triangle edge with no interior neighbor, in both neighbor arrays.
pub const NO_NEIGHBOR_INDEX: u32 = u32::MAX;

/// One counterclockwise triangle of an island mesh.
///
/// Edge `j` is the edge opposite vertex `j`, running from `points[(j + 1) % 3]`
/// to `points[(j + 2) % 3]`. `neighbor_triangle_indices[j]` is the triangle
/// across that edge and `neighbor_opposing_point_indices[j]` is the index, in
/// that triangle's `points`, of its vertex not on the shared edge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Triangle {
    pub points: [DVec2; 3],
    pub centroid: DVec2,
    pub neighbor_triangle_indices: [u32; 3],
    pub neighbor_opposing_point_indices: [u32; 3],
    pub bounds: IntRect2,
}

impl Triangle {
    pub fn new(points: [DVec2; 3]) -> Self {
        Self {
            points,
            centroid: (points[0] + points[1] + points[2]) / 3.0,
            neighbor_triangle_indices: [NO_NEIGHBOR_INDEX; 3],
            neighbor_opposing_point_indices: [NO_NEIGHBOR_INDEX; 3],
            bounds: IntRect2::padded_bounds_of(&points),
        }
    }

    #[inline]
    pub fn neighbor(&self, edge: usize) -> Option<usize> {
        let index = self.neighbor_triangle_indices[edge];
        (index != NO_NEIGHBOR_INDEX).then_some(index as usize)
    }

    /// Strict interior test; see [`is_point_in_triangle`].
    #[inline]
    pub fn contains(&self, p: DVec2) -> bool {
        self.bounds.contains(p) && is_point_in_triangle(p, &self.points)
    }

    pub fn edge(&self, edge: usize) -> (DVec2, DVec2) {
        (self.points[(edge + 1) % 3], self.points[(edge + 2) % 3])
    }
}

/// A connected triangle mesh covering one land node of the punched tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TriangulationIsland {
    /// Land node this island was built from.
    pub land_node: PolygonNodeId,
    pub triangles: Vec<Triangle>,
    pub bounds: IntRect2,
    pub spatial_index: TriangleGridIndex,
}

impl TriangulationIsland {
    /// First triangle (lowest index) strictly containing `p`.
    pub fn try_find_triangle(&self, p: DVec2) -> Option<usize> {
        if !self.bounds.contains(p) {
            return None;
        }
        self.spatial_index
            .candidates(p)
            .iter()
            .map(|&i| i as usize)
            .find(|&i| self.triangles[i].contains(p))
    }
}

/// Result of point-locating inside a [`Triangulation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TriangleLocation {
    pub island: usize,
    pub triangle: usize,
}

/// All islands of one punched-land tree.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Triangulation {
    pub islands: Vec<TriangulationIsland>,
}

impl Triangulation {
    /// Locate `p`, trying islands in order.
    ///
    /// Points exactly on a triangle edge belong to no triangle and return
    /// `None`.
    pub fn try_intersect(&self, p: DVec2) -> Option<TriangleLocation> {
        self.islands.iter().enumerate().find_map(|(island, mesh)| {
            mesh.try_find_triangle(p)
                .map(|triangle| TriangleLocation { island, triangle })
        })
    }

    pub fn triangle(&self, location: TriangleLocation) -> &Triangle {
        &self.islands[location.island].triangles[location.triangle]
    }

    pub fn triangle_count(&self) -> usize {
        self.islands.iter().map(|i| i.triangles.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }
}
