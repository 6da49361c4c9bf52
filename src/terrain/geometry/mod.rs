//! Exact 2D geometry for terrain compilation.
//!
//! Contours and segments live on the integer lattice so that orientation tests
//! are exact; anything derived (triangle vertices, centroids, query points) is
//! `f64`.

mod operations;
mod polygon;
mod polygon_tree;
mod visibility_polygon;
pub(crate) mod clipping;

#[cfg(test)]
mod tests;

pub use operations::{
    clockness, clockness_f64, clockness_of_vectors, cross, find_line_line_intersection, incircle,
    is_point_in_triangle, is_point_on_segment, segments_properly_intersect, Clockness,
};
pub use polygon::{IntLineSegment2, Polygon2};
pub use polygon_tree::{PolygonNode, PolygonNodeId, PolygonNodeKind, PolygonTree, NEAREST_LAND_INSET};
pub use visibility_polygon::VisibilityPolygon;
