//! Constrained Delaunay triangulation of land/hole polygon trees.
//!
//! Each land node becomes one [`TriangulationIsland`]: an adjacency-linked
//! triangle mesh with an 8×8 grid index for point location.

mod delaunay;
mod spatial_index;
mod triangulator;
mod types;


pub use spatial_index::{TriangleGridIndex, GRID_RESOLUTION};
pub use triangulator::{triangulate_land_node, triangulate_root};
pub use types::{Triangle, TriangleLocation, Triangulation, TriangulationIsland, NO_NEIGHBOR_INDEX};
