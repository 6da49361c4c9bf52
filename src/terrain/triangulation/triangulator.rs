use bevy::log::debug;
use bevy::math::IVec2;
use rustc_hash::{FxHashMap, FxHashSet};
use terragami_macros::profile;

use super::delaunay::{doubled_area, edge_incidence, edge_key, refine_constrained_delaunay, IndexTriangle};
use super::spatial_index::TriangleGridIndex;
use super::types::{Triangle, Triangulation, TriangulationIsland};
use crate::terrain::config::TerrainConfig;
use crate::terrain::geometry::{clockness_f64, Clockness, Polygon2, PolygonNodeId, PolygonNodeKind, PolygonTree};

// ============================================================================
// Entry Points
// ============================================================================

/// Triangulate every land node of a punched-land tree.
///
/// The tree must be rooted at the contourless hole sentinel. Land nodes nested
/// inside holes become separate islands; an island never spans a hole.
#[profile(2)]
pub fn triangulate_root(tree: &PolygonTree, config: &TerrainConfig) -> Triangulation {
    let root = tree.root();
    assert!(
        root.kind == PolygonNodeKind::Hole && root.contour.is_empty() && root.parent.is_none(),
        "triangulate_root expects the empty hole sentinel, got {:?} node with {} points",
        root.kind,
        root.contour.len()
    );

    let mut islands = Vec::new();
    for &land in &root.children {
        collect_islands(tree, land, config, &mut islands);
    }

    debug!(
        "[TRIANGULATOR] {} islands, {} triangles",
        islands.len(),
        islands.iter().map(|i: &TriangulationIsland| i.triangles.len()).sum::<usize>()
    );
    Triangulation { islands }
}

fn collect_islands(
    tree: &PolygonTree,
    land: PolygonNodeId,
    config: &TerrainConfig,
    islands: &mut Vec<TriangulationIsland>,
) {
    let island = triangulate_land_node(tree, land, config);
    if !island.triangles.is_empty() {
        islands.push(island);
    }
    for &hole in &tree.node(land).children {
        for &inner in &tree.node(hole).children {
            collect_islands(tree, inner, config, islands);
        }
    }
}

/// Triangulate one land node with its direct hole children cut out.
///
/// # Algorithm
/// 1. Ear-clip the outer contour (counterclockwise) with each hole contour
///    (clockwise) as a hole loop.
/// 2. Drop zero-area ears and orient the rest counterclockwise.
/// 3. Optionally Lawson-flip to constrained Delaunay; contour edges never flip.
/// 4. Link neighbors across shared edges and index triangles on an 8×8 grid.
pub fn triangulate_land_node(
    tree: &PolygonTree,
    node_id: PolygonNodeId,
    config: &TerrainConfig,
) -> TriangulationIsland {
    let node = tree.node(node_id);
    assert!(
        node.kind == PolygonNodeKind::Land,
        "triangulate_land_node called on {} which is a {:?} node",
        node_id,
        node.kind
    );
    assert!(
        !node.contour.is_empty() && node.parent.is_some(),
        "land node {} must have a contour and a parent",
        node_id
    );

    let mut input = EarcutInput::default();
    input.push_loop(&node.contour.oriented(true), false);
    for &hole in &node.children {
        input.push_loop(&tree.node(hole).contour.oriented(false), true);
    }

    let raw = match earcutr::earcut(&input.flat, &input.hole_starts, 2) {
        Ok(indices) => indices,
        Err(err) => panic!("earcut rejected land node {}: {:?}", node_id, err),
    };

    let mut triangles: Vec<IndexTriangle> = raw
        .chunks_exact(3)
        .filter_map(|ear| {
            let mut tri = [
                input.loop_vertices[ear[0]],
                input.loop_vertices[ear[1]],
                input.loop_vertices[ear[2]],
            ];
            match doubled_area(&input.vertices, &tri) {
                0 => None,
                area if area < 0 => {
                    tri.swap(1, 2);
                    Some(tri)
                }
                _ => Some(tri),
            }
        })
        .collect();

    if config.delaunay_refinement {
        refine_constrained_delaunay(
            &input.vertices,
            &mut triangles,
            &input.constraints,
            config.max_delaunay_flip_passes,
        );
    }

    let island = assemble_island(node_id, &input.vertices, &triangles);
    if config.validate_triangulation {
        validate_island(&island);
    }
    island
}

// ============================================================================
// Assembly
// ============================================================================

/// Flattened earcut input with lattice points deduplicated, so that contours
/// touching at a vertex share one mesh vertex.
#[derive(Default)]
struct EarcutInput {
    flat: Vec<f64>,
    hole_starts: Vec<usize>,
    /// Earcut input index -> deduplicated vertex index.
    loop_vertices: Vec<u32>,
    vertices: Vec<IVec2>,
    lookup: FxHashMap<IVec2, u32>,
    constraints: FxHashSet<(u32, u32)>,
}

impl EarcutInput {
    fn push_loop(&mut self, contour: &Polygon2, is_hole: bool) {
        if is_hole {
            self.hole_starts.push(self.loop_vertices.len());
        }
        let start = self.loop_vertices.len();
        for &p in &contour.points {
            let next_index = self.vertices.len() as u32;
            let index = *self.lookup.entry(p).or_insert(next_index);
            if index == next_index {
                self.vertices.push(p);
            }
            self.loop_vertices.push(index);
            self.flat.push(p.x as f64);
            self.flat.push(p.y as f64);
        }
        let ring = &self.loop_vertices[start..];
        for i in 0..ring.len() {
            let a = ring[i];
            let b = ring[(i + 1) % ring.len()];
            if a != b {
                self.constraints.insert(edge_key(a, b));
            }
        }
    }
}

pub(super) fn assemble_island(land_node: PolygonNodeId, vertices: &[IVec2], index_triangles: &[IndexTriangle]) -> TriangulationIsland {
    let mut triangles: Vec<Triangle> = index_triangles
        .iter()
        .map(|tri| Triangle::new(tri.map(|i| vertices[i as usize].as_dvec2())))
        .collect();

    // Edges used by more than two triangles only occur at pinch points; they
    // are left unlinked like boundary edges.
    for uses in edge_incidence(index_triangles).values() {
        if let [(t1, j1), (t2, j2)] = uses.as_slice() {
            link_neighbor(&mut triangles, *t1, *j1, *t2);
            link_neighbor(&mut triangles, *t2, *j2, *t1);
        }
    }

    let bounds = triangles
        .iter()
        .map(|t| t.bounds)
        .reduce(|a, b| a.union(&b))
        .unwrap_or_default();
    let spatial_index = TriangleGridIndex::build(bounds, &triangles);

    TriangulationIsland {
        land_node,
        triangles,
        bounds,
        spatial_index,
    }
}

/// Record `neighbor` across edge `edge` of `triangle`, finding the neighbor's
/// opposing vertex by matching the shared endpoints under each rotation.
///
/// Two counterclockwise neighbors traverse their shared edge in opposite
/// directions; a same-direction match means the triangles overlap and is
/// fatal.
fn link_neighbor(triangles: &mut [Triangle], triangle: usize, edge: usize, neighbor: usize) {
    let (e1, e2) = triangles[triangle].edge(edge);
    let other = &triangles[neighbor].points;
    let opposing = (0..3)
        .find(|&k| other[(k + 1) % 3] == e2 && other[(k + 2) % 3] == e1)
        .unwrap_or_else(|| {
            panic!(
                "triangle {} shares edge {:?}-{:?} with {} but the endpoints don't match its vertices {:?} in reverse",
                triangle, e1, e2, neighbor, other
            )
        });

    triangles[triangle].neighbor_triangle_indices[edge] = neighbor as u32;
    triangles[triangle].neighbor_opposing_point_indices[edge] = opposing as u32;
}

/// Winding and adjacency symmetry post-conditions.
pub(crate) fn validate_island(island: &TriangulationIsland) {
    for (t, triangle) in island.triangles.iter().enumerate() {
        for i in 0..3 {
            let winding = clockness_f64(triangle.points[i], triangle.centroid, triangle.points[(i + 1) % 3]);
            assert!(
                winding == Clockness::Clockwise,
                "triangle {} of land node {} is not counterclockwise: {:?}",
                t,
                island.land_node,
                triangle.points
            );
        }
        for j in 0..3 {
            let Some(n) = triangle.neighbor(j) else {
                continue;
            };
            let k = triangle.neighbor_opposing_point_indices[j] as usize;
            let back = &island.triangles[n];
            assert!(
                back.neighbor_triangle_indices[k] as usize == t
                    && back.neighbor_opposing_point_indices[k] as usize == j,
                "asymmetric adjacency between triangles {} and {} of land node {}",
                t,
                n,
                island.land_node
            );
        }
    }
}
