use bevy::log::{debug, warn};
use bevy::math::{DVec2, IVec2};
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::terrain::geometry::VisibilityPolygon;
use crate::terrain::pathfinding::{multi_source_dijkstra, NO_PREDECESSOR};
use crate::terrain::snapshot::{
    LocalGeometryView, LocalGeometryViewManager, SectorEdgeDescription, SectorEdgeId, SectorNodeDescription,
    SectorNodeId,
};
use crate::terrain::triangulation::TriangleLocation;

/// A point in one sector's local space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectorLocalPoint {
    pub sector: SectorNodeId,
    pub position: IVec2,
}

impl SectorLocalPoint {
    pub fn new(sector: SectorNodeId, x: i32, y: i32) -> Self {
        Self {
            sector,
            position: IVec2::new(x, y),
        }
    }
}

/// A world point resolved to a sector triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalizedPoint {
    pub sector: SectorNodeId,
    pub world: DVec2,
    pub local: DVec2,
    pub location: TriangleLocation,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayPath {
    pub cost: f64,
    /// Start, intermediate waypoints, goal. A crossover shows up as two
    /// consecutive points in different sectors at the same world position.
    pub points: Vec<SectorLocalPoint>,
}

#[derive(Debug)]
pub struct TerrainOverlayNetworkNode {
    pub description: Arc<SectorNodeDescription>,
    pub view: Arc<LocalGeometryView>,
    /// Index of this node's first waypoint in the stitched graph.
    pub waypoint_offset: usize,
}

/// Zero-cost directed jumps through one crossover, pairing source and
/// destination anchor waypoints index-wise.
#[derive(Clone, Debug)]
pub struct CrossoverLink {
    pub edge: SectorEdgeId,
    pub source: SectorNodeId,
    pub destination: SectorNodeId,
    /// Global waypoint indices `(from, to)`.
    pub pairs: SmallVec<[(usize, usize); 3]>,
}

/// Per-radius traversal graph: every sector's visibility graph, offset into
/// one index space and stitched by crossover links.
#[derive(Debug)]
pub struct TerrainOverlayNetwork {
    agent_radius: f64,
    nodes: Vec<TerrainOverlayNetworkNode>,
    node_index: BTreeMap<SectorNodeId, usize>,
    links: Vec<CrossoverLink>,
    link_targets: FxHashMap<usize, SmallVec<[usize; 2]>>,
    waypoint_count: usize,
}

impl TerrainOverlayNetwork {
    pub(crate) fn compile(
        agent_radius: f64,
        node_descriptions: &[Arc<SectorNodeDescription>],
        edge_descriptions: &[Arc<SectorEdgeDescription>],
        managers: &BTreeMap<SectorNodeId, Arc<LocalGeometryViewManager>>,
    ) -> Self {
        let mut nodes = Vec::with_capacity(node_descriptions.len());
        let mut node_index = BTreeMap::new();
        let mut waypoint_count = 0;
        for description in node_descriptions {
            let Some(manager) = managers.get(&description.id) else {
                warn!("[OVERLAY] {} has no view manager, skipping", description.id);
                continue;
            };
            let view = manager.get_or_compute_view(agent_radius);
            let waypoint_offset = waypoint_count;
            waypoint_count += view.visibility_graph().len();
            node_index.insert(description.id, nodes.len());
            nodes.push(TerrainOverlayNetworkNode {
                description: description.clone(),
                view,
                waypoint_offset,
            });
        }

        let mut network = Self {
            agent_radius,
            nodes,
            node_index,
            links: Vec::new(),
            link_targets: FxHashMap::default(),
            waypoint_count,
        };
        for edge in edge_descriptions {
            if let Some(link) = network.link_crossover(edge) {
                for &(from, to) in &link.pairs {
                    network.link_targets.entry(from).or_default().push(to);
                }
                network.links.push(link);
            }
        }

        debug!(
            "[OVERLAY] Radius {}: {} sectors, {} waypoints, {} crossover links",
            agent_radius,
            network.nodes.len(),
            network.waypoint_count,
            network.links.len()
        );
        network
    }

    fn link_crossover(&self, edge: &SectorEdgeDescription) -> Option<CrossoverLink> {
        let source = &self.nodes[*self.node_index.get(&edge.source)?];
        let destination = &self.nodes[*self.node_index.get(&edge.destination)?];

        let Some(from) = source.view.anchor_waypoints_along(&edge.source_segment) else {
            warn!("[OVERLAY] {} has no crossover anchor in its source {}", edge.id, edge.source);
            return None;
        };
        let Some(to) = destination.view.anchor_waypoints_along(&edge.destination_segment) else {
            warn!(
                "[OVERLAY] {} lands on {} which has no matching crossover (missing reverse edge?)",
                edge.id, edge.destination
            );
            return None;
        };
        if from.is_empty() || to.is_empty() {
            return None;
        }
        if from.len() != to.len() {
            warn!(
                "[OVERLAY] {} anchors disagree ({} vs {} waypoints); segments differ in length?",
                edge.id,
                from.len(),
                to.len()
            );
            return None;
        }

        let source_graph = source.view.visibility_graph();
        let destination_graph = destination.view.visibility_graph();
        let pairs = from
            .iter()
            .zip(to.iter())
            .filter_map(|(&a, &b)| {
                let a = source_graph.try_index_of(a)?;
                let b = destination_graph.try_index_of(b)?;
                Some((source.waypoint_offset + a, destination.waypoint_offset + b))
            })
            .collect();

        Some(CrossoverLink {
            edge: edge.id,
            source: edge.source,
            destination: edge.destination,
            pairs,
        })
    }

    pub fn agent_radius(&self) -> f64 {
        self.agent_radius
    }

    pub fn nodes(&self) -> &[TerrainOverlayNetworkNode] {
        &self.nodes
    }

    pub fn node(&self, sector: SectorNodeId) -> Option<&TerrainOverlayNetworkNode> {
        self.node_index.get(&sector).map(|&i| &self.nodes[i])
    }

    pub fn crossover_links(&self) -> &[CrossoverLink] {
        &self.links
    }

    pub fn waypoint_count(&self) -> usize {
        self.waypoint_count
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// First sector (in description order) whose triangulation contains the
    /// world point.
    pub fn localize(&self, world: DVec2) -> Option<LocalizedPoint> {
        self.nodes.iter().find_map(|node| {
            let local = node.description.world_to_local(world);
            if !node.description.static_metadata.local_boundary.contains(local) {
                return None;
            }
            node.view
                .triangulation()
                .try_intersect(local)
                .map(|location| LocalizedPoint {
                    sector: node.description.id,
                    world,
                    local,
                    location,
                })
        })
    }

    /// [`localize`](Self::localize) for points that may sit in a hole or
    /// outside every sector: falls back to the closest punched-land point
    /// (by world distance) over all sectors.
    pub fn find_nearest_land_point(&self, world: DVec2) -> Option<LocalizedPoint> {
        if let Some(hit) = self.localize(world) {
            return Some(hit);
        }
        let mut candidates: Vec<(f64, &TerrainOverlayNetworkNode, DVec2)> = self
            .nodes
            .iter()
            .filter_map(|node| {
                let local = node.description.world_to_local(world);
                let snapped = node.view.punched_land().find_nearest_land_point(local)?;
                let distance = node.description.local_to_world(snapped).distance_squared(world);
                Some((distance, node, snapped))
            })
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        candidates.into_iter().find_map(|(_, node, local)| {
            node.view
                .triangulation()
                .try_intersect(local)
                .map(|location| LocalizedPoint {
                    sector: node.description.id,
                    world: node.description.local_to_world(local),
                    local,
                    location,
                })
        })
    }

    /// Field of view from a sector-local point, in that sector's local space.
    pub fn visibility_polygon(&self, sector: SectorNodeId, origin: DVec2) -> Option<VisibilityPolygon> {
        self.node(sector)?.view.visibility_polygon(origin)
    }

    pub fn is_visible(&self, sector: SectorNodeId, p: IVec2, q: IVec2) -> bool {
        self.node(sector).is_some_and(|node| node.view.is_visible(p, q))
    }

    pub fn raycast(&self, sector: SectorNodeId, p: IVec2, q: IVec2) -> Option<DVec2> {
        self.node(sector)?.view.raycast(p, q)
    }

    pub fn shortest_path_cost(&self, start: SectorLocalPoint, goal: SectorLocalPoint) -> Option<f64> {
        self.shortest_path(start, goal).map(|path| path.cost)
    }

    /// Cheapest route between two sector-local points.
    ///
    /// # Algorithm
    /// Sources are the waypoints visible from `start`, seeded with their
    /// distance; destinations those visible from `goal`. One Dijkstra runs over
    /// the stitched graph (local edges plus 0-cost crossover links) and the
    /// best destination is the one minimizing `distance + |goal - waypoint|`.
    /// A direct sight line within one sector competes with that.
    pub fn shortest_path(&self, start: SectorLocalPoint, goal: SectorLocalPoint) -> Option<OverlayPath> {
        let start_node = self.node(start.sector)?;
        let goal_node = self.node(goal.sector)?;

        let start_land = start_node.view.punched_land();
        let goal_land = goal_node.view.punched_land();
        if !start_land.contains_point(start.position.as_dvec2()) || !goal_land.contains_point(goal.position.as_dvec2()) {
            return None;
        }

        let direct = (start.sector == goal.sector && start_node.view.is_visible(start.position, goal.position))
            .then(|| (goal.position - start.position).as_dvec2().length());

        let sources: Vec<(usize, f64)> = start_node
            .view
            .visible_waypoints(start.position)
            .into_iter()
            .map(|(i, cost)| (start_node.waypoint_offset + i, cost))
            .collect();
        let tails: Vec<(usize, f64)> = goal_node
            .view
            .visible_waypoints(goal.position)
            .into_iter()
            .map(|(i, cost)| (goal_node.waypoint_offset + i, cost))
            .collect();

        let mut destinations = FixedBitSet::with_capacity(self.waypoint_count);
        for &(g, _) in &tails {
            destinations.insert(g);
        }

        let result = multi_source_dijkstra(self.waypoint_count, &sources, Some(&destinations), |g| {
            self.stitched_neighbors(g)
        });

        let via_graph = tails
            .iter()
            .filter_map(|&(g, tail)| result.distance(g).map(|d| (g, d + tail)))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match (direct, via_graph) {
            (Some(cost), Some((_, graph_cost))) if cost <= graph_cost => Some(OverlayPath {
                cost,
                points: vec![start, goal],
            }),
            (Some(cost), None) => Some(OverlayPath {
                cost,
                points: vec![start, goal],
            }),
            (_, Some((last, cost))) => {
                let mut points = vec![start];
                let mut chain = vec![last];
                let mut current = last;
                while result.predecessors[current] != NO_PREDECESSOR {
                    current = result.predecessors[current];
                    chain.push(current);
                }
                points.extend(chain.into_iter().rev().map(|g| self.waypoint_point(g)));
                points.push(goal);
                Some(OverlayPath { cost, points })
            }
            (None, None) => None,
        }
    }

    /// Local visibility edges plus outgoing crossover jumps of global
    /// waypoint `g`.
    fn stitched_neighbors(&self, g: usize) -> SmallVec<[(usize, f64); 16]> {
        let node = self.node_of_waypoint(g);
        let graph = node.view.visibility_graph();
        let mut neighbors: SmallVec<[(usize, f64); 16]> = graph
            .neighbors(g - node.waypoint_offset)
            .iter()
            .map(|&(n, cost)| (node.waypoint_offset + n, cost))
            .collect();
        if let Some(targets) = self.link_targets.get(&g) {
            neighbors.extend(targets.iter().map(|&t| (t, 0.0)));
        }
        neighbors
    }

    fn node_of_waypoint(&self, g: usize) -> &TerrainOverlayNetworkNode {
        let i = self.nodes.partition_point(|n| n.waypoint_offset <= g);
        &self.nodes[i - 1]
    }

    fn waypoint_point(&self, g: usize) -> SectorLocalPoint {
        let node = self.node_of_waypoint(g);
        SectorLocalPoint {
            sector: node.description.id,
            position: node.view.visibility_graph().waypoint(g - node.waypoint_offset),
        }
    }
}
