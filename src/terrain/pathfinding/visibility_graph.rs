use bevy::log::debug;
use bevy::math::IVec2;
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use terragami_macros::profile;

use super::dijkstra::{multi_source_dijkstra, DijkstraResult};
use crate::terrain::geometry::PolygonTree;

/// Waypoints of one punched-land tree joined wherever they see each other.
///
/// Edge costs are Euclidean lengths and every edge is stored in both
/// directions. Waypoints are unique; adding an existing point returns its
/// index.
#[derive(Clone, Debug, Default)]
pub struct VisibilityGraph {
    waypoints: Vec<IVec2>,
    lookup: FxHashMap<IVec2, usize>,
    adjacency: Vec<SmallVec<[(usize, f64); 8]>>,
}

impl VisibilityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// All contour vertices of `land` plus `extra_waypoints`, connected by
    /// every unobstructed pair.
    ///
    /// # Performance
    /// O(n² · e) for n waypoints and e boundary edges.
    #[profile(2)]
    pub fn build(land: &PolygonTree, extra_waypoints: impl IntoIterator<Item = IVec2>) -> Self {
        let mut graph = Self::new();
        for contour in land.contours() {
            for &p in &contour.points {
                graph.add_waypoint(p);
            }
        }
        for p in extra_waypoints {
            graph.add_waypoint(p);
        }

        let n = graph.waypoints.len();
        for i in 0..n {
            for j in (i + 1)..n {
                if land.is_segment_unobstructed(graph.waypoints[i], graph.waypoints[j]) {
                    graph.add_edge(i, j);
                }
            }
        }

        debug!(
            "[VISIBILITY] {} waypoints, {} edges",
            graph.len(),
            graph.edge_count()
        );
        graph
    }

    pub fn add_waypoint(&mut self, p: IVec2) -> usize {
        if let Some(&index) = self.lookup.get(&p) {
            return index;
        }
        let index = self.waypoints.len();
        self.waypoints.push(p);
        self.adjacency.push(SmallVec::new());
        self.lookup.insert(p, index);
        index
    }

    /// Join `a` and `b` in both directions. Self-loops and repeats are ignored.
    pub fn add_edge(&mut self, a: usize, b: usize) {
        if a == b || self.adjacency[a].iter().any(|&(n, _)| n == b) {
            return;
        }
        let cost = (self.waypoints[b] - self.waypoints[a]).as_dvec2().length();
        self.adjacency[a].push((b, cost));
        self.adjacency[b].push((a, cost));
    }

    #[inline]
    pub fn neighbors(&self, index: usize) -> &[(usize, f64)] {
        &self.adjacency[index]
    }

    pub fn try_index_of(&self, p: IVec2) -> Option<usize> {
        self.lookup.get(&p).copied()
    }

    #[inline]
    pub fn waypoint(&self, index: usize) -> IVec2 {
        self.waypoints[index]
    }

    pub fn waypoints(&self) -> &[IVec2] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Undirected edge count.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(|a| a.len()).sum::<usize>() / 2
    }

    /// Waypoints visible from an arbitrary point, with the distance to each.
    pub fn visible_from(&self, land: &PolygonTree, p: IVec2) -> Vec<(usize, f64)> {
        self.waypoints
            .iter()
            .enumerate()
            .filter(|&(_, &w)| land.is_segment_unobstructed(p, w))
            .map(|(i, &w)| (i, (w - p).as_dvec2().length()))
            .collect()
    }

    /// Multi-source search restricted to this graph.
    pub fn dijkstra(&self, sources: &[(usize, f64)], destinations: Option<&FixedBitSet>) -> DijkstraResult {
        multi_source_dijkstra(self.len(), sources, destinations, |i| {
            self.adjacency[i].iter().copied()
        })
    }
}
