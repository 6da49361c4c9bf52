use bevy::log::debug;
use bevy::math::{DVec2, IVec2};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use super::job::LocalGeometryJob;
use crate::terrain::config::TerrainConfig;
use crate::terrain::geometry::clipping::{punch_land, LandShape};
use crate::terrain::geometry::{IntLineSegment2, PolygonTree, VisibilityPolygon};
use crate::terrain::math::{radius_key, FixedNum};
use crate::terrain::pathfinding::VisibilityGraph;
use crate::terrain::triangulation::{triangulate_root, Triangulation};

/// Where an agent of the view's radius enters or leaves a sector through one
/// crossover segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrossoverAnchor {
    /// Canonical segment.
    pub segment: IntLineSegment2,
    /// From `segment.first` to `segment.second`. Empty when the opening is
    /// impassable at this radius.
    pub waypoints: SmallVec<[IVec2; 3]>,
}

impl CrossoverAnchor {
    pub fn is_passable(&self) -> bool {
        !self.waypoints.is_empty()
    }
}

/// Compiled geometry of one job for one agent radius.
///
/// The punched land and anchors are computed eagerly; the triangulation and
/// visibility graph on first use.
#[derive(Debug)]
pub struct LocalGeometryView {
    radius: f64,
    punched_land: PolygonTree,
    crossover_anchors: Vec<CrossoverAnchor>,
    config: Arc<TerrainConfig>,
    triangulation: OnceLock<Triangulation>,
    visibility_graph: OnceLock<VisibilityGraph>,
}

impl LocalGeometryView {
    pub fn build(job: &LocalGeometryJob, radius: f64, config: Arc<TerrainConfig>) -> Self {
        let metadata = job.static_metadata();
        let shape = LandShape {
            included: &metadata.local_included_contours,
            excluded: &metadata.local_excluded_contours,
            temporary_holes: job.temporary_hole_contours(),
            crossovers: job.crossover_segments(),
        };
        let punched_land = punch_land(&shape, radius, &config);

        let crossover_anchors = job
            .crossover_segments()
            .iter()
            .map(|segment| CrossoverAnchor {
                segment: *segment,
                waypoints: anchor_waypoints(segment, radius, config.crossover_midpoint_waypoints, &punched_land),
            })
            .collect();

        Self {
            radius,
            punched_land,
            crossover_anchors,
            config,
            triangulation: OnceLock::new(),
            visibility_graph: OnceLock::new(),
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn punched_land(&self) -> &PolygonTree {
        &self.punched_land
    }

    pub fn crossover_anchors(&self) -> &[CrossoverAnchor] {
        &self.crossover_anchors
    }

    pub fn triangulation(&self) -> &Triangulation {
        self.triangulation
            .get_or_init(|| triangulate_root(&self.punched_land, &self.config))
    }

    /// Punched-land vertices and every passable anchor waypoint.
    pub fn visibility_graph(&self) -> &VisibilityGraph {
        self.visibility_graph.get_or_init(|| {
            let anchors = self
                .crossover_anchors
                .iter()
                .flat_map(|a| a.waypoints.iter().copied());
            VisibilityGraph::build(&self.punched_land, anchors)
        })
    }

    pub fn is_visible(&self, p: IVec2, q: IVec2) -> bool {
        self.punched_land.is_segment_unobstructed(p, q)
    }

    pub fn raycast(&self, p: IVec2, q: IVec2) -> Option<DVec2> {
        self.punched_land.try_find_first_obstruction(p, q)
    }

    pub fn visibility_polygon(&self, origin: DVec2) -> Option<VisibilityPolygon> {
        VisibilityPolygon::compute(&self.punched_land, origin)
    }

    /// Graph waypoints in sight of `p`; empty if `p` itself isn't walkable.
    pub fn visible_waypoints(&self, p: IVec2) -> Vec<(usize, f64)> {
        if !self.punched_land.contains_point(p.as_dvec2()) {
            return Vec::new();
        }
        self.visibility_graph().visible_from(&self.punched_land, p)
    }

    /// Anchor for `segment` in either direction. The flag is true when
    /// `segment` runs opposite to the anchor's waypoint order.
    pub fn find_crossover_anchor(&self, segment: &IntLineSegment2) -> Option<(&CrossoverAnchor, bool)> {
        let canonical = segment.canonical();
        let reversed = canonical != *segment;
        self.crossover_anchors
            .binary_search_by(|a| a.segment.cmp(&canonical))
            .ok()
            .map(|i| (&self.crossover_anchors[i], reversed))
    }

    /// Anchor waypoints ordered from `segment.first` to `segment.second`.
    pub fn anchor_waypoints_along(&self, segment: &IntLineSegment2) -> Option<SmallVec<[IVec2; 3]>> {
        let (anchor, reversed) = self.find_crossover_anchor(segment)?;
        let mut waypoints = anchor.waypoints.clone();
        if reversed {
            waypoints.reverse();
        }
        Some(waypoints)
    }
}

/// Endpoints pulled in by `radius`, plus the midpoint if requested, each
/// snapped to a walkable lattice point. Empty if the agent doesn't fit or a
/// waypoint has no walkable lattice point nearby.
fn anchor_waypoints(
    segment: &IntLineSegment2,
    radius: f64,
    include_midpoint: bool,
    land: &PolygonTree,
) -> SmallVec<[IVec2; 3]> {
    let length = segment.length();
    if length <= 2.0 * radius {
        return SmallVec::new();
    }
    let first = segment.first.as_dvec2();
    let direction = (segment.second.as_dvec2() - first) / length;

    let mut targets: SmallVec<[DVec2; 3]> = SmallVec::new();
    targets.push(first + direction * radius);
    if include_midpoint {
        targets.push(segment.midpoint());
    }
    targets.push(first + direction * (length - radius));

    let mut waypoints: SmallVec<[IVec2; 3]> = SmallVec::new();
    for target in targets {
        let Some(waypoint) = snap_to_land(target, land) else {
            return SmallVec::new();
        };
        waypoints.push(waypoint);
    }
    waypoints.dedup();
    waypoints
}

/// Lattice point closest to `target` that lies in `land`, searched over the
/// 3×3 neighbourhood of the rounded target.
///
/// Off-axis segments pass between lattice points, so rounding alone can land
/// on the wrong side of the boundary. Any such point lies within
/// `ANCHOR_SNAP_MARGIN` of the segment, which the crossover strip covers.
fn snap_to_land(target: DVec2, land: &PolygonTree) -> Option<IVec2> {
    let rounded = target.round().as_ivec2();
    if land.contains_point(rounded.as_dvec2()) {
        return Some(rounded);
    }
    (-1..=1)
        .flat_map(|dy| (-1..=1).map(move |dx| rounded + IVec2::new(dx, dy)))
        .filter(|p| land.contains_point(p.as_dvec2()))
        .min_by(|a, b| {
            let da = a.as_dvec2().distance_squared(target);
            let db = b.as_dvec2().distance_squared(target);
            da.total_cmp(&db)
        })
}

/// Per-job cache of [`LocalGeometryView`]s, one per quantized agent radius.
#[derive(Debug)]
pub struct LocalGeometryViewManager {
    job: LocalGeometryJob,
    config: Arc<TerrainConfig>,
    views: Mutex<BTreeMap<FixedNum, Arc<LocalGeometryView>>>,
}

impl LocalGeometryViewManager {
    pub fn new(job: LocalGeometryJob, config: Arc<TerrainConfig>) -> Self {
        Self {
            job,
            config,
            views: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn job(&self) -> &LocalGeometryJob {
        &self.job
    }

    /// View for `agent_radius`, computed at most once per quantized radius.
    pub fn get_or_compute_view(&self, agent_radius: f64) -> Arc<LocalGeometryView> {
        let key = radius_key(agent_radius);
        let mut views = self.views.lock().unwrap_or_else(PoisonError::into_inner);
        views
            .entry(key)
            .or_insert_with(|| {
                debug!(
                    "[TERRAIN] Computing local geometry view (radius {}, {} crossovers, {} holes)",
                    key,
                    self.job.crossover_segments().len(),
                    self.job.temporary_hole_contours().len()
                );
                Arc::new(LocalGeometryView::build(&self.job, key.to_num::<f64>(), self.config.clone()))
            })
            .clone()
    }

    pub fn cached_view_count(&self) -> usize {
        self.views.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
