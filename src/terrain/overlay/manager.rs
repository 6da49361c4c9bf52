use bevy::log::info;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use terragami_macros::profile;

use super::network::TerrainOverlayNetwork;
use crate::terrain::math::{radius_key, FixedNum};
use crate::terrain::snapshot::{
    LocalGeometryViewManager, SectorEdgeDescription, SectorNodeDescription, SectorNodeId,
};

/// All per-sector view managers of one snapshot, compiling stitched networks
/// on demand and memoizing them per agent radius.
#[derive(Debug)]
pub struct TerrainOverlayNetworkManager {
    node_descriptions: Vec<Arc<SectorNodeDescription>>,
    edge_descriptions: Vec<Arc<SectorEdgeDescription>>,
    view_managers: BTreeMap<SectorNodeId, Arc<LocalGeometryViewManager>>,
    networks: Mutex<BTreeMap<FixedNum, Arc<TerrainOverlayNetwork>>>,
}

impl TerrainOverlayNetworkManager {
    pub fn new(
        node_descriptions: Vec<Arc<SectorNodeDescription>>,
        edge_descriptions: Vec<Arc<SectorEdgeDescription>>,
        view_managers: BTreeMap<SectorNodeId, Arc<LocalGeometryViewManager>>,
    ) -> Self {
        Self {
            node_descriptions,
            edge_descriptions,
            view_managers,
            networks: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn view_manager(&self, sector: SectorNodeId) -> Option<&Arc<LocalGeometryViewManager>> {
        self.view_managers.get(&sector)
    }

    pub fn view_managers(&self) -> &BTreeMap<SectorNodeId, Arc<LocalGeometryViewManager>> {
        &self.view_managers
    }

    /// Network for `agent_radius`, compiled once per quantized radius.
    #[profile(5)]
    pub fn compile_terrain_overlay_network(&self, agent_radius: f64) -> Arc<TerrainOverlayNetwork> {
        let key = radius_key(agent_radius);
        let mut networks = self.networks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(network) = networks.get(&key) {
            return network.clone();
        }

        let network = Arc::new(TerrainOverlayNetwork::compile(
            key.to_num::<f64>(),
            &self.node_descriptions,
            &self.edge_descriptions,
            &self.view_managers,
        ));
        info!(
            "[OVERLAY] Compiled network for radius {} ({} waypoints, {} links)",
            key,
            network.waypoint_count(),
            network.crossover_links().len()
        );
        networks.insert(key, network.clone());
        network
    }

    pub fn cached_network_count(&self) -> usize {
        self.networks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
