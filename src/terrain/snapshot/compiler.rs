use bevy::log::{debug, info};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use terragami_macros::profile;

use super::descriptions::{
    SectorEdgeDescription, SectorNodeDescription, SectorNodeId, TemporaryHoleDescription,
};
use super::job::LocalGeometryJob;
use super::store::SectorGraphDescriptionStore;
use super::view_manager::LocalGeometryViewManager;
use crate::terrain::config::TerrainConfig;
use crate::terrain::overlay::TerrainOverlayNetworkManager;

/// Immutable result of one compile, stamped with the store and version it was
/// built from.
#[derive(Debug)]
pub struct TerrainSnapshot {
    /// [`SectorGraphDescriptionStore::instance_id`] of the source store.
    pub store_id: u64,
    pub version: u64,
    pub node_descriptions: Vec<Arc<SectorNodeDescription>>,
    pub edge_descriptions: Vec<Arc<SectorEdgeDescription>>,
    pub temporary_holes: Vec<Arc<TemporaryHoleDescription>>,
    pub overlay_network_manager: TerrainOverlayNetworkManager,
}

/// Reuse counts from the most recent compile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub sectors: usize,
    pub distinct_jobs: usize,
    pub reused_managers: usize,
    pub created_managers: usize,
}

/// Turns store contents into [`TerrainSnapshot`]s, reusing per-sector
/// geometry whose inputs did not change.
#[derive(Debug)]
pub struct TerrainSnapshotCompiler {
    config: Arc<TerrainConfig>,
    cached_snapshot: Option<Arc<TerrainSnapshot>>,
    view_managers: FxHashMap<LocalGeometryJob, Arc<LocalGeometryViewManager>>,
    last_stats: CompileStats,
}

impl TerrainSnapshotCompiler {
    pub fn new(config: impl Into<Arc<TerrainConfig>>) -> Self {
        Self {
            config: config.into(),
            cached_snapshot: None,
            view_managers: FxHashMap::default(),
            last_stats: CompileStats::default(),
        }
    }

    pub fn config(&self) -> &Arc<TerrainConfig> {
        &self.config
    }

    /// Forget the cached snapshot so the next compile runs in full. View
    /// managers are kept.
    pub fn invalidate_caches(&mut self) {
        self.cached_snapshot = None;
    }

    pub fn last_stats(&self) -> CompileStats {
        self.last_stats
    }

    /// Snapshot of the store's current version.
    ///
    /// The cached snapshot is reused only for the same store at the same
    /// version. Feeding a different store recompiles, though view managers
    /// are still shared wherever jobs are structurally equal.
    ///
    /// # Algorithm
    /// 1. Group edges and temporary holes by the sector they affect.
    /// 2. Fold each sector's contributions into its render job.
    /// 3. Look every preview job (static geometry only) and render job up in
    ///    the previous compile's managers; a render job equal to its preview
    ///    shares the preview's manager.
    /// 4. Replace the manager cache with exactly this compile's jobs.
    #[profile(5)]
    pub fn compile_snapshot(&mut self, store: &SectorGraphDescriptionStore) -> Arc<TerrainSnapshot> {
        if let Some(snapshot) = &self.cached_snapshot {
            if snapshot.store_id == store.instance_id() && snapshot.version == store.version() {
                return snapshot.clone();
            }
        }

        let node_descriptions: Vec<_> = store.enumerate_sector_node_descriptions().cloned().collect();
        let edge_descriptions: Vec<_> = store.enumerate_sector_edge_descriptions().cloned().collect();
        let temporary_holes: Vec<_> = store.enumerate_temporary_hole_descriptions().cloned().collect();

        // ====================================================================
        // Plan jobs
        // ====================================================================
        let mut edges_by_source: BTreeMap<SectorNodeId, Vec<&SectorEdgeDescription>> = BTreeMap::new();
        for edge in &edge_descriptions {
            edges_by_source.entry(edge.source).or_default().push(edge);
        }
        let mut holes_by_sector: BTreeMap<SectorNodeId, Vec<&TemporaryHoleDescription>> = BTreeMap::new();
        for hole in &temporary_holes {
            holes_by_sector.entry(hole.sector).or_default().push(hole);
        }

        let render_jobs: Vec<(SectorNodeId, LocalGeometryJob)> = node_descriptions
            .iter()
            .map(|node| {
                let job = LocalGeometryJob::plan(
                    node.static_metadata.clone(),
                    edges_by_source.get(&node.id).into_iter().flatten().copied(),
                    holes_by_sector.get(&node.id).into_iter().flatten().copied(),
                );
                (node.id, job)
            })
            .collect();

        // ====================================================================
        // Jobs -> view managers
        // ====================================================================
        let mut stats = CompileStats {
            sectors: node_descriptions.len(),
            ..CompileStats::default()
        };
        let mut previous = std::mem::take(&mut self.view_managers);
        let mut current: FxHashMap<LocalGeometryJob, Arc<LocalGeometryViewManager>> = FxHashMap::default();
        let config = self.config.clone();

        let mut resolve = |job: &LocalGeometryJob,
                           current: &mut FxHashMap<LocalGeometryJob, Arc<LocalGeometryViewManager>>|
         -> Arc<LocalGeometryViewManager> {
            if let Some(manager) = current.get(job) {
                return manager.clone();
            }
            let manager = match previous.remove(job) {
                Some(manager) => {
                    stats.reused_managers += 1;
                    manager
                }
                None => {
                    stats.created_managers += 1;
                    Arc::new(LocalGeometryViewManager::new(job.clone(), config.clone()))
                }
            };
            current.insert(job.clone(), manager.clone());
            manager
        };

        // Previews first so an identical render job lands on the same manager.
        for (_, job) in &render_jobs {
            resolve(&job.preview_job(), &mut current);
        }
        let managers_by_sector: BTreeMap<SectorNodeId, Arc<LocalGeometryViewManager>> = render_jobs
            .iter()
            .map(|(sector, job)| (*sector, resolve(job, &mut current)))
            .collect();

        stats.distinct_jobs = current.len();
        self.view_managers = current;
        self.last_stats = stats;

        if self.config.log_compile_stats {
            info!(
                "[TERRAIN] Compiled snapshot v{}: {} sectors, {} jobs ({} reused, {} new)",
                store.version(),
                stats.sectors,
                stats.distinct_jobs,
                stats.reused_managers,
                stats.created_managers
            );
        } else {
            debug!("[TERRAIN] Compiled snapshot v{}", store.version());
        }

        // ====================================================================
        // Publish
        // ====================================================================
        let overlay_network_manager = TerrainOverlayNetworkManager::new(
            node_descriptions.clone(),
            edge_descriptions.clone(),
            managers_by_sector,
        );
        let snapshot = Arc::new(TerrainSnapshot {
            store_id: store.instance_id(),
            version: store.version(),
            node_descriptions,
            edge_descriptions,
            temporary_holes,
            overlay_network_manager,
        });
        self.cached_snapshot = Some(snapshot.clone());
        snapshot
    }
}
