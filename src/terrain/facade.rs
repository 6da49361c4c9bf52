use bevy::prelude::*;
use std::sync::Arc;

use super::config::TerrainConfig;
use super::snapshot::{SectorGraphDescriptionStore, TerrainSnapshot, TerrainSnapshotCompiler};

/// Mutable sector graph plus the compiler that turns it into snapshots.
///
/// Readers hold on to the `Arc<TerrainSnapshot>` they got; later mutations and
/// compiles never touch it.
#[derive(Resource)]
pub struct TerrainFacade {
    store: SectorGraphDescriptionStore,
    compiler: TerrainSnapshotCompiler,
}

impl TerrainFacade {
    pub fn new(config: TerrainConfig) -> Self {
        Self {
            store: SectorGraphDescriptionStore::new(),
            compiler: TerrainSnapshotCompiler::new(config),
        }
    }

    pub fn store(&self) -> &SectorGraphDescriptionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SectorGraphDescriptionStore {
        &mut self.store
    }

    pub fn compiler(&self) -> &TerrainSnapshotCompiler {
        &self.compiler
    }

    /// Snapshot of the store's current version, reusing the previous one if
    /// nothing changed.
    pub fn compile_snapshot(&mut self) -> Arc<TerrainSnapshot> {
        self.compiler.compile_snapshot(&self.store)
    }
}
