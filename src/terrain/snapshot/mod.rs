//! Sector descriptions, job planning and the incremental snapshot compiler.

mod compiler;
mod descriptions;
mod job;
mod store;
mod view_manager;

#[cfg(test)]
mod tests;

pub use compiler::{CompileStats, TerrainSnapshot, TerrainSnapshotCompiler};
pub use descriptions::{
    SectorEdgeDescription, SectorEdgeId, SectorNodeDescription, SectorNodeId, TemporaryHoleDescription,
    TemporaryHoleId, TerrainStaticMetadata,
};
pub use job::LocalGeometryJob;
pub use store::SectorGraphDescriptionStore;
pub use view_manager::{CrossoverAnchor, LocalGeometryView, LocalGeometryViewManager};
