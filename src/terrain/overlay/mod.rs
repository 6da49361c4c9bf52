//! Cross-sector traversal graphs, one per agent radius.

mod manager;
mod network;


pub use manager::TerrainOverlayNetworkManager;
pub use network::{
    CrossoverLink, LocalizedPoint, OverlayPath, SectorLocalPoint, TerrainOverlayNetwork,
    TerrainOverlayNetworkNode,
};
