use thiserror::Error;

use super::geometry::IntLineSegment2;
use super::snapshot::{SectorEdgeId, SectorNodeId, TemporaryHoleId};

/// Recoverable failures at the edges of the pipeline: store mutations and
/// config loading.
///
/// Broken geometry discovered *during* a compile (inconsistent triangle
/// topology, wrong polygon-tree node kinds, parallel intersection queries) is
/// not represented here. Those abort the compile with a panic so that no
/// snapshot built from corrupt adjacency is ever published.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("unknown sector {0}")]
    UnknownSector(SectorNodeId),

    #[error("unknown sector edge {0}")]
    UnknownEdge(SectorEdgeId),

    #[error("unknown temporary hole {0}")]
    UnknownTemporaryHole(TemporaryHoleId),

    #[error("contour needs at least 3 distinct points with non-zero area (got {points} points)")]
    DegenerateContour { points: usize },

    #[error("crossover segment {0:?} has zero length")]
    DegenerateSegment(IntLineSegment2),

    #[error("failed to read terrain config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse terrain config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),
}
