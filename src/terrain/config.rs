use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::TerrainError;

/// How dilated holes and eroded land meet at convex corners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DilationJoin {
    /// Sharp corners, clamped by `miter_limit`. Keeps contours small.
    #[default]
    Miter,
    /// Arc-approximated corners. Tighter fit, many more waypoints.
    Round,
    /// Corners cut square at distance `radius`.
    Square,
}

/// Tuning for the terrain compile pipeline.
///
/// Loaded once at startup. Changing these between compiles does not invalidate
/// cached view managers, so treat the config as fixed for the lifetime of a
/// [`TerrainSnapshotCompiler`](super::snapshot::TerrainSnapshotCompiler).
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Check winding and adjacency symmetry on every produced triangle.
    /// Topology failures that prevent adjacency from being built at all are
    /// fatal regardless of this flag.
    pub validate_triangulation: bool,
    /// Run Lawson flips after ear clipping so islands are constrained Delaunay.
    pub delaunay_refinement: bool,
    /// Upper bound on full flip passes per land node.
    pub max_delaunay_flip_passes: usize,
    pub dilation_join: DilationJoin,
    pub miter_limit: f64,
    /// Add the midpoint of each crossover segment as a third anchor waypoint.
    pub crossover_midpoint_waypoints: bool,
    /// Emit per-compile job reuse statistics at info level.
    pub log_compile_stats: bool,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            validate_triangulation: true,
            delaunay_refinement: true,
            max_delaunay_flip_passes: 64,
            dilation_join: DilationJoin::Miter,
            miter_limit: 2.0,
            crossover_midpoint_waypoints: true,
            log_compile_stats: true,
        }
    }
}

impl TerrainConfig {
    pub fn from_ron_str(contents: &str) -> Result<Self, TerrainError> {
        Ok(ron::from_str::<TerrainConfig>(contents)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TerrainError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| TerrainError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&contents)
    }

    /// Load the config, logging and falling back to defaults on any failure.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded terrain config from {}", path.display());
                config
            }
            Err(e) => {
                error!("Failed to load terrain config: {}", e);
                error!("Using default TerrainConfig");
                Self::default()
            }
        }
    }
}
