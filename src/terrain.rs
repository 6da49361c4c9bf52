use bevy::prelude::*;

pub mod config;
pub mod error;
pub mod math;
pub mod geometry;
pub mod triangulation;
pub mod pathfinding;
pub mod snapshot;
pub mod overlay;
mod facade;

pub use config::TerrainConfig;
pub use error::TerrainError;
pub use facade::TerrainFacade;

/// Default location of the terrain tuning file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "assets/terrain_config.ron";

/// Registers the terrain compilation pipeline as bevy resources.
///
/// Inserts the loaded [`TerrainConfig`] and a [`TerrainFacade`] (description
/// store + snapshot compiler). Consumers mutate the store through
/// `ResMut<TerrainFacade>` and pull snapshots with `compile_snapshot()`;
/// nothing here runs on a schedule.
pub struct TerrainPlugin {
    /// Where to read the RON config from. `None` uses the built-in defaults.
    pub config_path: Option<String>,
}

impl Default for TerrainPlugin {
    fn default() -> Self {
        Self {
            config_path: Some(DEFAULT_CONFIG_PATH.to_string()),
        }
    }
}

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        let config = match &self.config_path {
            Some(path) => TerrainConfig::load_or_default(path),
            None => TerrainConfig::default(),
        };
        info!(
            "[TERRAIN] Plugin ready (validate_triangulation={}, dilation_join={:?})",
            config.validate_triangulation, config.dilation_join
        );
        app.insert_resource(TerrainFacade::new(config.clone()));
        app.insert_resource(config);
    }
}
