pub mod terrain;
pub mod logging;

pub use terrain::{TerrainFacade, TerrainPlugin};
