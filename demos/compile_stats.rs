/// Builds a random grid of sectors, then applies a stream of temporary-hole
/// edits and prints how much geometry each recompile reuses.
use bevy::math::{DAffine2, DVec2, IVec2};
use std::sync::Arc;
use std::time::Instant;
use terragami::logging::setup_file_logging;
use terragami::terrain::geometry::{IntLineSegment2, Polygon2};
use terragami::terrain::overlay::SectorLocalPoint;
use terragami::terrain::snapshot::{SectorNodeId, TerrainStaticMetadata};
use terragami::terrain::{TerrainConfig, TerrainFacade};

const SECTOR_SIZE: i32 = 200;
const COLUMNS: usize = 6;
const ROWS: usize = 6;
const AGENT_RADIUS: f64 = 4.0;

/// Open sector with a couple of random rectangular obstacles.
fn random_metadata(rng: &mut fastrand::Rng) -> TerrainStaticMetadata {
    let mut metadata = TerrainStaticMetadata::open_rectangle(SECTOR_SIZE, SECTOR_SIZE);
    for _ in 0..rng.usize(0..3) {
        let x = rng.i32(40..140);
        let y = rng.i32(40..140);
        metadata = metadata.with_excluded(Polygon2::rectangle(x, y, rng.i32(10..30), rng.i32(10..30)));
    }
    metadata
}

fn main() {
    let log_file = match setup_file_logging("logs", 25) {
        Ok(path) => path.display().to_string(),
        Err(e) => {
            eprintln!("Could not set up file logging: {e}");
            return;
        }
    };
    println!("Logging to {log_file}");

    let mut rng = fastrand::Rng::with_seed(42);
    let mut facade = TerrainFacade::new(TerrainConfig::default());

    // A small palette so structurally equal sectors share geometry.
    let palette: Vec<Arc<TerrainStaticMetadata>> = (0..4).map(|_| Arc::new(random_metadata(&mut rng))).collect();

    let mut ids: Vec<SectorNodeId> = Vec::with_capacity(COLUMNS * ROWS);
    for row in 0..ROWS {
        for column in 0..COLUMNS {
            let offset = DVec2::new(column as f64, row as f64) * SECTOR_SIZE as f64;
            let metadata = palette[rng.usize(..palette.len())].clone();
            ids.push(facade.store_mut().add_sector(metadata, DAffine2::from_translation(offset)));
        }
    }
    let s = SECTOR_SIZE;
    for row in 0..ROWS {
        for column in 0..COLUMNS {
            let here = ids[row * COLUMNS + column];
            let store = facade.store_mut();
            if column + 1 < COLUMNS {
                store
                    .add_portal_pair(
                        here,
                        ids[row * COLUMNS + column + 1],
                        IntLineSegment2::from_coords(s, 60, s, 140),
                        IntLineSegment2::from_coords(0, 60, 0, 140),
                    )
                    .expect("grid neighbours exist");
            }
            if row + 1 < ROWS {
                store
                    .add_portal_pair(
                        here,
                        ids[(row + 1) * COLUMNS + column],
                        IntLineSegment2::from_coords(60, s, 140, s),
                        IntLineSegment2::from_coords(60, 0, 140, 0),
                    )
                    .expect("grid neighbours exist");
            }
        }
    }

    let start = Instant::now();
    let snapshot = facade.compile_snapshot();
    let network = snapshot.overlay_network_manager.compile_terrain_overlay_network(AGENT_RADIUS);
    println!(
        "Initial compile: {:?}, {:?}, {} waypoints",
        start.elapsed(),
        facade.compiler().last_stats(),
        network.waypoint_count()
    );

    let corner = SectorLocalPoint::new(ids[0], 20, 20);
    let far_corner = SectorLocalPoint::new(ids[ids.len() - 1], SECTOR_SIZE - 20, SECTOR_SIZE - 20);
    println!("Corner to corner: {:?}", network.shortest_path_cost(corner, far_corner));

    for edit in 0..10 {
        let sector = ids[rng.usize(..ids.len())];
        let at = IVec2::new(rng.i32(20..160), rng.i32(20..160));
        if let Err(e) = facade
            .store_mut()
            .add_temporary_hole(sector, Polygon2::rectangle(at.x, at.y, 15, 15))
        {
            eprintln!("Edit {edit} rejected: {e}");
            continue;
        }

        let start = Instant::now();
        let snapshot = facade.compile_snapshot();
        let network = snapshot.overlay_network_manager.compile_terrain_overlay_network(AGENT_RADIUS);
        println!(
            "Edit {:>2} in {}: {:?}, {:?}, corner to corner {:?}",
            edit,
            sector,
            start.elapsed(),
            facade.compiler().last_stats(),
            network.shortest_path_cost(corner, far_corner)
        );
    }
}
