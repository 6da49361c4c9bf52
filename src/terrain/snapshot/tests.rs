/// Tests for job canonicalization, the description store and incremental
/// snapshot compilation.
use super::*;
use crate::terrain::config::TerrainConfig;
use crate::terrain::error::TerrainError;
use crate::terrain::geometry::{IntLineSegment2, Polygon2};
use crate::terrain::math::IntRect2;
use bevy::math::{DAffine2, DVec2, IVec2};
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;

fn square_metadata() -> Arc<TerrainStaticMetadata> {
    Arc::new(TerrainStaticMetadata::open_rectangle(100, 100))
}

fn translation(x: f64, y: f64) -> DAffine2 {
    DAffine2::from_translation(DVec2::new(x, y))
}

/// Three 100×100 sectors in a row; returns the store and their ids.
fn row_of_sectors() -> (SectorGraphDescriptionStore, [SectorNodeId; 3]) {
    let mut store = SectorGraphDescriptionStore::new();
    let ids = [0.0, 100.0, 200.0].map(|x| store.add_sector(square_metadata(), translation(x, 0.0)));
    (store, ids)
}

fn connect(store: &mut SectorGraphDescriptionStore, left: SectorNodeId, right: SectorNodeId) {
    store
        .add_portal_pair(
            left,
            right,
            IntLineSegment2::from_coords(100, 20, 100, 80),
            IntLineSegment2::from_coords(0, 20, 0, 80),
        )
        .expect("both sectors exist");
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = rustc_hash::FxBuildHasher.build_hasher();
    value.hash(&mut hasher);
    hasher.finish()
}

fn manager_of(snapshot: &TerrainSnapshot, sector: SectorNodeId) -> Arc<LocalGeometryViewManager> {
    snapshot
        .overlay_network_manager
        .view_manager(sector)
        .expect("every sector has a manager")
        .clone()
}

#[test]
fn test_job_key_is_set_equality() {
    let a = IntLineSegment2::from_coords(0, 0, 0, 10);
    let b = IntLineSegment2::from_coords(10, 0, 10, 10);
    let hole = Polygon2::rectangle(4, 4, 2, 2);

    let forward = LocalGeometryJob::new(square_metadata(), [a, b], [hole.clone()]);
    let shuffled = LocalGeometryJob::new(square_metadata(), [b.reversed(), a, a], [hole.clone(), hole]);
    assert_eq!(forward, shuffled);
    assert_eq!(hash_of(&forward), hash_of(&shuffled));
    assert_eq!(forward.crossover_segments().len(), 2);

    let other = LocalGeometryJob::new(square_metadata(), [a], Vec::<Polygon2>::new());
    assert_ne!(forward, other);
    assert!(LocalGeometryJob::preview(square_metadata()).is_preview());
    assert_eq!(forward.preview_job(), LocalGeometryJob::preview(square_metadata()));
}

#[test]
fn test_store_rejects_bad_mutations() {
    let (mut store, [a, _, _]) = row_of_sectors();
    let version = store.version();
    let missing = SectorNodeId(999);
    let segment = IntLineSegment2::from_coords(0, 0, 0, 10);

    assert!(matches!(
        store.add_edge(a, missing, segment, segment),
        Err(TerrainError::UnknownSector(id)) if id == missing
    ));
    assert!(matches!(
        store.add_edge(a, a, IntLineSegment2::from_coords(1, 1, 1, 1), segment),
        Err(TerrainError::DegenerateSegment(_))
    ));
    assert!(matches!(
        store.add_temporary_hole(a, Polygon2::new(vec![IVec2::ZERO, IVec2::new(5, 5)])),
        Err(TerrainError::DegenerateContour { points: 2 })
    ));
    assert!(matches!(
        store.remove_temporary_hole(TemporaryHoleId(42)),
        Err(TerrainError::UnknownTemporaryHole(_))
    ));
    assert!(store.remove_edge(SectorEdgeId(42)).is_err());
    assert_eq!(store.version(), version, "failed mutations leave the version alone");
}

#[test]
fn test_store_versions_and_cascading_removal() {
    let (mut store, [a, b, c]) = row_of_sectors();
    assert_eq!(store.version(), 3);
    connect(&mut store, a, b);
    connect(&mut store, b, c);
    store
        .add_temporary_hole(b, Polygon2::rectangle(40, 40, 10, 10))
        .expect("sector exists");
    assert_eq!(store.version(), 8);
    assert_eq!(store.enumerate_sector_edge_descriptions().count(), 4);

    store.remove_sector(b).expect("sector exists");
    assert_eq!(store.enumerate_sector_node_descriptions().count(), 2);
    assert_eq!(store.enumerate_sector_edge_descriptions().count(), 0);
    assert_eq!(store.enumerate_temporary_hole_descriptions().count(), 0);
    assert!(store.sector(b).is_none());
    assert_eq!(store.version(), 9);
}

#[test]
fn test_compile_is_idempotent() {
    let (mut store, [a, b, _]) = row_of_sectors();
    connect(&mut store, a, b);
    let mut compiler = TerrainSnapshotCompiler::new(TerrainConfig::default());

    let first = compiler.compile_snapshot(&store);
    let second = compiler.compile_snapshot(&store);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.version, store.version());
    assert_eq!(first.node_descriptions.len(), 3);
    assert_eq!(first.edge_descriptions.len(), 2);
}

#[test]
fn test_unchanged_sector_keeps_its_manager() {
    let (mut store, [a, b, c]) = row_of_sectors();
    connect(&mut store, a, b);
    let mut compiler = TerrainSnapshotCompiler::new(TerrainConfig::default());
    let before = compiler.compile_snapshot(&store);

    connect(&mut store, b, c);
    let after = compiler.compile_snapshot(&store);

    assert!(!Arc::ptr_eq(&before, &after));
    assert!(Arc::ptr_eq(&manager_of(&before, a), &manager_of(&after, a)), "a's crossovers did not change");
    assert!(!Arc::ptr_eq(&manager_of(&before, b), &manager_of(&after, b)));
    assert!(!Arc::ptr_eq(&manager_of(&before, c), &manager_of(&after, c)));
    assert_eq!(manager_of(&after, b).job().crossover_segments().len(), 2);
}

#[test]
fn test_structurally_equal_sectors_share_a_manager() {
    let (store, [a, b, c]) = row_of_sectors();
    let mut compiler = TerrainSnapshotCompiler::new(TerrainConfig::default());
    let snapshot = compiler.compile_snapshot(&store);

    // Separate Arcs, equal contents, no crossovers: one job, which is also
    // its own preview.
    assert!(Arc::ptr_eq(&manager_of(&snapshot, a), &manager_of(&snapshot, b)));
    assert!(Arc::ptr_eq(&manager_of(&snapshot, b), &manager_of(&snapshot, c)));
    let stats = compiler.last_stats();
    assert_eq!(stats.distinct_jobs, 1);
    assert_eq!(stats.created_managers, 1);
}

#[test]
fn test_temporary_hole_rebuilds_only_its_sector() {
    let (mut store, [a, b, c]) = row_of_sectors();
    connect(&mut store, a, b);
    connect(&mut store, b, c);
    let mut compiler = TerrainSnapshotCompiler::new(TerrainConfig::default());
    let before = compiler.compile_snapshot(&store);

    let hole = store
        .add_temporary_hole(a, Polygon2::rectangle(30, 30, 20, 20))
        .expect("sector exists");
    let with_hole = compiler.compile_snapshot(&store);
    assert!(!Arc::ptr_eq(&manager_of(&before, a), &manager_of(&with_hole, a)));
    assert!(Arc::ptr_eq(&manager_of(&before, b), &manager_of(&with_hole, b)));
    assert!(Arc::ptr_eq(&manager_of(&before, c), &manager_of(&with_hole, c)));
    assert_eq!(with_hole.temporary_holes.len(), 1);

    store.remove_temporary_hole(hole).expect("hole exists");
    let restored = compiler.compile_snapshot(&store);
    // Only the current compile's jobs stay cached, so a's hole-free job is rebuilt.
    assert_eq!(compiler.last_stats().created_managers, 1);
    assert!(Arc::ptr_eq(&manager_of(&with_hole, b), &manager_of(&restored, b)));
}

#[test]
fn test_invalidate_caches_recompiles_with_reuse() {
    let (mut store, [a, b, _]) = row_of_sectors();
    connect(&mut store, a, b);
    let mut compiler = TerrainSnapshotCompiler::new(TerrainConfig::default());
    let first = compiler.compile_snapshot(&store);

    compiler.invalidate_caches();
    let second = compiler.compile_snapshot(&store);
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(compiler.last_stats().created_managers, 0);
    assert!(Arc::ptr_eq(&manager_of(&first, a), &manager_of(&second, a)));
}

#[test]
fn test_views_are_memoized_per_radius() {
    let job = LocalGeometryJob::new(
        square_metadata(),
        [IntLineSegment2::from_coords(100, 20, 100, 80)],
        Vec::<Polygon2>::new(),
    );
    let manager = LocalGeometryViewManager::new(job, Arc::new(TerrainConfig::default()));

    let view = manager.get_or_compute_view(5.0);
    assert!(Arc::ptr_eq(&view, &manager.get_or_compute_view(5.0)));
    assert!(Arc::ptr_eq(&view, &manager.get_or_compute_view(5.000001)), "same quantized radius");
    assert!(!Arc::ptr_eq(&view, &manager.get_or_compute_view(6.0)));
    assert_eq!(manager.cached_view_count(), 2);
    assert!(std::ptr::eq(view.triangulation(), view.triangulation()));
}

#[test]
fn test_crossover_anchor_waypoints() {
    let segment = IntLineSegment2::from_coords(100, 80, 100, 20);
    let job = LocalGeometryJob::new(square_metadata(), [segment], Vec::<Polygon2>::new());
    let manager = LocalGeometryViewManager::new(job, Arc::new(TerrainConfig::default()));
    let view = manager.get_or_compute_view(5.0);

    let (anchor, reversed) = view.find_crossover_anchor(&segment).expect("anchor exists");
    assert!(reversed, "stored canonically from (100,20)");
    assert_eq!(
        anchor.waypoints.as_slice(),
        &[IVec2::new(100, 25), IVec2::new(100, 50), IVec2::new(100, 75)]
    );
    assert_eq!(
        view.anchor_waypoints_along(&segment).expect("anchor exists").as_slice(),
        &[IVec2::new(100, 75), IVec2::new(100, 50), IVec2::new(100, 25)]
    );
    for w in &anchor.waypoints {
        assert!(view.visibility_graph().try_index_of(*w).is_some());
    }

    let narrow = manager.get_or_compute_view(31.0);
    let (anchor, _) = narrow.find_crossover_anchor(&segment).expect("anchor exists");
    assert!(!anchor.is_passable(), "60-wide opening can't fit a 62-wide agent");
}

#[test]
fn test_view_queries() {
    let metadata = Arc::new(TerrainStaticMetadata::open_rectangle(100, 100).with_excluded(Polygon2::rectangle(40, 40, 20, 20)));
    let manager = LocalGeometryViewManager::new(LocalGeometryJob::preview(metadata), Arc::new(TerrainConfig::default()));
    let view = manager.get_or_compute_view(0.0);

    assert!(view.is_visible(IVec2::new(10, 10), IVec2::new(90, 10)));
    assert!(!view.is_visible(IVec2::new(10, 50), IVec2::new(90, 50)));
    let hit = view.raycast(IVec2::new(10, 50), IVec2::new(90, 50)).expect("hole in the way");
    assert!((hit - DVec2::new(40.0, 50.0)).length() < 1e-9);
    assert!(view.visible_waypoints(IVec2::new(50, 50)).is_empty(), "inside the hole");
    assert!(!view.visible_waypoints(IVec2::new(10, 10)).is_empty());
}

/// Land strictly below the slanted edge (0,0)-(100,31).
fn below_slanted_edge() -> Arc<TerrainStaticMetadata> {
    Arc::new(TerrainStaticMetadata::new(
        IntRect2::new(0, -100, 100, 31),
        vec![Polygon2::new(vec![
            IVec2::new(0, -100),
            IVec2::new(100, -100),
            IVec2::new(100, 31),
            IVec2::new(0, 0),
        ])],
        Vec::new(),
    ))
}

#[test]
fn test_slanted_crossover_anchor_snaps_onto_land() {
    let segment = IntLineSegment2::from_coords(0, 0, 100, 31);
    let job = LocalGeometryJob::new(below_slanted_edge(), [segment], Vec::<Polygon2>::new());
    let manager = LocalGeometryViewManager::new(job, Arc::new(TerrainConfig::default()));

    // The midpoint (50, 15.5) rounds above the edge; the walkable neighbour
    // below it is used instead.
    let exact = manager.get_or_compute_view(0.0);
    let (anchor, _) = exact.find_crossover_anchor(&segment).expect("anchor exists");
    assert_eq!(
        anchor.waypoints.as_slice(),
        &[IVec2::new(0, 0), IVec2::new(50, 15), IVec2::new(100, 31)]
    );

    for radius in [2.0, 5.0] {
        let view = manager.get_or_compute_view(radius);
        let (anchor, _) = view.find_crossover_anchor(&segment).expect("anchor exists");
        assert!(anchor.is_passable(), "radius {radius}");
        assert_eq!(anchor.waypoints.len(), 3);
        for w in &anchor.waypoints {
            assert!(view.punched_land().contains_point(w.as_dvec2()), "{w:?} at radius {radius}");
            assert!(view.visibility_graph().try_index_of(*w).is_some());
        }
    }
}

#[test]
fn test_slanted_crossover_without_midpoint() {
    let segment = IntLineSegment2::from_coords(0, 0, 100, 31);
    let config = TerrainConfig {
        crossover_midpoint_waypoints: false,
        ..TerrainConfig::default()
    };
    let job = LocalGeometryJob::new(below_slanted_edge(), [segment], Vec::<Polygon2>::new());
    let manager = LocalGeometryViewManager::new(job, Arc::new(config));

    let view = manager.get_or_compute_view(5.0);
    let waypoints = view.anchor_waypoints_along(&segment).expect("anchor exists");
    assert_eq!(waypoints.len(), 2);
    let ideal = [DVec2::new(4.775, 1.480), DVec2::new(95.225, 29.520)];
    for (w, ideal) in waypoints.iter().zip(ideal) {
        assert!(w.as_dvec2().distance(ideal) < 1.5, "{w:?} strays from {ideal:?}");
        assert!(view.punched_land().contains_point(w.as_dvec2()));
    }
}

#[test]
fn test_compiler_tells_stores_apart() {
    let (first_store, _) = row_of_sectors();
    let (second_store, [a, _, _]) = row_of_sectors();
    assert_eq!(first_store.version(), second_store.version());
    assert_ne!(first_store.instance_id(), second_store.instance_id());

    let mut compiler = TerrainSnapshotCompiler::new(TerrainConfig::default());
    let first = compiler.compile_snapshot(&first_store);
    let second = compiler.compile_snapshot(&second_store);
    assert!(!Arc::ptr_eq(&first, &second), "same version, different store");
    assert_eq!(second.store_id, second_store.instance_id());
    // Geometry is still shared structurally.
    assert!(Arc::ptr_eq(&manager_of(&first, a), &manager_of(&second, a)));
    assert_eq!(compiler.last_stats().created_managers, 0);
}
