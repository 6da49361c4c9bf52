/// Tests for exact predicates, the land/hole tree and punched-land clipping.
use super::clipping::{crossover_strip, punch_land, LandShape};
use super::*;
use crate::terrain::config::TerrainConfig;
use bevy::math::{DVec2, IVec2};

fn ring_with_island() -> PolygonTree {
    PolygonTree::from_contours(vec![
        Polygon2::rectangle(40, 40, 20, 20),
        Polygon2::rectangle(0, 0, 100, 100),
        Polygon2::rectangle(20, 20, 60, 60),
    ])
}

fn square_with_hole() -> PolygonTree {
    PolygonTree::from_contours(vec![
        Polygon2::rectangle(0, 0, 100, 100),
        Polygon2::rectangle(40, 40, 20, 20),
    ])
}

#[test]
fn test_clockness_sign_convention() {
    assert_eq!(
        clockness(IVec2::new(0, 0), IVec2::new(10, 0), IVec2::new(10, 10)),
        Clockness::CounterClockwise
    );
    assert_eq!(
        clockness(IVec2::new(0, 0), IVec2::new(10, 0), IVec2::new(10, -10)),
        Clockness::Clockwise
    );
    assert_eq!(
        clockness(IVec2::new(0, 0), IVec2::new(5, 0), IVec2::new(10, 0)),
        Clockness::Neutral
    );
    assert_eq!(
        clockness_f64(DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0), DVec2::new(10.0, 10.0)),
        Clockness::CounterClockwise
    );
}

#[test]
fn test_clockness_survives_large_coordinates() {
    let far = i32::MAX / 2;
    assert_eq!(
        clockness(IVec2::new(-far, -far), IVec2::new(far, -far), IVec2::new(far, far)),
        Clockness::CounterClockwise
    );
}

#[test]
fn test_point_in_triangle_is_strict_on_every_edge() {
    let tri = [DVec2::new(0.0, 0.0), DVec2::new(4.0, 0.0), DVec2::new(0.0, 4.0)];

    assert!(is_point_in_triangle(DVec2::new(1.0, 1.0), &tri));
    assert!(!is_point_in_triangle(DVec2::new(2.0, 2.0), &tri), "hypotenuse is outside");
    assert!(!is_point_in_triangle(DVec2::new(0.0, 2.0), &tri), "left edge is outside");
    assert!(!is_point_in_triangle(DVec2::new(2.0, 0.0), &tri), "bottom edge is outside");
    assert!(!is_point_in_triangle(DVec2::new(0.0, 0.0), &tri), "vertex is outside");
    assert!(!is_point_in_triangle(DVec2::new(5.0, 5.0), &tri));
}

#[test]
fn test_line_line_intersection() {
    let a = IntLineSegment2::from_coords(0, 0, 10, 10);
    let b = IntLineSegment2::from_coords(0, 10, 10, 0);
    let hit = find_line_line_intersection(&a, &b);
    assert!((hit - DVec2::new(5.0, 5.0)).length() < 1e-12, "got {hit:?}");

    // Infinite lines: the crossing may lie beyond either segment.
    let c = IntLineSegment2::from_coords(0, 0, 1, 0);
    let d = IntLineSegment2::from_coords(7, 3, 7, 4);
    let hit = find_line_line_intersection(&c, &d);
    assert!((hit - DVec2::new(7.0, 0.0)).length() < 1e-12, "got {hit:?}");
}

#[test]
#[should_panic(expected = "parallel")]
fn test_line_line_intersection_rejects_parallel_lines() {
    let a = IntLineSegment2::from_coords(0, 0, 10, 0);
    let b = IntLineSegment2::from_coords(0, 5, 10, 5);
    find_line_line_intersection(&a, &b);
}

#[test]
fn test_proper_intersection_excludes_touching() {
    let o = IVec2::new(0, 0);
    assert!(segments_properly_intersect(o, IVec2::new(10, 10), IVec2::new(0, 10), IVec2::new(10, 0)));
    // Shared endpoint.
    assert!(!segments_properly_intersect(o, IVec2::new(10, 0), o, IVec2::new(0, 10)));
    // T-junction.
    assert!(!segments_properly_intersect(o, IVec2::new(10, 0), IVec2::new(5, 0), IVec2::new(5, 5)));
    // Collinear overlap.
    assert!(!segments_properly_intersect(o, IVec2::new(10, 0), IVec2::new(5, 0), IVec2::new(15, 0)));
}

#[test]
fn test_incircle_sign() {
    let a = IVec2::new(0, 0);
    let b = IVec2::new(10, 0);
    let c = IVec2::new(0, 10);
    assert!(incircle(a, b, c, IVec2::new(5, 5)) > 0);
    assert!(incircle(a, b, c, IVec2::new(20, 20)) < 0);
    assert_eq!(incircle(a, b, c, IVec2::new(10, 10)), 0, "cocircular");
}

#[test]
fn test_polygon_normalizes_closing_point() {
    let poly = Polygon2::new(vec![
        IVec2::new(0, 0),
        IVec2::new(10, 0),
        IVec2::new(10, 0),
        IVec2::new(10, 10),
        IVec2::new(0, 0),
    ]);
    assert_eq!(poly.len(), 3);
    assert!(poly.is_counterclockwise());
    assert_eq!(poly.signed_area_doubled(), 100);
    assert!(!poly.oriented(false).is_counterclockwise());
}

#[test]
fn test_segment_canonical_order() {
    let seg = IntLineSegment2::from_coords(10, 0, 0, 0);
    assert_eq!(seg.canonical(), IntLineSegment2::from_coords(0, 0, 10, 0));
    assert_eq!(seg.canonical(), seg.reversed().canonical());
    assert_eq!(seg.length(), 10.0);
}

#[test]
fn test_polygon_tree_rebuilds_nesting_by_containment() {
    let tree = ring_with_island();

    assert_eq!(tree.len(), 4, "root + land + hole + island");
    assert_eq!(tree.root().kind, PolygonNodeKind::Hole);
    assert!(tree.root().contour.is_empty());
    assert_eq!(tree.root().children.len(), 1);

    let outer = tree.node(tree.root().children[0]);
    assert_eq!(outer.kind, PolygonNodeKind::Land);
    assert_eq!(outer.contour, Polygon2::rectangle(0, 0, 100, 100));
    assert!(outer.contour.is_counterclockwise());

    let hole = tree.node(outer.children[0]);
    assert_eq!(hole.kind, PolygonNodeKind::Hole);
    assert!(!hole.contour.is_counterclockwise(), "holes are stored clockwise");

    let island = tree.node(hole.children[0]);
    assert_eq!(island.kind, PolygonNodeKind::Land);
    assert!(island.children.is_empty());
    assert_eq!(tree.land_node_ids().count(), 2);
}

#[test]
fn test_polygon_tree_contains_point() {
    let tree = ring_with_island();
    assert!(tree.contains_point(DVec2::new(10.0, 10.0)), "outer ring");
    assert!(!tree.contains_point(DVec2::new(30.0, 30.0)), "inside the hole");
    assert!(tree.contains_point(DVec2::new(50.0, 50.0)), "inner island");
    assert!(tree.contains_point(DVec2::new(20.0, 50.0)), "hole boundary counts as land");
    assert!(!tree.contains_point(DVec2::new(150.0, 50.0)));
    assert!(!PolygonTree::new().contains_point(DVec2::ZERO));
}

#[test]
fn test_segment_visibility_around_hole() {
    let tree = square_with_hole();

    assert!(tree.is_segment_unobstructed(IVec2::new(10, 10), IVec2::new(90, 10)));
    assert!(!tree.is_segment_unobstructed(IVec2::new(10, 50), IVec2::new(90, 50)));
    // Along a hole edge.
    assert!(tree.is_segment_unobstructed(IVec2::new(40, 10), IVec2::new(40, 90)));
    // Corner-to-corner diagonal only touches vertices but runs through the hole.
    assert!(!tree.is_segment_unobstructed(IVec2::new(10, 10), IVec2::new(90, 90)));
    // Leaves the land.
    assert!(!tree.is_segment_unobstructed(IVec2::new(50, 10), IVec2::new(150, 10)));
}

#[test]
fn test_first_obstruction_is_closest_crossing() {
    let tree = square_with_hole();
    let hit = tree
        .try_find_first_obstruction(IVec2::new(10, 50), IVec2::new(90, 50))
        .expect("ray crosses the hole");
    assert!((hit - DVec2::new(40.0, 50.0)).length() < 1e-9, "got {hit:?}");

    let hit = tree
        .try_find_first_obstruction(IVec2::new(90, 50), IVec2::new(10, 50))
        .expect("ray crosses the hole");
    assert!((hit - DVec2::new(60.0, 50.0)).length() < 1e-9, "got {hit:?}");

    assert!(tree
        .try_find_first_obstruction(IVec2::new(10, 10), IVec2::new(90, 10))
        .is_none());
}

#[test]
fn test_punch_land_erodes_and_dilates() {
    let config = TerrainConfig::default();
    let included = [Polygon2::rectangle(0, 0, 100, 100)];
    let excluded = [Polygon2::rectangle(40, 40, 20, 20)];
    let shape = LandShape {
        included: &included,
        excluded: &excluded,
        temporary_holes: &[],
        crossovers: &[],
    };

    let zero = punch_land(&shape, 0.0, &config);
    assert!(zero.contains_point(DVec2::new(2.0, 50.0)));
    assert!(!zero.contains_point(DVec2::new(50.0, 50.0)));

    let punched = punch_land(&shape, 5.0, &config);
    assert!(punched.contains_point(DVec2::new(10.0, 10.0)));
    assert!(!punched.contains_point(DVec2::new(2.0, 50.0)), "eroded border");
    assert!(!punched.contains_point(DVec2::new(37.0, 50.0)), "dilated hole");
    assert!(punched.contains_point(DVec2::new(30.0, 50.0)));
}

#[test]
fn test_punch_land_reopens_crossover() {
    let config = TerrainConfig::default();
    let included = [Polygon2::rectangle(0, 0, 100, 100)];
    let crossovers = [IntLineSegment2::from_coords(100, 20, 100, 80)];
    let shape = LandShape {
        included: &included,
        excluded: &[],
        temporary_holes: &[],
        crossovers: &crossovers,
    };

    let punched = punch_land(&shape, 5.0, &config);
    assert!(punched.contains_point(DVec2::new(98.0, 50.0)), "strip reaches the opening");
    assert!(punched.contains_point(DVec2::new(100.0, 25.0)), "inset endpoint");
    assert!(!punched.contains_point(DVec2::new(98.0, 10.0)), "border outside the strip stays eroded");
    assert!(!punched.contains_point(DVec2::new(103.0, 50.0)), "strip is clipped to land");
}

#[test]
fn test_crossover_strip_requires_room_for_agent() {
    let seg = IntLineSegment2::from_coords(0, 0, 0, 10);
    assert!(crossover_strip(&seg, 5.0).is_none());
    assert!(crossover_strip(&seg, 4.0).is_some());
}

#[test]
fn test_temporary_holes_are_subtracted() {
    let config = TerrainConfig::default();
    let included = [Polygon2::rectangle(0, 0, 100, 100)];
    let holes = [Polygon2::rectangle(10, 10, 10, 10)];
    let shape = LandShape {
        included: &included,
        excluded: &[],
        temporary_holes: &holes,
        crossovers: &[],
    };
    let punched = punch_land(&shape, 0.0, &config);
    assert!(!punched.contains_point(DVec2::new(15.0, 15.0)));
    assert!(punched.contains_point(DVec2::new(50.0, 50.0)));
}

#[test]
fn test_visibility_polygon_of_open_square_is_the_square() {
    let tree = PolygonTree::from_contours(vec![Polygon2::rectangle(0, 0, 100, 100)]);
    let fov = VisibilityPolygon::compute(&tree, DVec2::new(30.0, 40.0)).expect("origin on land");
    assert!((fov.area() - 10_000.0).abs() < 1e-6, "got {}", fov.area());
    assert!(fov.contains(DVec2::new(95.0, 95.0)));
    assert_eq!(fov.origin(), DVec2::new(30.0, 40.0));
}

#[test]
fn test_visibility_polygon_is_shadowed_by_hole() {
    let tree = square_with_hole();
    let fov = VisibilityPolygon::compute(&tree, DVec2::new(10.0, 50.0)).expect("origin on land");

    assert!(fov.contains(DVec2::new(90.0, 10.0)), "passes below the hole");
    assert!(fov.contains(DVec2::new(30.0, 50.0)), "in front of the hole");
    assert!(!fov.contains(DVec2::new(90.0, 50.0)), "behind the hole");
    assert!(!fov.contains(DVec2::new(50.0, 50.0)), "inside the hole");
    assert!(fov.area() > 5_000.0 && fov.area() < 9_600.0, "got {}", fov.area());

    assert!(VisibilityPolygon::compute(&tree, DVec2::new(50.0, 50.0)).is_none());
}

#[test]
fn test_nearest_land_point() {
    let tree = square_with_hole();
    let on_land = DVec2::new(20.0, 20.0);
    assert_eq!(tree.find_nearest_land_point(on_land), Some(on_land));

    let from_hole = tree.find_nearest_land_point(DVec2::new(50.0, 45.0)).expect("tree has land");
    assert!(from_hole.distance(DVec2::new(50.0, 40.0)) < 2.0 * NEAREST_LAND_INSET);
    assert!(from_hole.y < 40.0, "pushed out of the hole: {from_hole:?}");

    let from_outside = tree.find_nearest_land_point(DVec2::new(110.0, 120.0)).expect("tree has land");
    assert!(from_outside.distance(DVec2::new(100.0, 100.0)) < 2.0 * NEAREST_LAND_INSET);
    assert!(from_outside.x < 100.0 && from_outside.y < 100.0, "clears the corner: {from_outside:?}");

    assert!(PolygonTree::new().find_nearest_land_point(on_land).is_none());
}
