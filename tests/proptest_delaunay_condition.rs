//! Property-based tests for Delaunay-specific properties.
//!
//! - Empty circumcircle condition after incremental insertion
//! - Edge registration and triangle validity after every insertion
//! - Insertion-order robustness: the triangles depend only on the point set

use frontal_delaunay::core::util::validation::{
    find_delaunay_violations, validate_edge_registration, validate_triangles,
};
use frontal_delaunay::prelude::*;
use proptest::prelude::*;

// =============================================================================
// TEST CONFIGURATION
// =============================================================================

const EXTENT: f64 = 100.0;

fn finite_coordinate() -> impl Strategy<Value = f64> {
    (-EXTENT..EXTENT).prop_filter("must be finite", |x: &f64| x.is_finite())
}

fn point_cloud(max: usize) -> impl Strategy<Value = Vec<Point2>> {
    prop::collection::vec(
        (finite_coordinate(), finite_coordinate()).prop_map(|(x, y)| Point2::new(x, y)),
        3..=max,
    )
}

/// Drop points that nearly coincide with an earlier one.
fn well_separated(points: Vec<Point2>) -> Vec<Point2> {
    let mut unique: Vec<Point2> = Vec::with_capacity(points.len());
    for p in points {
        if unique.iter().all(|q| q.distance(p) > 1e-3) {
            unique.push(p);
        }
    }
    unique
}

fn framed(points: &[Point2]) -> Triangulation<PlanarSurface> {
    let mut tri = Triangulation::with_bounds(
        PlanarSurface,
        Point2::new(-EXTENT, -EXTENT),
        Point2::new(EXTENT, EXTENT),
    )
    .unwrap();
    for &p in points {
        tri.add_point(p).unwrap();
    }
    tri
}

/// Triangles as sorted coordinate bit patterns, independent of point indices.
fn triangle_coordinates(tri: &Triangulation<PlanarSurface>) -> Vec<[(u64, u64); 3]> {
    let mut tris: Vec<[(u64, u64); 3]> = tri
        .triangles()
        .map(|(_, t)| {
            let mut corners = t.vertices().map(|i| {
                let p = tri.params()[i];
                (p.x.to_bits(), p.y.to_bits())
            });
            corners.sort_unstable();
            corners
        })
        .collect();
    tris.sort_unstable();
    tris
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    /// Property: no point lies strictly inside the circumcircle of any
    /// triangle built by Bowyer-Watson insertion.
    #[test]
    fn prop_empty_circumcircle(points in point_cloud(40).prop_map(well_separated)) {
        let tri = framed(&points);
        let violations = find_delaunay_violations(&tri, false);
        prop_assert!(violations.is_empty(), "Delaunay violations: {:?}", violations);
    }

    /// Property: edge registration holds after every single insertion.
    #[test]
    fn prop_edge_registration_after_each_insertion(
        points in point_cloud(25).prop_map(well_separated)
    ) {
        let mut tri = Triangulation::with_bounds(
            PlanarSurface,
            Point2::new(-EXTENT, -EXTENT),
            Point2::new(EXTENT, EXTENT),
        )
        .unwrap();
        for (i, &p) in points.iter().enumerate() {
            let index = tri.add_point(p).unwrap();
            prop_assert_eq!(index, FIXED_POINT_OFFSET + i);
            prop_assert!(validate_edge_registration(&tri).is_ok());
            prop_assert!(validate_triangles(&tri).is_ok());
        }
        // Every interior point adds two triangles to the frame's two.
        prop_assert_eq!(tri.num_triangles(), 2 * points.len() + 2);
    }

    /// Property: reversing the insertion order gives the same triangles.
    ///
    /// Random points are in general position, so the Delaunay triangulation
    /// is unique.
    #[test]
    fn prop_insertion_order_robustness(points in point_cloud(30).prop_map(well_separated)) {
        let forward = framed(&points);
        let reversed: Vec<Point2> = points.iter().rev().copied().collect();
        let backward = framed(&reversed);

        prop_assert_eq!(forward.num_triangles(), backward.num_triangles());
        prop_assert_eq!(triangle_coordinates(&forward), triangle_coordinates(&backward));
    }

    /// Property: batch triangulation without segments covers the convex hull
    /// and is Delaunay.
    #[test]
    fn prop_hull_triangulation_is_delaunay(points in point_cloud(30).prop_map(well_separated)) {
        let Ok(tri) = Triangulation::triangulate(PlanarSurface, &points, &[], &[]) else {
            // Collinear samples have no triangulation.
            prop_assume!(false);
            unreachable!();
        };
        prop_assert!(tri.is_valid());
        let violations = find_delaunay_violations(&tri, false);
        prop_assert!(violations.is_empty(), "Delaunay violations: {:?}", violations);
    }
}
