//! Property-based tests for constrained triangulation.
//!
//! Random star-shaped polygons are triangulated with their boundary as
//! constraints:
//!
//! - every segment appears as a mesh edge
//! - the carved mesh covers exactly the polygon (`F = n - 2`)
//! - unconstrained edges remain locally Delaunay
//! - radial constraints from the star centre are recovered

use std::f64::consts::TAU;

use frontal_delaunay::core::util::validation::{ValidationOptions, validate_constraints};
use frontal_delaunay::geometry::predicates::InCircle;
use frontal_delaunay::prelude::*;
use frontal_delaunay::topology::characteristics::euler;
use proptest::prelude::*;

// =============================================================================
// TEST CONFIGURATION
// =============================================================================

/// Polygon with vertices at increasing angles around the origin.
///
/// Angular gaps are drawn from `[1, 2]` and normalised, so no gap is smaller
/// than half the average.
fn star_polygon() -> impl Strategy<Value = Vec<Point2>> {
    (5_usize..=24)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(1.0_f64..2.0, n),
                prop::collection::vec(0.5_f64..1.0, n),
            )
        })
        .prop_map(|(gaps, radii)| {
            let total: f64 = gaps.iter().sum();
            let mut angle = 0.0;
            gaps.iter()
                .zip(&radii)
                .map(|(gap, r)| {
                    angle += gap / total * TAU;
                    Point2::new(r * angle.cos(), r * angle.sin())
                })
                .collect()
        })
}

fn boundary_segments(n: usize) -> Vec<(usize, usize)> {
    (0..n).map(|i| (i, (i + 1) % n)).collect()
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    /// Property: a star-shaped polygon is triangulated into exactly `n - 2`
    /// triangles that contain every boundary segment.
    #[test]
    fn prop_polygon_boundary_is_conforming(polygon in star_polygon()) {
        let n = polygon.len();
        let segments = boundary_segments(n);
        let tri = Triangulation::triangulate(PlanarSurface, &polygon, &segments, &[]).unwrap();

        prop_assert!(tri.diagnostics().failed_segments.is_empty());
        prop_assert!(validate_constraints(&tri).is_ok());
        prop_assert!(tri.validation_report(ValidationOptions::default()).is_ok());
        prop_assert_eq!(tri.num_triangles(), n - 2);

        let counts = euler::validate_planar_topology(&tri.get_mesh(), 0).unwrap();
        prop_assert_eq!(counts.vertices, n);
        prop_assert_eq!(counts.boundary_edges, n);
    }

    /// Property: every unconstrained interior edge is locally Delaunay.
    #[test]
    fn prop_unconstrained_edges_are_locally_delaunay(polygon in star_polygon()) {
        let segments = boundary_segments(polygon.len());
        let mut with_center = polygon.clone();
        with_center.push(Point2::new(0.0, 0.0));
        let tri = Triangulation::triangulate(PlanarSurface, &with_center, &segments, &[]).unwrap();

        // V = n + 1 and b = n give F = 2V - b - 2 = n.
        prop_assert_eq!(tri.num_triangles(), polygon.len());
        for (_, t) in tri.triangles() {
            for (u, v) in t.edges() {
                if tri.edge_in_pslg(u, v) {
                    continue;
                }
                let Some(w) = t.opposite(u, v) else { continue };
                if let Some((_, x)) = tri.neighbor(u, v) {
                    prop_assert_ne!(tri.in_circle(u, v, w, x), InCircle::INSIDE);
                }
            }
        }
    }

    /// Property: radial constraints from an interior point are recovered.
    ///
    /// The polygon is star-shaped around the origin, so every segment from
    /// the origin to a vertex lies inside it.
    #[test]
    fn prop_radial_constraints_are_recovered(polygon in star_polygon()) {
        let n = polygon.len();
        let mut points = polygon.clone();
        points.push(Point2::new(0.0, 0.0));
        let mut segments = boundary_segments(n);
        segments.extend((0..n).step_by(3).map(|k| (n, k)));
        let tri = Triangulation::triangulate(PlanarSurface, &points, &segments, &[]).unwrap();

        prop_assert!(tri.diagnostics().failed_segments.is_empty());
        prop_assert!(validate_constraints(&tri).is_ok());
        prop_assert!(tri.is_valid());
        prop_assert_eq!(tri.num_triangles(), n);
        let center = n + FIXED_POINT_OFFSET;
        for k in (0..n).step_by(3) {
            let u = k + FIXED_POINT_OFFSET;
            prop_assert!(
                tri.edge_owner(center, u).is_some() || tri.edge_owner(u, center).is_some()
            );
        }
    }
}
