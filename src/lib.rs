//! # frontal-delaunay
//!
//! A library for meshing parametric surface patches with constrained and
//! frontal Delaunay triangulation.
//!
//! Meshing happens in the 2-D parameter space of a [`Surface`](geometry::surface::Surface);
//! every point also carries its evaluated 3-D coordinates, which drive the
//! element sizes and quality measures.
//!
//! # Features
//!
//! - Bowyer-Watson point insertion accelerated by a quadtree
//! - Constrained segment recovery with gift wrapping
//! - Lawson edge flips that respect constrained edges
//! - Holes and exterior carving by flood fill across unconstrained edges
//! - Frontal (advancing-front) refinement with Rebay point placement driven by
//!   a size field
//! - Adaptive boundary discretization of parametric curves
//! - Mesh export to plain arrays (serializable with [serde](https://serde.rs))
//!   and to legacy VTK
//!
//! # Basic Usage
//!
//! ```rust
//! use frontal_delaunay::prelude::*;
//!
//! let square = [
//!     Point2::new(0.0, 0.0),
//!     Point2::new(1.0, 0.0),
//!     Point2::new(1.0, 1.0),
//!     Point2::new(0.0, 1.0),
//! ];
//! let segments = [(0, 1), (1, 2), (2, 3), (3, 0)];
//! let mut tri = Triangulation::triangulate(PlanarSurface, &square, &segments, &[]).unwrap();
//! assert_eq!(tri.num_triangles(), 2);
//!
//! let options = FrontalOptionsBuilder::default()
//!     .acceptance_ratio(1.5)
//!     .build()
//!     .unwrap();
//! let stats = tri.frontal(&ConstantSize::new(0.25), &options).unwrap();
//! assert!(stats.points_inserted > 0);
//!
//! let mesh = tri.get_mesh();
//! assert_eq!(mesh.num_triangles, tri.num_triangles());
//! assert!(tri.is_valid());
//! ```
//!
//! # Point indices
//!
//! The engine reserves indices `0..FIXED_POINT_OFFSET` for the frame that
//! encloses the domain. Input point `i` is stored at
//! `FIXED_POINT_OFFSET + i`, and every engine method taking a point takes
//! this internal index. [`Triangulation::get_mesh`](core::triangulation::Triangulation::get_mesh)
//! drops the frame and renumbers densely from zero.
//!
//! # Errors
//!
//! Geometric failures of single points or segments do not abort meshing;
//! they are collected in [`Diagnostics`](core::triangulation::Diagnostics).
//! Topology violations always propagate as
//! [`TriangulationError::Topology`](core::triangulation::TriangulationError::Topology).

#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// The `core` module contains the triangulation engine, its data structures,
/// and the algorithms operating on it.
pub mod core {
    /// Algorithms implemented as `impl` blocks on
    /// [`Triangulation`](crate::core::triangulation::Triangulation).
    pub mod algorithms {
        /// Lawson edge flips
        pub mod flips;
        /// Frontal refinement driven by a size field
        pub mod frontal;
        /// Bowyer-Watson point insertion
        pub mod insertion;
        /// Point location by walking
        pub mod locate;
        /// Constrained segment recovery
        pub mod segment_insertion;
    }
    /// Hash map, hash set, and small-buffer aliases used throughout the crate
    pub mod collections;
    pub mod edge_table;
    pub mod mesh;
    pub mod quadtree;
    pub mod triangle;
    pub mod triangle_list;
    pub mod triangulation;
    /// Invariant checks for triangulations.
    pub mod util {
        pub mod validation;
        pub use validation::*;
    }
    pub use mesh::*;
    pub use triangle::*;
    pub use triangulation::*;
}

/// Geometric types, predicates, and the surface and size-field collaborators.
pub mod geometry {
    /// Geometric algorithms on point sets
    pub mod algorithms {
        /// Planar convex hull
        pub mod convex_hull;
        pub use convex_hull::*;
    }
    pub mod edge_mesh;
    pub mod point;
    pub mod predicates;
    /// Triangle quality and size measures
    pub mod quality;
    pub mod size_field;
    pub mod surface;
    pub use point::*;
    pub use predicates::*;
    pub use quality::*;
    pub use size_field::*;
    pub use surface::*;
}

/// Mesh output formats.
pub mod io {
    pub mod vtk;
}

/// Topological checks on exported meshes.
pub mod topology {
    /// Topological invariants
    pub mod characteristics {
        pub mod euler;
    }
}

/// A prelude module that re-exports commonly used types.
/// This makes it easier to import the most commonly used items from the crate.
pub mod prelude {
    // Engine
    pub use crate::core::{
        algorithms::frontal::{FrontalOptions, FrontalOptionsBuilder, FrontalStatistics},
        mesh::Mesh,
        triangle::{Triangle, TriangleStatus},
        triangle_list::TriangleKey,
        triangulation::{Diagnostics, FIXED_POINT_OFFSET, Triangulation, TriangulationError},
        util::validation::{ValidationOptions, ValidationReport},
    };

    // Collaborators
    pub use crate::geometry::{
        edge_mesh::{CircleCurve, EdgeMesh, LineCurve, Pslg, PslgBuilder, mesh_edge},
        point::{Point2, Point3},
        size_field::{ConstantSize, ElementFeatureSize, LinearSize},
        surface::{AffineSurface, PlanarSurface, Surface},
    };

    // Output
    pub use crate::io::vtk::{VtkSpace, write_vtk};
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{
        core::{mesh::Mesh, triangle::Triangle, triangulation::Triangulation},
        geometry::{
            point::{Point2, Point3},
            surface::{AffineSurface, PlanarSurface},
        },
        is_normal,
    };

    #[test]
    fn normal_types() {
        assert!(is_normal::<Point2>());
        assert!(is_normal::<Point3>());
        assert!(is_normal::<Triangle>());
        assert!(is_normal::<Mesh>());
        assert!(is_normal::<Triangulation<PlanarSurface>>());
        assert!(is_normal::<Triangulation<AffineSurface>>());
    }

    #[test]
    fn test_prelude_exports() {
        use crate::prelude::*;

        let pslg = PslgBuilder::new()
            .add_loop(&[
                Point2::new(0.0, 0.0),
                Point2::new(2.0, 0.0),
                Point2::new(2.0, 2.0),
                Point2::new(0.0, 2.0),
            ])
            .build();
        let tri: Triangulation<PlanarSurface> =
            Triangulation::triangulate(PlanarSurface, &pslg.points, &pslg.segments, &pslg.holes)
                .unwrap();
        assert!(tri.diagnostics().is_clean());
        assert_eq!(tri.params()[FIXED_POINT_OFFSET], Point2::new(0.0, 0.0));

        let options = FrontalOptions::default();
        assert!((options.acceptance_ratio - 1.5).abs() < f64::EPSILON);
        assert!(tri.validation_report(ValidationOptions::default()).is_ok());
    }
}
