//! Structural and geometric invariant checks.
//!
//! Each check returns the first violation it finds;
//! [`Triangulation::validation_report`] runs all of them and collects every
//! failing invariant.

use thiserror::Error;

use crate::core::collections::{FastHashMap, SmallBuffer};
use crate::core::edge_table::triangle_hash;
use crate::core::triangle_list::TriangleKey;
use crate::core::triangulation::Triangulation;
use crate::geometry::predicates::{InCircle, Orientation, in_circle, orientation};
use crate::geometry::surface::Surface;

/// A violated mesh invariant.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A triangle edge has no entry in the edge table, or a different owner.
    #[error("Edge ({u}, {v}) of triangle {key:?} is not registered to it")]
    UnregisteredEdge {
        /// The triangle.
        key: TriangleKey,
        /// Edge start.
        u: usize,
        /// Edge end.
        v: usize,
    },
    /// An edge-table entry points to a triangle that does not own the edge.
    #[error("Edge ({u}, {v}) maps to triangle {key:?}, which does not own it")]
    DanglingEdge {
        /// The recorded owner.
        key: TriangleKey,
        /// Edge start.
        u: usize,
        /// Edge end.
        v: usize,
    },
    /// A triangle repeats a vertex.
    #[error("Triangle {key:?} has repeated vertices")]
    RepeatedVertex {
        /// The triangle.
        key: TriangleKey,
    },
    /// A triangle is not counter-clockwise in parameter space.
    #[error("Triangle {key:?} is {orientation}, expected POSITIVE")]
    Orientation {
        /// The triangle.
        key: TriangleKey,
        /// Its orientation.
        orientation: Orientation,
    },
    /// Two triangles have the same vertex set.
    #[error("Triangles {first:?} and {second:?} have the same vertices")]
    DuplicateTriangle {
        /// First triangle.
        first: TriangleKey,
        /// Second triangle.
        second: TriangleKey,
    },
    /// A constrained edge is not an edge of any triangle.
    #[error("Constrained edge ({u}, {v}) is missing from the mesh")]
    MissingConstraint {
        /// Edge start.
        u: usize,
        /// Edge end.
        v: usize,
    },
    /// A mesh point lies strictly inside a triangle's circumcircle.
    #[error("Point {point} lies inside the circumcircle of triangle {key:?}")]
    DelaunayViolation {
        /// The triangle.
        key: TriangleKey,
        /// The offending point.
        point: usize,
    },
}

/// Invariant families checked by [`Triangulation::validation_report`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvariantKind {
    /// Edge table and triangle list agree.
    EdgeRegistration,
    /// Triangles have distinct vertices and positive orientation.
    TriangleValidity,
    /// No two triangles share a vertex set.
    DuplicateTriangles,
    /// Every constrained edge is a mesh edge.
    ConstraintConformity,
    /// Empty circumcircle property.
    Delaunay,
}

/// A single invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvariantViolation {
    /// The invariant family.
    pub kind: InvariantKind,
    /// The first violation found.
    pub error: ValidationError,
}

/// All invariant violations of a triangulation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Violations in check order.
    pub violations: Vec<InvariantViolation>,
}

impl ValidationReport {
    /// Whether no violations were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Options for [`Triangulation::validation_report`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ValidationOptions {
    /// Run the (quadratic) Delaunay check.
    pub check_delaunay: bool,
    /// Skip triangles with a constrained edge in the Delaunay check.
    pub skip_constrained: bool,
}

/// Check that every triangle edge is registered to its triangle and every
/// registered edge belongs to its owner.
///
/// # Errors
///
/// Returns the first [`ValidationError::UnregisteredEdge`] or
/// [`ValidationError::DanglingEdge`].
pub fn validate_edge_registration<S: Surface>(
    tri: &Triangulation<S>,
) -> Result<(), ValidationError> {
    for (key, t) in tri.triangles() {
        for (u, v) in t.edges() {
            if tri.edge_owner(u, v) != Some(key) {
                return Err(ValidationError::UnregisteredEdge { key, u, v });
            }
        }
    }
    for (u, v, key) in tri.edges.iter() {
        if tri.triangle(key).and_then(|t| t.opposite(u, v)).is_none() {
            return Err(ValidationError::DanglingEdge { key, u, v });
        }
    }
    Ok(())
}

/// Check that every triangle has distinct vertices and is counter-clockwise.
///
/// # Errors
///
/// Returns the first [`ValidationError::RepeatedVertex`] or
/// [`ValidationError::Orientation`].
pub fn validate_triangles<S: Surface>(tri: &Triangulation<S>) -> Result<(), ValidationError> {
    for (key, t) in tri.triangles() {
        if !t.has_distinct_vertices() {
            return Err(ValidationError::RepeatedVertex { key });
        }
        let [a, b, c] = t.vertices().map(|i| tri.params()[i]);
        let o = orientation(a, b, c);
        if o != Orientation::POSITIVE {
            return Err(ValidationError::Orientation { key, orientation: o });
        }
    }
    Ok(())
}

/// Check that no two triangles share a vertex set.
///
/// # Errors
///
/// Returns the first [`ValidationError::DuplicateTriangle`].
pub fn validate_no_duplicate_triangles<S: Surface>(
    tri: &Triangulation<S>,
) -> Result<(), ValidationError> {
    let nbuckets = tri.num_triangles().max(1);
    let mut buckets: FastHashMap<usize, SmallBuffer<TriangleKey, 4>> = FastHashMap::default();
    for (key, t) in tri.triangles() {
        let [u, v, w] = t.vertices();
        let bucket = buckets.entry(triangle_hash(u, v, w, nbuckets)).or_default();
        let sorted = t.sorted_vertices();
        let duplicate = bucket
            .iter()
            .copied()
            .find(|&k| tri.triangle(k).is_some_and(|o| o.sorted_vertices() == sorted));
        if let Some(first) = duplicate {
            return Err(ValidationError::DuplicateTriangle { first, second: key });
        }
        bucket.push(key);
    }
    Ok(())
}

/// Check that every constrained edge is an edge of some triangle.
///
/// # Errors
///
/// Returns the first [`ValidationError::MissingConstraint`].
pub fn validate_constraints<S: Surface>(tri: &Triangulation<S>) -> Result<(), ValidationError> {
    let mut edges: Vec<(usize, usize)> = tri.pslg_edges().collect();
    edges.sort_unstable();
    for (u, v) in edges {
        if tri.edge_owner(u, v).is_none() && tri.edge_owner(v, u).is_none() {
            return Err(ValidationError::MissingConstraint { u, v });
        }
    }
    Ok(())
}

/// Triangles whose circumcircle strictly contains another mesh point.
///
/// Frame points are ignored. With `skip_constrained`, triangles with a
/// constrained edge are not checked.
#[must_use]
pub fn find_delaunay_violations<S: Surface>(
    tri: &Triangulation<S>,
    skip_constrained: bool,
) -> Vec<ValidationError> {
    let params = tri.params();
    let candidates: Vec<usize> = (0..tri.num_points())
        .filter(|&p| tri.is_in_mesh(p) && !tri.is_frame_point(p))
        .collect();

    let mut violations = Vec::new();
    for (key, t) in tri.triangles() {
        if skip_constrained && t.edges().iter().any(|&(a, b)| tri.edge_in_pslg(a, b)) {
            continue;
        }
        let [a, b, c] = t.vertices().map(|i| params[i]);
        let inside = candidates
            .iter()
            .copied()
            .filter(|&p| !t.has_vertex(p))
            .find(|&p| in_circle(a, b, c, params[p]) == InCircle::INSIDE);
        if let Some(point) = inside {
            violations.push(ValidationError::DelaunayViolation { key, point });
        }
    }
    violations
}

impl<S: Surface> Triangulation<S> {
    /// Run every structural check, and optionally the Delaunay check.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationReport`] listing each failing invariant family
    /// with its first violation.
    pub fn validation_report(&self, options: ValidationOptions) -> Result<(), ValidationReport> {
        let mut report = ValidationReport::default();
        let checks: [(InvariantKind, fn(&Self) -> Result<(), ValidationError>); 4] = [
            (InvariantKind::EdgeRegistration, validate_edge_registration),
            (InvariantKind::TriangleValidity, validate_triangles),
            (InvariantKind::DuplicateTriangles, validate_no_duplicate_triangles),
            (InvariantKind::ConstraintConformity, validate_constraints),
        ];
        for (kind, check) in checks {
            if let Err(error) = check(self) {
                report.violations.push(InvariantViolation { kind, error });
            }
        }

        if options.check_delaunay {
            if let Some(error) = find_delaunay_violations(self, options.skip_constrained)
                .into_iter()
                .next()
            {
                report.violations.push(InvariantViolation {
                    kind: InvariantKind::Delaunay,
                    error,
                });
            }
        }

        if report.is_empty() {
            Ok(())
        } else {
            tracing::debug!(violations = report.violations.len(), "validation failed");
            Err(report)
        }
    }

    /// Whether every structural invariant holds.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validation_report(ValidationOptions::default()).is_ok()
    }
}
