//! Bowyer-Watson point insertion.
//!
//! Inserting a point runs in two phases:
//!
//! 1. **Dig** ([`dig_cavity`](Triangulation::dig_cavity)): starting from the
//!    enclosing triangle, collect every triangle whose circumcircle contains
//!    the new point, never crossing a constrained or boundary edge. This phase
//!    only reads the mesh.
//! 2. **Complete** ([`complete_me`](Triangulation::complete_me)): check that
//!    the cavity is a disk visible from the new point, delete its triangles,
//!    and fan new triangles from the point to every cavity boundary edge.
//!
//! A cavity that fails the check is reported as
//! [`InsertionError::InvalidCavity`] and leaves the mesh untouched, so a bad
//! candidate point never corrupts the triangulation.

use crate::core::algorithms::locate::LocateError;
use crate::core::collections::{FastHashMap, FastHashSet, STAR_BUFFER_SIZE, SmallBuffer};
use crate::core::edge_table::TopologyError;
use crate::core::quadtree::QuadTreeError;
use crate::core::triangle_list::TriangleKey;
use crate::core::triangulation::Triangulation;
use crate::geometry::point::{Point2, Point3};
use crate::geometry::predicates::{Orientation, orientation};
use crate::geometry::surface::{Surface, SurfaceError};

/// Error during point insertion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InsertionError {
    /// The point could not be evaluated on the surface.
    #[error("Surface evaluation failed: {0}")]
    Surface(#[from] SurfaceError),

    /// Point location failed.
    #[error("Location error: {0}")]
    Locate(#[from] LocateError),

    /// The point coincides with an existing point.
    #[error("Point duplicates existing point {existing} (distance {distance})")]
    DuplicatePoint {
        /// The existing point.
        existing: usize,
        /// Distance between the two.
        distance: f64,
    },

    /// The point lies on a constrained or boundary edge.
    #[error("Point {index} lies on constrained edge ({u}, {v})")]
    OnConstrainedEdge {
        /// The point.
        index: usize,
        /// Edge start.
        u: usize,
        /// Edge end.
        v: usize,
    },

    /// The cavity is not a disk visible from the point.
    #[error(
        "Cavity of point {index} is invalid: {deleted} triangles with {boundary} boundary edges"
    )]
    InvalidCavity {
        /// The point.
        index: usize,
        /// Number of triangles in the cavity.
        deleted: usize,
        /// Number of cavity boundary edges.
        boundary: usize,
    },

    /// The point index is unknown or already part of the mesh.
    #[error("Point {index} cannot be inserted: unknown or already in the mesh")]
    InvalidPoint {
        /// The point.
        index: usize,
    },

    /// The quadtree rejected the point.
    #[error("Spatial index error: {0}")]
    QuadTree(#[from] QuadTreeError),

    /// The mesh topology is inconsistent.
    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),
}

impl InsertionError {
    /// Whether the error is a topology violation rather than a rejected
    /// point.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Topology(_))
    }
}

/// Triangles removed by an insertion and the boundary left behind.
#[derive(Clone, Debug, Default)]
pub struct Cavity {
    /// Triangles to delete, in discovery order.
    pub deleted: Vec<TriangleKey>,
    /// Directed cavity boundary edges `(v, w)`; each becomes triangle
    /// `(u, v, w)` with the new point `u`.
    pub boundary: Vec<(usize, usize)>,
    visited: FastHashSet<TriangleKey>,
}

impl Cavity {
    /// Start a cavity from the triangle enclosing the new point.
    #[must_use]
    pub fn new(seed: TriangleKey) -> Self {
        let mut visited = FastHashSet::default();
        visited.insert(seed);
        Self {
            deleted: vec![seed],
            boundary: Vec::new(),
            visited,
        }
    }
}

impl<S: Surface> Triangulation<S> {
    /// Evaluate, store, and insert a new point.
    ///
    /// Returns the index of the new point.
    ///
    /// # Errors
    ///
    /// Returns [`InsertionError`] if the surface cannot evaluate the point,
    /// it duplicates an existing point, it is outside the mesh, or the
    /// cavity is invalid. The triangulation is unchanged on error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use frontal_delaunay::prelude::*;
    ///
    /// let mut tri = Triangulation::with_bounds(
    ///     PlanarSurface,
    ///     Point2::new(0.0, 0.0),
    ///     Point2::new(1.0, 1.0),
    /// )
    /// .unwrap();
    /// let p = tri.add_point(Point2::new(0.5, 0.5)).unwrap();
    /// assert_eq!(p, FIXED_POINT_OFFSET);
    /// assert_eq!(tri.num_triangles(), 4);
    /// ```
    pub fn add_point(&mut self, uv: Point2) -> Result<usize, InsertionError> {
        let xyz = self.surface.eval_point(uv)?;
        self.insert_new_point(uv, xyz, None).map(|(index, _)| index)
    }

    /// Store and insert a point whose surface image is already known.
    pub(crate) fn insert_new_point(
        &mut self,
        uv: Point2,
        xyz: Point3,
        hint: Option<TriangleKey>,
    ) -> Result<(usize, SmallBuffer<TriangleKey, STAR_BUFFER_SIZE>), InsertionError> {
        if let Some((existing, distance)) = self.quadtree.find_closest(uv) {
            if distance <= self.duplicate_tolerance {
                return Err(InsertionError::DuplicatePoint { existing, distance });
            }
        }

        let index = self.push_point(uv, xyz);
        match self.add_point_to_mesh(index, hint) {
            Ok(created) => {
                self.quadtree.add_node(index, uv)?;
                Ok((index, created))
            }
            Err(err) => {
                self.params.pop();
                self.points.pop();
                self.in_mesh.pop();
                self.point_to_triangle.pop();
                Err(err)
            }
        }
    }

    /// Insert the stored point `index` into the mesh.
    ///
    /// Returns the keys of the triangles created around the point. The
    /// quadtree is not updated.
    ///
    /// # Errors
    ///
    /// See [`InsertionError`]; only [`InsertionError::Topology`] leaves the
    /// mesh modified.
    pub fn add_point_to_mesh(
        &mut self,
        index: usize,
        hint: Option<TriangleKey>,
    ) -> Result<SmallBuffer<TriangleKey, STAR_BUFFER_SIZE>, InsertionError> {
        if index >= self.params.len() || self.in_mesh[index] {
            return Err(InsertionError::InvalidPoint { index });
        }
        let uv = self.params[index];
        let seed = self.find_enclosing(uv, hint)?;
        let tri = *self
            .triangles
            .get(seed)
            .ok_or(TopologyError::StaleTriangle)?;

        for (a, b) in tri.edges() {
            if orientation(self.params[a], self.params[b], uv) == Orientation::DEGENERATE
                && (self.edge_in_pslg(a, b) || self.neighbor(a, b).is_none())
            {
                return Err(InsertionError::OnConstrainedEdge { index, u: a, v: b });
            }
        }

        let mut cavity = Cavity::new(seed);
        for (v, w) in tri.edges() {
            self.dig_cavity(index, v, w, &mut cavity);
        }
        let created = self.complete_me(index, &cavity)?;
        self.in_mesh[index] = true;

        tracing::trace!(
            index,
            deleted = cavity.deleted.len(),
            created = created.len(),
            "inserted point"
        );
        Ok(created)
    }

    /// Grow `cavity` across the edge `(v, w)` as seen from the new point `u`.
    ///
    /// The triangle `(w, v, x)` on the far side joins the cavity when `x`
    /// lies inside the circumcircle of `(u, v, w)`, or when `u` does not see
    /// the edge. Constrained and boundary edges are never crossed. Edges that
    /// stop the growth become cavity boundary edges.
    pub fn dig_cavity(&self, u: usize, v: usize, w: usize, cavity: &mut Cavity) {
        let mut stack: SmallBuffer<(usize, usize), STAR_BUFFER_SIZE> = SmallBuffer::new();
        stack.push((v, w));

        while let Some((v, w)) = stack.pop() {
            let Some((key, x)) = self.neighbor(v, w) else {
                cavity.boundary.push((v, w));
                continue;
            };
            if cavity.visited.contains(&key) {
                continue;
            }
            if self.edge_in_pslg(v, w) {
                cavity.boundary.push((v, w));
                continue;
            }

            let visible = orientation(self.params[u], self.params[v], self.params[w])
                == Orientation::POSITIVE;
            if !visible || self.is_illegal(u, v, w, x) {
                cavity.visited.insert(key);
                cavity.deleted.push(key);
                stack.push((x, w));
                stack.push((v, x));
            } else {
                cavity.boundary.push((v, w));
            }
        }
    }

    /// Replace the cavity by the fan of triangles `(u, v, w)` over its
    /// boundary edges.
    ///
    /// # Errors
    ///
    /// Returns [`InsertionError::InvalidCavity`], without modifying the mesh,
    /// unless the boundary is a single simple cycle of edges all seen
    /// counter-clockwise from `u`. Topology errors propagate.
    pub fn complete_me(
        &mut self,
        u: usize,
        cavity: &Cavity,
    ) -> Result<SmallBuffer<TriangleKey, STAR_BUFFER_SIZE>, InsertionError> {
        if !self.is_valid_cavity(u, cavity) {
            return Err(InsertionError::InvalidCavity {
                index: u,
                deleted: cavity.deleted.len(),
                boundary: cavity.boundary.len(),
            });
        }

        for &key in &cavity.deleted {
            self.delete_triangle(key)?;
        }
        let mut created = SmallBuffer::new();
        for &(v, w) in &cavity.boundary {
            created.push(self.add_triangle(u, v, w)?);
        }
        Ok(created)
    }

    fn is_valid_cavity(&self, u: usize, cavity: &Cavity) -> bool {
        // A disk of k triangles with all vertices on its boundary has k + 2
        // boundary edges; a swallowed vertex or a hole breaks the count.
        if cavity.boundary.len() != cavity.deleted.len() + 2 {
            return false;
        }

        let pu = self.params[u];
        let mut degree: FastHashMap<usize, (u8, u8)> = FastHashMap::default();
        for &(v, w) in &cavity.boundary {
            if orientation(pu, self.params[v], self.params[w]) != Orientation::POSITIVE {
                return false;
            }
            degree.entry(v).or_default().0 += 1;
            degree.entry(w).or_default().1 += 1;
        }
        degree.values().all(|&d| d == (1, 1))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::triangulation::FIXED_POINT_OFFSET;
    use crate::geometry::predicates::{InCircle, in_circle};
    use crate::geometry::surface::PlanarSurface;

    fn empty_unit_square() -> Triangulation<PlanarSurface> {
        Triangulation::with_bounds(PlanarSurface, Point2::new(0.0, 0.0), Point2::new(1.0, 1.0))
            .unwrap()
    }

    fn assert_delaunay(tri: &Triangulation<PlanarSurface>) {
        for (_, t) in tri.triangles() {
            let [a, b, c] = t.vertices().map(|i| tri.params()[i]);
            for (i, &p) in tri.params().iter().enumerate() {
                if t.has_vertex(i) || !tri.is_in_mesh(i) {
                    continue;
                }
                assert_ne!(
                    in_circle(a, b, c, p),
                    InCircle::INSIDE,
                    "point {i} inside circumcircle of {t:?}"
                );
            }
        }
    }

    #[test]
    fn incremental_insertion_stays_delaunay() {
        let mut tri = empty_unit_square();
        let mut state = 12_345_u64;
        for _ in 0..60 {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            #[expect(clippy::cast_precision_loss)]
            let x = (state >> 11) as f64 / (1u64 << 53) as f64;
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            #[expect(clippy::cast_precision_loss)]
            let y = (state >> 11) as f64 / (1u64 << 53) as f64;
            tri.add_point(Point2::new(x, y)).unwrap();
        }
        // Euler: 2n - 2 - h triangles for n points with h = 4 hull points.
        assert_eq!(tri.num_triangles(), 2 * tri.num_points() - 2 - 4);
        assert_delaunay(&tri);
    }

    #[test]
    fn point_on_edge_splits_both_triangles() {
        let mut tri = empty_unit_square();
        // The frame diagonal runs (0) -> (2) through the centre of the box.
        let created = tri.insert_new_point(
            Point2::new(0.5, 0.5),
            Point3::new(0.5, 0.5, 0.0),
            None,
        );
        let (index, created) = created.unwrap();
        assert_eq!(index, FIXED_POINT_OFFSET);
        assert_eq!(created.len(), 4);
        assert_eq!(tri.num_triangles(), 4);
        assert_delaunay(&tri);
    }

    #[test]
    fn duplicate_and_outside_points_are_rejected() {
        let mut tri = empty_unit_square();
        tri.add_point(Point2::new(0.25, 0.75)).unwrap();
        assert!(matches!(
            tri.add_point(Point2::new(0.25, 0.75)),
            Err(InsertionError::DuplicatePoint { existing, .. }) if existing == FIXED_POINT_OFFSET
        ));
        assert!(matches!(
            tri.add_point(Point2::new(5.0, 0.5)),
            Err(InsertionError::Locate(LocateError::OutsideDomain { .. }))
        ));
        // Rejected points leave no trace.
        assert_eq!(tri.num_points(), FIXED_POINT_OFFSET + 1);
        assert_eq!(tri.num_triangles(), 4);
    }

    #[test]
    fn points_on_the_frame_boundary_are_rejected() {
        let mut tri = empty_unit_square();
        let err = tri.add_point(Point2::new(0.5, -0.1)).unwrap_err();
        assert!(matches!(err, InsertionError::OnConstrainedEdge { u: 0, v: 1, .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn invalid_indices_are_rejected() {
        let mut tri = empty_unit_square();
        assert_eq!(
            tri.add_point_to_mesh(0, None),
            Err(InsertionError::InvalidPoint { index: 0 })
        );
        assert_eq!(
            tri.add_point_to_mesh(99, None),
            Err(InsertionError::InvalidPoint { index: 99 })
        );
    }
}
