//! Point location by visibility walk.
//!
//! The walk starts from a hint triangle (or the triangle of the nearest
//! indexed point) and repeatedly crosses an edge that has the query point on
//! its outer side, until no such edge remains. The edge tested first rotates
//! with every step so the walk cannot cycle on a degenerate configuration.
//!
//! In a carved, non-convex domain the walk may leave through a boundary edge
//! although the point lies elsewhere inside the domain; location then falls
//! back to a linear scan.
//!
//! # References
//!
//! - O. Devillers, S. Pion, and M. Teillaud, "Walking in a Triangulation",
//!   International Journal of Foundations of Computer Science, 2001.

use crate::core::triangle_list::TriangleKey;
use crate::core::triangulation::Triangulation;
use crate::geometry::point::Point2;
use crate::geometry::predicates::{Orientation, orientation};
use crate::geometry::surface::Surface;

/// Error during point location.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocateError {
    /// Triangulation has no triangles.
    #[error("Cannot locate in empty triangulation")]
    EmptyTriangulation,

    /// The point is not inside any triangle.
    #[error("Point ({x}, {y}) lies outside the meshed domain")]
    OutsideDomain {
        /// First parameter.
        x: f64,
        /// Second parameter.
        y: f64,
    },

    /// Cycle detected during walking (numerical issues).
    #[error("Cycle detected after {steps} steps - possible numerical degeneracy")]
    CycleDetected {
        /// Number of steps before cycle detection.
        steps: usize,
    },
}

impl<S: Surface> Triangulation<S> {
    /// Find the triangle enclosing `uv`.
    ///
    /// Points on an edge may be reported in either adjacent triangle.
    ///
    /// # Errors
    ///
    /// Returns [`LocateError::OutsideDomain`] if no triangle encloses the
    /// point and [`LocateError::EmptyTriangulation`] if there are no
    /// triangles.
    pub fn find_enclosing(
        &self,
        uv: Point2,
        hint: Option<TriangleKey>,
    ) -> Result<TriangleKey, LocateError> {
        let start = hint
            .filter(|&k| self.triangles.contains(k))
            .or_else(|| self.nearest_point_triangle(uv))
            .or_else(|| self.triangles.head())
            .ok_or(LocateError::EmptyTriangulation)?;

        match self.walk(start, uv) {
            Ok(key) => Ok(key),
            Err(err) => {
                tracing::debug!(%err, ?uv, "walk failed; scanning all triangles");
                self.locate_linear(uv).ok_or(match err {
                    LocateError::CycleDetected { .. } => {
                        LocateError::OutsideDomain { x: uv.x, y: uv.y }
                    }
                    other => other,
                })
            }
        }
    }

    /// Whether `uv` lies inside or on the boundary of triangle `key`.
    #[must_use]
    pub fn enclosed(&self, key: TriangleKey, uv: Point2) -> bool {
        self.triangles.get(key).is_some_and(|t| {
            t.edges().into_iter().all(|(a, b)| {
                orientation(self.params[a], self.params[b], uv) != Orientation::NEGATIVE
            })
        })
    }

    /// First triangle, in worklist order, enclosing `uv`.
    #[must_use]
    pub fn locate_linear(&self, uv: Point2) -> Option<TriangleKey> {
        self.triangles.keys().find(|&k| self.enclosed(k, uv))
    }

    fn nearest_point_triangle(&self, uv: Point2) -> Option<TriangleKey> {
        let (id, _) = self.quadtree.find_closest(uv)?;
        self.point_to_triangle
            .get(id)
            .copied()
            .flatten()
            .filter(|&k| self.triangles.contains(k))
    }

    fn walk(&self, start: TriangleKey, uv: Point2) -> Result<TriangleKey, LocateError> {
        let max_steps = 4 * self.triangles.len() + 64;
        let mut current = start;

        for step in 0..max_steps {
            let Some(tri) = self.triangles.get(current) else {
                return Err(LocateError::EmptyTriangulation);
            };
            let vs = tri.vertices();

            let mut next = None;
            for i in 0..3 {
                let e = (step + i) % 3;
                let (a, b) = (vs[e], vs[(e + 1) % 3]);
                if orientation(self.params[a], self.params[b], uv) == Orientation::NEGATIVE {
                    next = Some(
                        self.edges
                            .get(b, a)
                            .ok_or(LocateError::OutsideDomain { x: uv.x, y: uv.y })?,
                    );
                    break;
                }
            }

            match next {
                Some(key) => current = key,
                None => return Ok(current),
            }
        }

        Err(LocateError::CycleDetected { steps: max_steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::surface::PlanarSurface;

    fn grid() -> Triangulation<PlanarSurface> {
        let mut pts = Vec::new();
        for i in 0..6 {
            for j in 0..6 {
                pts.push(Point2::new(f64::from(i), f64::from(j) + 0.01 * f64::from(i)));
            }
        }
        Triangulation::triangulate(PlanarSurface, &pts, &[], &[]).unwrap()
    }

    #[test]
    fn walk_finds_enclosing_triangle_from_any_start() {
        let tri = grid();
        let q = Point2::new(3.3, 2.6);
        for (start, _) in tri.triangles() {
            let key = tri.find_enclosing(q, Some(start)).unwrap();
            assert!(tri.enclosed(key, q));
        }
    }

    #[test]
    fn outside_points_are_reported() {
        let tri = grid();
        assert_eq!(
            tri.find_enclosing(Point2::new(-0.5, 2.0), None),
            Err(LocateError::OutsideDomain { x: -0.5, y: 2.0 })
        );
        assert!(tri.locate_linear(Point2::new(7.0, 7.0)).is_none());
    }

    #[test]
    fn vertices_are_enclosed_by_their_triangles() {
        let tri = grid();
        let p = tri.params()[10];
        let key = tri.find_enclosing(p, None).unwrap();
        assert!(tri.enclosed(key, p));
    }
}
