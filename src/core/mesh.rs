//! Compact mesh export.
//!
//! [`Triangulation::get_mesh`] strips the frame, merges degenerate point
//! pairs, and renumbers the remaining points densely.

use serde::{Deserialize, Serialize};

use crate::core::triangulation::Triangulation;
use crate::geometry::point::{Point2, Point3};
use crate::geometry::surface::Surface;

/// A triangle mesh with dense, zero-based point numbering.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Number of points.
    pub num_points: usize,
    /// Number of triangles.
    pub num_triangles: usize,
    /// Counter-clockwise triangle connectivity.
    pub conn: Vec<[usize; 3]>,
    /// Parametric coordinates, one per point.
    pub params: Vec<Point2>,
    /// Surface coordinates, one per point.
    pub points: Vec<Point3>,
}

impl Mesh {
    /// Whether the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conn.is_empty()
    }

    /// Undirected edges of the mesh, each once, as sorted pairs.
    #[must_use]
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self
            .conn
            .iter()
            .flat_map(|&[a, b, c]| [(a, b), (b, c), (c, a)])
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }
}

impl<S: Surface> Triangulation<S> {
    /// Export the live triangles without frame points.
    ///
    /// Points are renumbered in increasing order of their internal index, so
    /// repeated calls on an unchanged triangulation return identical meshes.
    /// Pairs registered with
    /// [`remove_degenerate_edges`](Self::remove_degenerate_edges) are merged
    /// first and triangles that collapse are dropped.
    #[must_use]
    pub fn get_mesh(&self) -> Mesh {
        let n = self.params.len();
        let mut target: Vec<usize> = (0..n).collect();
        for &(keep, merge) in &self.degenerate_pairs {
            let root = find_root(&target, keep);
            let other = find_root(&target, merge);
            if root != other {
                target[other] = root;
            }
        }
        let target: Vec<usize> = (0..n).map(|i| find_root(&target, i)).collect();

        let mut conn_internal: Vec<[usize; 3]> = Vec::with_capacity(self.triangles.len());
        for (_, t) in self.triangles.iter() {
            if t.vertices().iter().any(|&p| self.is_frame_point(p)) {
                continue;
            }
            let [a, b, c] = t.vertices().map(|p| target[p]);
            if a == b || b == c || c == a {
                continue;
            }
            conn_internal.push([a, b, c]);
        }

        let mut renumber: Vec<Option<usize>> = vec![None; n];
        for tri in &conn_internal {
            for &p in tri {
                renumber[p] = Some(0);
            }
        }
        let mut params = Vec::new();
        let mut points = Vec::new();
        for (p, slot) in renumber.iter_mut().enumerate() {
            if slot.is_some() {
                *slot = Some(params.len());
                params.push(self.params[p]);
                points.push(self.points[p]);
            }
        }

        let conn: Vec<[usize; 3]> = conn_internal
            .into_iter()
            .filter_map(|[a, b, c]| Some([renumber[a]?, renumber[b]?, renumber[c]?]))
            .collect();

        Mesh {
            num_points: params.len(),
            num_triangles: conn.len(),
            conn,
            params,
            points,
        }
    }
}

fn find_root(target: &[usize], mut p: usize) -> usize {
    while target[p] != p {
        p = target[p];
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::triangulation::FIXED_POINT_OFFSET;
    use crate::geometry::surface::PlanarSurface;

    fn square_with_center() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
            Point2::new(0.5, 0.4),
        ]
    }

    #[test]
    fn export_is_dense_and_frame_free() {
        let tri =
            Triangulation::triangulate(PlanarSurface, &square_with_center(), &[], &[]).unwrap();
        let mesh = tri.get_mesh();
        assert_eq!(mesh.num_points, 5);
        assert_eq!(mesh.num_triangles, 4);
        assert_eq!(mesh.params[0], Point2::new(0.0, 0.0));
        assert_eq!(mesh.params[4], Point2::new(0.5, 0.4));
        assert!(mesh.conn.iter().flatten().all(|&p| p < 5));
        assert_eq!(mesh.edges().len(), 8);
        assert_eq!(mesh, tri.get_mesh());
    }

    #[test]
    fn degenerate_pairs_collapse_triangles() {
        let mut tri =
            Triangulation::triangulate(PlanarSurface, &square_with_center(), &[], &[]).unwrap();
        // Merge the bottom-right corner into the bottom-left one.
        tri.remove_degenerate_edges(&[(FIXED_POINT_OFFSET, FIXED_POINT_OFFSET + 1)])
            .unwrap();
        let mesh = tri.get_mesh();
        assert_eq!(mesh.num_points, 4);
        assert_eq!(mesh.num_triangles, 3);
        assert!(mesh.params.iter().all(|p| *p != Point2::new(1.0, 0.0)));
    }
}
