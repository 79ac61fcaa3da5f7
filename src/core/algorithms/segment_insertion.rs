//! Constrained segment recovery.
//!
//! A segment `(u, v)` that is not already a mesh edge is recovered by walking
//! from `u` towards `v` through the triangles it crosses, collecting the
//! vertices left and right of the segment. The crossed triangles are deleted
//! and each side of the segment is re-triangulated independently by gift
//! wrapping: the base edge is joined to the chain vertex whose circle through
//! the base contains no other chain vertex, and both remaining sub-polygons
//! are wrapped recursively.
//!
//! A mesh vertex lying exactly on the segment splits it; both parts are
//! recovered and marked constrained.

use crate::core::collections::{CHAIN_BUFFER_SIZE, SmallBuffer, undirected};
use crate::core::edge_table::TopologyError;
use crate::core::triangle_list::TriangleKey;
use crate::core::triangulation::Triangulation;
use crate::geometry::predicates::{InCircle, Orientation, orientation};
use crate::geometry::surface::Surface;

/// Error during segment recovery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    /// The segment crosses an edge that is already constrained.
    #[error("Segment ({u}, {v}) crosses constrained edge ({a}, {b})")]
    CrossesConstraint {
        /// Segment start.
        u: usize,
        /// Segment end.
        v: usize,
        /// Constrained edge start.
        a: usize,
        /// Constrained edge end.
        b: usize,
    },

    /// The segment leaves the triangulated region.
    #[error("Segment ({u}, {v}) leaves the meshed domain")]
    LeavesDomain {
        /// Segment start.
        u: usize,
        /// Segment end.
        v: usize,
    },

    /// An end point is not a mesh vertex.
    #[error("Segment end point {index} is not part of the mesh")]
    MissingEndpoint {
        /// The missing point.
        index: usize,
    },

    /// The mesh topology is inconsistent.
    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),
}

/// How a segment leaves its start vertex.
enum SegmentStart {
    /// Along an existing edge to a vertex on the segment.
    Vertex(usize),
    /// Through the edge `(right, left)` of triangle `key`.
    Crossing {
        key: TriangleKey,
        right: usize,
        left: usize,
    },
}

impl<S: Surface> Triangulation<S> {
    /// Force the segment `(u, v)` into the mesh and mark it constrained.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError`] if an end point is missing, the segment
    /// crosses a constrained edge or leaves the mesh. The mesh is not
    /// modified in those cases. Topology errors propagate.
    pub fn insert_segment(&mut self, u: usize, v: usize) -> Result<(), SegmentError> {
        for index in [u, v] {
            if !self.is_in_mesh(index) {
                return Err(SegmentError::MissingEndpoint { index });
            }
        }

        let mut a = u;
        let limit = self.params.len();
        for _ in 0..limit {
            if a == v {
                return Ok(());
            }
            if self.edges.contains(a, v) || self.edges.contains(v, a) {
                self.pslg.insert(undirected(a, v));
                return Ok(());
            }

            let end = match self.segment_start(a, v)? {
                SegmentStart::Vertex(c) => c,
                SegmentStart::Crossing { key, right, left } => {
                    self.recover_segment(a, v, key, right, left)?
                }
            };
            if end != v {
                tracing::debug!(u, v, split = end, "segment passes through a vertex");
            }
            self.pslg.insert(undirected(a, end));
            a = end;
        }
        Err(SegmentError::LeavesDomain { u, v })
    }

    /// Locate the first triangle or edge the segment `(a, v)` enters.
    fn segment_start(&self, a: usize, v: usize) -> Result<SegmentStart, SegmentError> {
        let pa = self.params[a];
        let pv = self.params[v];
        let dir = pv - pa;
        let len2 = dir.dot(dir);

        let on_segment = |p: usize| {
            let d = self.params[p] - pa;
            orientation(pa, pv, self.params[p]) == Orientation::DEGENERATE
                && d.dot(dir) > 0.0
                && d.dot(d) < len2
        };

        for key in self.star(a) {
            let Some((p, q)) = self.fan_edge(key, a) else {
                continue;
            };
            if on_segment(p) {
                return Ok(SegmentStart::Vertex(p));
            }
            if on_segment(q) {
                return Ok(SegmentStart::Vertex(q));
            }
            if orientation(pa, pv, self.params[p]) == Orientation::NEGATIVE
                && orientation(pa, pv, self.params[q]) == Orientation::POSITIVE
            {
                return Ok(SegmentStart::Crossing {
                    key,
                    right: p,
                    left: q,
                });
            }
        }
        Err(SegmentError::LeavesDomain { u: a, v })
    }

    /// Delete the triangles crossed by `(a, v)` and gift-wrap both sides.
    ///
    /// Returns the vertex the recovered edge ends at: `v`, or a vertex lying
    /// on the segment.
    fn recover_segment(
        &mut self,
        a: usize,
        v: usize,
        first: TriangleKey,
        right: usize,
        left: usize,
    ) -> Result<usize, SegmentError> {
        let pa = self.params[a];
        let pv = self.params[v];

        let mut crossed = vec![first];
        let mut left_chain: SmallBuffer<usize, CHAIN_BUFFER_SIZE> = SmallBuffer::new();
        let mut right_chain: SmallBuffer<usize, CHAIN_BUFFER_SIZE> = SmallBuffer::new();
        left_chain.push(left);
        right_chain.push(right);

        let (mut r, mut l) = (right, left);
        let end = loop {
            if self.edge_in_pslg(r, l) {
                return Err(SegmentError::CrossesConstraint {
                    u: a,
                    v,
                    a: r,
                    b: l,
                });
            }
            let (key, c) = self
                .neighbor(r, l)
                .ok_or(SegmentError::LeavesDomain { u: a, v })?;
            if crossed.len() > self.triangles.len() {
                return Err(SegmentError::LeavesDomain { u: a, v });
            }
            crossed.push(key);

            if c == v {
                break v;
            }
            match orientation(pa, pv, self.params[c]) {
                Orientation::POSITIVE => {
                    left_chain.push(c);
                    l = c;
                }
                Orientation::NEGATIVE => {
                    right_chain.push(c);
                    r = c;
                }
                Orientation::DEGENERATE => break c,
            }
        };

        for key in crossed {
            self.delete_triangle(key)?;
        }
        self.gift_wrap(a, end, &left_chain)?;
        right_chain.reverse();
        self.gift_wrap(end, a, &right_chain)?;
        Ok(end)
    }

    /// Triangulate the polygon `p0, chain..., p1` lying left of `p0 → p1`.
    ///
    /// `chain` is ordered from `p0` to `p1`.
    ///
    /// # Errors
    ///
    /// Propagates [`TopologyError`] from [`add_triangle`](Self::add_triangle),
    /// including [`TopologyError::Inverted`] when the chain is not ordered
    /// from `p0` to `p1`.
    pub fn gift_wrap(
        &mut self,
        p0: usize,
        p1: usize,
        chain: &[usize],
    ) -> Result<(), TopologyError> {
        if chain.is_empty() {
            return Ok(());
        }

        let mut best = 0;
        for j in 1..chain.len() {
            if self.in_circle(p0, p1, chain[best], chain[j]) == InCircle::INSIDE {
                best = j;
            }
        }
        let c = chain[best];
        self.add_triangle(p0, p1, c)?;
        self.gift_wrap(p0, c, &chain[..best])?;
        self.gift_wrap(c, p1, &chain[best + 1..])
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::triangulation::FIXED_POINT_OFFSET;
    use crate::geometry::point::Point2;
    use crate::geometry::surface::PlanarSurface;

    const O: usize = FIXED_POINT_OFFSET;

    /// A wide, flat hexagon whose Delaunay triangulation does not contain
    /// the long horizontal diagonal.
    fn flat_hexagon() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, -1.0),
            Point2::new(4.0, -1.0),
            Point2::new(6.0, 0.0),
            Point2::new(4.0, 1.0),
            Point2::new(2.0, 1.0),
        ]
    }

    #[test]
    fn missing_diagonal_is_recovered() {
        let pts = flat_hexagon();
        let tri = Triangulation::triangulate(PlanarSurface, &pts, &[], &[]).unwrap();
        assert!(tri.edge_owner(O, O + 3).is_none() && tri.edge_owner(O + 3, O).is_none());

        let mut segs: Vec<(usize, usize)> = (0..6).map(|i| (i, (i + 1) % 6)).collect();
        segs.push((0, 3));
        let tri = Triangulation::triangulate(PlanarSurface, &pts, &segs, &[]).unwrap();

        assert!(tri.edge_owner(O, O + 3).is_some());
        assert!(tri.edge_owner(O + 3, O).is_some());
        assert!(tri.edge_in_pslg(O + 3, O));
        assert_eq!(tri.num_triangles(), 4);
        assert!(tri.diagnostics().failed_segments.is_empty());
    }

    #[test]
    fn segment_through_vertex_is_split() {
        let mut pts = flat_hexagon();
        pts.push(Point2::new(3.0, 0.0));
        let mut segs: Vec<(usize, usize)> = (0..6).map(|i| (i, (i + 1) % 6)).collect();
        segs.push((0, 3));
        let tri = Triangulation::triangulate(PlanarSurface, &pts, &segs, &[]).unwrap();

        assert!(tri.edge_in_pslg(O, O + 6));
        assert!(tri.edge_in_pslg(O + 6, O + 3));
        assert!(!tri.edge_in_pslg(O, O + 3));
        assert!(tri.edge_owner(O, O + 6).is_some());
        assert!(tri.edge_owner(O + 6, O + 3).is_some());
    }

    #[test]
    fn crossing_constraints_are_reported() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let segs = [(0, 1), (1, 2), (2, 3), (3, 0), (0, 2), (1, 3)];
        let tri = Triangulation::triangulate(PlanarSurface, &pts, &segs, &[]).unwrap();

        let failed = &tri.diagnostics().failed_segments;
        assert_eq!(failed.len(), 1);
        assert_eq!((failed[0].u, failed[0].v), (O + 1, O + 3));
        assert!(matches!(failed[0].error, SegmentError::CrossesConstraint { .. }));
        assert!(tri.edge_in_pslg(O, O + 2));
    }

    #[test]
    fn gift_wrap_fans_a_convex_chain() {
        let mut tri = Triangulation::with_bounds(
            PlanarSurface,
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
        )
        .unwrap();
        // Clear the frame triangles and wrap the frame square from its base.
        for key in tri.triangles.keys().collect::<Vec<_>>() {
            tri.delete_triangle(key).unwrap();
        }
        // Walking the polygon from 0 to 1 on its left side visits 3, then 2.
        tri.gift_wrap(0, 1, &[3, 2]).unwrap();
        assert_eq!(tri.num_triangles(), 2);
        assert!(tri.edge_owner(0, 1).is_some());
        assert!(tri.edge_owner(1, 2).is_some());
        assert!(tri.edge_owner(2, 3).is_some());
        assert!(tri.edge_owner(3, 0).is_some());
        assert!(tri.is_valid());
    }

    #[test]
    fn gift_wrap_refuses_a_reversed_chain() {
        let mut tri = Triangulation::with_bounds(
            PlanarSurface,
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
        )
        .unwrap();
        for key in tri.triangles.keys().collect::<Vec<_>>() {
            tri.delete_triangle(key).unwrap();
        }
        // Ordered from 1 back to 0, the second fan triangle would be clockwise.
        assert!(matches!(
            tri.gift_wrap(0, 1, &[2, 3]),
            Err(TopologyError::Inverted { .. })
        ));
        assert_eq!(tri.num_triangles(), 1);
        assert!(tri.is_valid());
    }
}
