//! Triangle records stored in the triangulation worklist.
//!
//! A triangle is an ordered triple of point indices `(u, v, w)` wound
//! counter-clockwise in parameter space, plus the bookkeeping the frontal
//! driver needs: a free-form `tag`, a lifecycle [`TriangleStatus`], the shape
//! `quality`, and the size ratio `r`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default tag of a freshly created triangle.
pub const TAG_NONE: i32 = 0;

/// Tag applied by the carving flood fill to triangles outside the domain.
pub const TAG_EXTERIOR: i32 = -1;

/// Tag of a triangle that was accepted without meeting the size criterion.
pub const TAG_FORCED_ACCEPT: i32 = 2;

/// Lifecycle state of a triangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriangleStatus {
    /// Not yet classified.
    #[default]
    NoStatus,
    /// Too large, but not yet adjacent to the front.
    Waiting,
    /// Too large and on the front; a candidate for refinement.
    Active,
    /// Meets the size criterion (or was forced to).
    Accepted,
    /// Scheduled for removal by the next sweep.
    DeleteMe,
}

impl fmt::Display for TriangleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoStatus => "NO_STATUS",
            Self::Waiting => "WAITING",
            Self::Active => "ACTIVE",
            Self::Accepted => "ACCEPTED",
            Self::DeleteMe => "DELETE_ME",
        };
        f.write_str(name)
    }
}

/// A counter-clockwise triangle over point indices.
///
/// # Examples
///
/// ```rust
/// use frontal_delaunay::core::triangle::Triangle;
///
/// let t = Triangle::new(4, 7, 9);
/// assert_eq!(t.opposite(7, 9), Some(4));
/// assert_eq!(t.opposite(9, 7), None);
/// assert!(t.has_vertex(9));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    /// First vertex.
    pub u: usize,
    /// Second vertex.
    pub v: usize,
    /// Third vertex.
    pub w: usize,
    /// Free-form annotation.
    pub tag: i32,
    /// Lifecycle state.
    pub status: TriangleStatus,
    /// Normalised radius ratio, 1 for an equilateral triangle.
    pub quality: f64,
    /// Size ratio against the target edge length.
    pub r: f64,
}

impl Triangle {
    /// Create an unclassified triangle.
    #[must_use]
    pub const fn new(u: usize, v: usize, w: usize) -> Self {
        Self {
            u,
            v,
            w,
            tag: TAG_NONE,
            status: TriangleStatus::NoStatus,
            quality: 0.0,
            r: 0.0,
        }
    }

    /// The vertices in winding order.
    #[must_use]
    #[inline]
    pub const fn vertices(&self) -> [usize; 3] {
        [self.u, self.v, self.w]
    }

    /// The three directed edges in winding order.
    #[must_use]
    #[inline]
    pub const fn edges(&self) -> [(usize, usize); 3] {
        [(self.u, self.v), (self.v, self.w), (self.w, self.u)]
    }

    /// Whether `p` is a vertex of the triangle.
    #[must_use]
    #[inline]
    pub const fn has_vertex(&self, p: usize) -> bool {
        self.u == p || self.v == p || self.w == p
    }

    /// The vertex opposite the directed edge `(a, b)`, if the triangle owns
    /// that directed edge.
    #[must_use]
    pub const fn opposite(&self, a: usize, b: usize) -> Option<usize> {
        if self.u == a && self.v == b {
            Some(self.w)
        } else if self.v == a && self.w == b {
            Some(self.u)
        } else if self.w == a && self.u == b {
            Some(self.v)
        } else {
            None
        }
    }

    /// Whether all three vertex indices differ.
    #[must_use]
    pub const fn has_distinct_vertices(&self) -> bool {
        self.u != self.v && self.v != self.w && self.w != self.u
    }

    /// Vertex set in ascending order, independent of winding start.
    #[must_use]
    pub fn sorted_vertices(&self) -> [usize; 3] {
        let mut vs = self.vertices();
        vs.sort_unstable();
        vs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_follows_winding() {
        let t = Triangle::new(1, 2, 3);
        assert_eq!(t.opposite(1, 2), Some(3));
        assert_eq!(t.opposite(2, 3), Some(1));
        assert_eq!(t.opposite(3, 1), Some(2));
        assert_eq!(t.opposite(2, 1), None);
    }

    #[test]
    fn new_triangle_is_unclassified() {
        let t = Triangle::new(0, 1, 2);
        assert_eq!(t.status, TriangleStatus::NoStatus);
        assert_eq!(t.tag, TAG_NONE);
        assert!(t.has_distinct_vertices());
        assert!(!Triangle::new(0, 1, 1).has_distinct_vertices());
        assert_eq!(Triangle::new(5, 1, 3).sorted_vertices(), [1, 3, 5]);
        assert_eq!(TriangleStatus::DeleteMe.to_string(), "DELETE_ME");
    }
}
