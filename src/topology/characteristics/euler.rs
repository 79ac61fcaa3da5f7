//! Euler characteristic of an exported planar mesh.
//!
//! A triangulated planar domain with `h` holes satisfies `χ = V − E + F = 1 − h`.
//! Counting each interior edge twice and each boundary edge once over the
//! triangles gives `3F = 2E − b`, so also `F = 2V − b − 2 + 2h`.
//!
//! # Examples
//!
//! ```rust
//! use frontal_delaunay::core::mesh::Mesh;
//! use frontal_delaunay::topology::characteristics::euler;
//!
//! let mesh = Mesh {
//!     num_points: 4,
//!     num_triangles: 2,
//!     conn: vec![[0, 1, 2], [0, 2, 3]],
//!     ..Mesh::default()
//! };
//! let counts = euler::count_simplices(&mesh).unwrap();
//! assert_eq!(euler::euler_characteristic(&counts), 1);
//! assert_eq!(counts.boundary_edges, 4);
//! assert!(euler::validate_planar_topology(&mesh, 0).is_ok());
//! ```

use thiserror::Error;

use crate::core::collections::FastHashMap;
use crate::core::mesh::Mesh;

/// Simplex counts of a triangle mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimplexCounts {
    /// Points referenced by at least one triangle.
    pub vertices: usize,
    /// Distinct undirected edges.
    pub edges: usize,
    /// Triangles.
    pub triangles: usize,
    /// Edges used by exactly one triangle.
    pub boundary_edges: usize,
    /// Closed boundary loops.
    pub boundary_loops: usize,
}

/// Errors of the topology checks.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EulerError {
    /// An edge is shared by more than two triangles.
    #[error("Edge ({u}, {v}) is shared by {count} triangles")]
    NonManifoldEdge {
        /// Edge start.
        u: usize,
        /// Edge end.
        v: usize,
        /// Number of triangles using it.
        count: usize,
    },
    /// A triangle references a point outside the mesh.
    #[error("Triangle {triangle} references point {point}, but the mesh has {num_points} points")]
    PointOutOfRange {
        /// Triangle index.
        triangle: usize,
        /// Offending point.
        point: usize,
        /// Number of mesh points.
        num_points: usize,
    },
    /// `V − E + F` differs from `1 − h`.
    #[error("Euler characteristic mismatch: computed χ={computed}, expected χ={expected}")]
    EulerMismatch {
        /// Computed characteristic.
        computed: isize,
        /// Expected characteristic.
        expected: isize,
    },
    /// The triangle count differs from `2V − b − 2 + 2h`.
    #[error("Triangle count mismatch: computed {computed}, expected {expected}")]
    TriangleCountMismatch {
        /// Triangles in the mesh.
        computed: isize,
        /// Count implied by the vertex and boundary counts.
        expected: isize,
    },
}

/// Count vertices, edges, triangles, and boundary edges of a mesh.
///
/// # Errors
///
/// Returns [`EulerError::PointOutOfRange`] for a bad connectivity entry and
/// [`EulerError::NonManifoldEdge`] if an edge has more than two triangles.
pub fn count_simplices(mesh: &Mesh) -> Result<SimplexCounts, EulerError> {
    let mut used = vec![false; mesh.num_points];
    let mut edge_use: FastHashMap<(usize, usize), usize> = FastHashMap::default();

    for (triangle, tri) in mesh.conn.iter().enumerate() {
        for &point in tri {
            let slot = used.get_mut(point).ok_or(EulerError::PointOutOfRange {
                triangle,
                point,
                num_points: mesh.num_points,
            })?;
            *slot = true;
        }
        let [a, b, c] = *tri;
        for (u, v) in [(a, b), (b, c), (c, a)] {
            *edge_use.entry((u.min(v), u.max(v))).or_default() += 1;
        }
    }

    let mut boundary = Vec::new();
    for (&(u, v), &count) in &edge_use {
        match count {
            1 => boundary.push((u, v)),
            2 => {}
            _ => return Err(EulerError::NonManifoldEdge { u, v, count }),
        }
    }

    Ok(SimplexCounts {
        vertices: used.iter().filter(|&&u| u).count(),
        edges: edge_use.len(),
        triangles: mesh.conn.len(),
        boundary_edges: boundary.len(),
        boundary_loops: count_loops(mesh.num_points, &boundary),
    })
}

/// Number of connected components formed by the boundary edges.
fn count_loops(num_points: usize, edges: &[(usize, usize)]) -> usize {
    let mut parent: Vec<usize> = (0..num_points).collect();
    fn root(parent: &mut [usize], mut p: usize) -> usize {
        while parent[p] != p {
            parent[p] = parent[parent[p]];
            p = parent[p];
        }
        p
    }

    let mut loops = 0;
    let mut seen = vec![false; num_points];
    for &(u, v) in edges {
        for p in [u, v] {
            if !seen[p] {
                seen[p] = true;
                loops += 1;
            }
        }
        let (ru, rv) = (root(&mut parent, u), root(&mut parent, v));
        if ru != rv {
            parent[ru] = rv;
            loops -= 1;
        }
    }
    loops
}

/// `χ = V − E + F`.
#[must_use]
#[expect(clippy::cast_possible_wrap, reason = "mesh sizes fit in isize")]
pub const fn euler_characteristic(counts: &SimplexCounts) -> isize {
    counts.vertices as isize - counts.edges as isize + counts.triangles as isize
}

/// Check both Euler relations of a connected planar mesh with `holes` holes.
///
/// # Errors
///
/// Returns [`EulerError::EulerMismatch`] or
/// [`EulerError::TriangleCountMismatch`] when a relation fails, and
/// propagates counting errors.
#[expect(clippy::cast_possible_wrap, reason = "mesh sizes fit in isize")]
pub fn validate_planar_topology(mesh: &Mesh, holes: usize) -> Result<SimplexCounts, EulerError> {
    let counts = count_simplices(mesh)?;
    let h = holes as isize;

    let computed = euler_characteristic(&counts);
    let expected = 1 - h;
    if computed != expected {
        return Err(EulerError::EulerMismatch { computed, expected });
    }

    let expected = 2 * counts.vertices as isize - counts.boundary_edges as isize - 2 + 2 * h;
    let computed = counts.triangles as isize;
    if computed != expected {
        return Err(EulerError::TriangleCountMismatch { computed, expected });
    }
    Ok(counts)
}
