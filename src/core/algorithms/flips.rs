//! Lawson edge flips for Delaunay repair.
//!
//! Every unconstrained interior edge whose two triangles form a convex
//! quadrilateral and fail the in-circle test is replaced by the other
//! diagonal. Flipped edges push the four outer edges of their quadrilateral
//! back onto the work stack, so the pass ends once every edge is locally
//! Delaunay.
//!
//! # References
//!
//! - C. L. Lawson, "Software for C1 Surface Interpolation", 1977.

use crate::core::edge_table::TopologyError;
use crate::core::triangulation::Triangulation;
use crate::geometry::predicates::{Orientation, orientation};
use crate::geometry::surface::Surface;

/// Work stack iterations allowed per initial edge before the pass gives up.
const FLIP_BUDGET_PER_EDGE: usize = 16;

impl<S: Surface> Triangulation<S> {
    /// Flip unconstrained edges until every edge is locally Delaunay.
    ///
    /// Returns the number of flips performed.
    ///
    /// # Errors
    ///
    /// Propagates [`TopologyError`] if the edge table and triangle list
    /// disagree.
    pub fn delaunay_edge_flip(&mut self) -> Result<usize, TopologyError> {
        let mut stack: Vec<(usize, usize)> = self
            .triangles
            .iter()
            .flat_map(|(_, t)| t.edges())
            .filter(|&(a, b)| a < b)
            .collect();
        let budget = FLIP_BUDGET_PER_EDGE * (stack.len() + 1);

        let mut flips = 0;
        let mut iterations = 0;
        while let Some((a, b)) = stack.pop() {
            iterations += 1;
            if iterations > budget {
                tracing::warn!(flips, pending = stack.len(), "edge flip budget exhausted");
                break;
            }
            if let Some([c, d]) = self.flip_edge(a, b)? {
                flips += 1;
                stack.extend([(a, d), (d, b), (b, c), (c, a)]);
            }
        }

        tracing::debug!(flips, iterations, "edge flip pass finished");
        Ok(flips)
    }

    /// Flip the edge `(a, b)` if it is unconstrained, interior and not
    /// locally Delaunay.
    ///
    /// On success returns the vertices `[c, d]` opposite the edge in the
    /// triangles `(a, b, c)` and `(b, a, d)`; `(c, d)` is the new edge.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::StaleTriangle`] if an edge owner is not a
    /// live triangle containing the edge.
    pub fn flip_edge(&mut self, a: usize, b: usize) -> Result<Option<[usize; 2]>, TopologyError> {
        if self.edge_in_pslg(a, b) {
            return Ok(None);
        }
        let (Some(t1), Some(t2)) = (self.edges.get(a, b), self.edges.get(b, a)) else {
            return Ok(None);
        };
        let c = self
            .triangles
            .get(t1)
            .and_then(|t| t.opposite(a, b))
            .ok_or(TopologyError::StaleTriangle)?;
        let d = self
            .triangles
            .get(t2)
            .and_then(|t| t.opposite(b, a))
            .ok_or(TopologyError::StaleTriangle)?;

        if !self.is_illegal(c, a, b, d) {
            return Ok(None);
        }
        // Only a convex quadrilateral can be re-split along (c, d).
        let [pa, pb, pc, pd] = [a, b, c, d].map(|i| self.params[i]);
        if orientation(pa, pd, pc) != Orientation::POSITIVE
            || orientation(pd, pb, pc) != Orientation::POSITIVE
        {
            return Ok(None);
        }

        self.delete_triangle(t1)?;
        self.delete_triangle(t2)?;
        self.add_triangle(a, d, c)?;
        self.add_triangle(d, b, c)?;
        Ok(Some([c, d]))
    }
}
