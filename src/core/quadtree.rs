//! Point quadtree over parameter space.
//!
//! The tree is an arena of nodes addressed by index. A leaf stores up to
//! [`NODES_PER_LEVEL`] `(id, point)` entries; one more entry splits it at its
//! midpoint into four quadrants `low_left`, `low_right`, `up_left` and
//! `up_right`. Leaves at [`MAX_DEPTH`] never split and degrade to a linear
//! bucket.
//!
//! The triangulation mirrors every inserted point (frame points included)
//! into the tree and uses [`QuadTree::find_closest`] both to detect
//! duplicates and to seed point location.

use crate::geometry::point::Point2;
use thiserror::Error;

/// Maximum depth of the tree; leaves at this depth never split.
pub const MAX_DEPTH: usize = 30;

/// Leaf capacity before splitting.
pub const NODES_PER_LEVEL: usize = 10;

/// Errors raised by quadtree updates.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum QuadTreeError {
    /// The point to delete is not stored in the tree.
    #[error("Point {id} is not stored in the quadtree")]
    NotFound {
        /// Point index.
        id: usize,
    },
    /// The point lies outside the tree's domain.
    #[error("Point ({x}, {y}) lies outside the quadtree domain")]
    OutsideDomain {
        /// First coordinate.
        x: f64,
        /// Second coordinate.
        y: f64,
    },
}

const LOW_LEFT: usize = 0;
const LOW_RIGHT: usize = 1;
const UP_LEFT: usize = 2;
const UP_RIGHT: usize = 3;

#[derive(Clone, Debug)]
enum NodeKind {
    Leaf(Vec<(usize, Point2)>),
    Branch([usize; 4]),
}

#[derive(Clone, Debug)]
struct QuadNode {
    low: Point2,
    high: Point2,
    depth: usize,
    kind: NodeKind,
}

impl QuadNode {
    fn leaf(low: Point2, high: Point2, depth: usize) -> Self {
        Self {
            low,
            high,
            depth,
            kind: NodeKind::Leaf(Vec::new()),
        }
    }

    fn quadrant(&self, p: Point2) -> usize {
        let mid = self.low.midpoint(self.high);
        match (p.x >= mid.x, p.y >= mid.y) {
            (false, false) => LOW_LEFT,
            (true, false) => LOW_RIGHT,
            (false, true) => UP_LEFT,
            (true, true) => UP_RIGHT,
        }
    }

    /// Squared distance from `p` to the node rectangle.
    fn distance_squared(&self, p: Point2) -> f64 {
        let dx = (self.low.x - p.x).max(0.0).max(p.x - self.high.x);
        let dy = (self.low.y - p.y).max(0.0).max(p.y - self.high.y);
        dx * dx + dy * dy
    }
}

/// Arena-backed point quadtree.
///
/// # Examples
///
/// ```rust
/// use frontal_delaunay::core::quadtree::QuadTree;
/// use frontal_delaunay::geometry::point::Point2;
///
/// let mut tree = QuadTree::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
/// tree.add_node(0, Point2::new(0.1, 0.1)).unwrap();
/// tree.add_node(1, Point2::new(0.9, 0.8)).unwrap();
///
/// let (id, dist) = tree.find_closest(Point2::new(0.8, 0.8)).unwrap();
/// assert_eq!(id, 1);
/// assert!((dist - 0.1).abs() < 1e-12);
/// ```
#[derive(Clone, Debug)]
pub struct QuadTree {
    nodes: Vec<QuadNode>,
    len: usize,
}

impl QuadTree {
    /// Create an empty tree over the rectangle `[low, high]`.
    #[must_use]
    pub fn new(low: Point2, high: Point2) -> Self {
        Self {
            nodes: vec![QuadNode::leaf(low, high, 0)],
            len: 0,
        }
    }

    /// Number of stored points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Deepest level currently in use.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Whether `p` lies inside the tree's domain.
    #[must_use]
    pub fn contains_point(&self, p: Point2) -> bool {
        self.nodes[0].distance_squared(p) == 0.0 && p.is_finite()
    }

    /// Insert point `id` at `pt`.
    ///
    /// # Errors
    ///
    /// Returns [`QuadTreeError::OutsideDomain`] if `pt` is outside the root
    /// rectangle.
    pub fn add_node(&mut self, id: usize, pt: Point2) -> Result<(), QuadTreeError> {
        if !self.contains_point(pt) {
            return Err(QuadTreeError::OutsideDomain { x: pt.x, y: pt.y });
        }
        self.insert_at(0, id, pt);
        self.len += 1;
        Ok(())
    }

    /// Remove point `id`, stored at `pt`.
    ///
    /// # Errors
    ///
    /// Returns [`QuadTreeError::NotFound`] if the leaf covering `pt` does not
    /// hold `id`.
    pub fn delete_node(&mut self, id: usize, pt: Point2) -> Result<(), QuadTreeError> {
        let mut idx = 0;
        loop {
            let quadrant = self.nodes[idx].quadrant(pt);
            match &mut self.nodes[idx].kind {
                NodeKind::Branch(children) => idx = children[quadrant],
                NodeKind::Leaf(points) => {
                    let pos = points
                        .iter()
                        .position(|&(pid, _)| pid == id)
                        .ok_or(QuadTreeError::NotFound { id })?;
                    points.swap_remove(pos);
                    self.len -= 1;
                    return Ok(());
                }
            }
        }
    }

    /// Nearest stored point to `pt` and its distance.
    #[must_use]
    pub fn find_closest(&self, pt: Point2) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        self.closest_in(0, pt, &mut best);
        best.map(|(id, d2)| (id, d2.sqrt()))
    }

    fn insert_at(&mut self, mut idx: usize, id: usize, pt: Point2) {
        loop {
            let quadrant = self.nodes[idx].quadrant(pt);
            let depth = self.nodes[idx].depth;
            match &mut self.nodes[idx].kind {
                NodeKind::Branch(children) => idx = children[quadrant],
                NodeKind::Leaf(points) => {
                    points.push((id, pt));
                    if points.len() > NODES_PER_LEVEL && depth < MAX_DEPTH {
                        self.split(idx);
                    }
                    return;
                }
            }
        }
    }

    fn split(&mut self, idx: usize) {
        let node = &mut self.nodes[idx];
        let points = match &mut node.kind {
            NodeKind::Leaf(points) => std::mem::take(points),
            NodeKind::Branch(_) => return,
        };
        let (low, high, depth) = (node.low, node.high, node.depth + 1);
        let mid = low.midpoint(high);

        let base = self.nodes.len();
        self.nodes.push(QuadNode::leaf(low, mid, depth));
        self.nodes.push(QuadNode::leaf(
            Point2::new(mid.x, low.y),
            Point2::new(high.x, mid.y),
            depth,
        ));
        self.nodes.push(QuadNode::leaf(
            Point2::new(low.x, mid.y),
            Point2::new(mid.x, high.y),
            depth,
        ));
        self.nodes.push(QuadNode::leaf(mid, high, depth));
        self.nodes[idx].kind = NodeKind::Branch([base, base + 1, base + 2, base + 3]);

        for (id, p) in points {
            self.insert_at(idx, id, p);
        }
    }

    fn closest_in(&self, idx: usize, pt: Point2, best: &mut Option<(usize, f64)>) {
        let node = &self.nodes[idx];
        if best.is_some_and(|(_, d2)| node.distance_squared(pt) >= d2) {
            return;
        }

        match &node.kind {
            NodeKind::Leaf(points) => {
                for &(id, p) in points {
                    let d2 = p.distance_squared(pt);
                    if best.is_none_or(|(_, bd)| d2 < bd) {
                        *best = Some((id, d2));
                    }
                }
            }
            NodeKind::Branch(children) => {
                let mut order = *children;
                order.sort_by(|&a, &b| {
                    self.nodes[a]
                        .distance_squared(pt)
                        .total_cmp(&self.nodes[b].distance_squared(pt))
                });
                for child in order {
                    self.closest_in(child, pt, best);
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid_tree(n: usize) -> (QuadTree, Vec<Point2>) {
        let mut tree = QuadTree::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        let mut pts = Vec::new();
        for i in 0..n {
            for j in 0..n {
                #[expect(clippy::cast_precision_loss)]
                let p = Point2::new(i as f64 / n as f64, j as f64 / n as f64);
                tree.add_node(pts.len(), p).unwrap();
                pts.push(p);
            }
        }
        (tree, pts)
    }

    #[test]
    fn closest_matches_brute_force() {
        let (tree, pts) = grid_tree(13);
        assert_eq!(tree.len(), 169);
        assert!(tree.depth() > 0);

        for q in [
            Point2::new(0.33, 0.71),
            Point2::new(0.999, 0.001),
            Point2::new(0.5, 0.5),
        ] {
            let (id, dist) = tree.find_closest(q).unwrap();
            let brute = pts
                .iter()
                .map(|p| p.distance(q))
                .fold(f64::INFINITY, f64::min);
            assert_relative_eq!(dist, brute, epsilon = 1e-12);
            assert_relative_eq!(pts[id].distance(q), brute, epsilon = 1e-12);
        }
    }

    #[test]
    fn delete_node_reports_missing_points() {
        let (mut tree, pts) = grid_tree(5);
        tree.delete_node(7, pts[7]).unwrap();
        assert_eq!(tree.len(), 24);
        assert_eq!(
            tree.delete_node(7, pts[7]),
            Err(QuadTreeError::NotFound { id: 7 })
        );

        let (id, dist) = tree.find_closest(pts[7]).unwrap();
        assert_ne!(id, 7);
        assert!(dist > 0.0);
    }

    #[test]
    fn coincident_points_stop_splitting_at_max_depth() {
        let mut tree = QuadTree::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        let p = Point2::new(0.25, 0.75);
        for id in 0..(NODES_PER_LEVEL + 5) {
            tree.add_node(id, p).unwrap();
        }
        assert_eq!(tree.depth(), MAX_DEPTH);
        assert_eq!(tree.find_closest(p).map(|(_, d)| d), Some(0.0));
    }

    #[test]
    fn outside_points_are_rejected() {
        let mut tree = QuadTree::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        assert_eq!(
            tree.add_node(0, Point2::new(2.0, 0.5)),
            Err(QuadTreeError::OutsideDomain { x: 2.0, y: 0.5 })
        );
        assert!(tree.is_empty());
        assert!(tree.find_closest(Point2::new(0.5, 0.5)).is_none());
    }
}
