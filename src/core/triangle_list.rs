//! Doubly linked worklist of live triangles.
//!
//! Triangles live in a [`SlotMap`] arena; the list threads `prev`/`next` keys
//! through the arena so insertion order is preserved and removal is O(1).
//! Freed slots are reused by the arena's free list, and stale keys are
//! rejected because slot versions change on reuse.

use crate::core::triangle::Triangle;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Key of a triangle in the worklist.
    ///
    /// Keys stay valid until the triangle is removed; a removed key never
    /// aliases a later triangle.
    pub struct TriangleKey;
}

#[derive(Clone, Debug)]
struct TriangleNode {
    tri: Triangle,
    prev: Option<TriangleKey>,
    next: Option<TriangleKey>,
}

/// Insertion-ordered arena of triangles.
///
/// # Examples
///
/// ```rust
/// use frontal_delaunay::core::triangle::Triangle;
/// use frontal_delaunay::core::triangle_list::TriangleList;
///
/// let mut list = TriangleList::new();
/// let a = list.push(Triangle::new(0, 1, 2));
/// let b = list.push(Triangle::new(2, 1, 3));
/// list.remove(a);
/// assert_eq!(list.len(), 1);
/// assert_eq!(list.keys().collect::<Vec<_>>(), vec![b]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TriangleList {
    nodes: SlotMap<TriangleKey, TriangleNode>,
    head: Option<TriangleKey>,
    tail: Option<TriangleKey>,
}

impl TriangleList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live triangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a triangle at the tail.
    pub fn push(&mut self, tri: Triangle) -> TriangleKey {
        let prev = self.tail;
        let key = self.nodes.insert(TriangleNode {
            tri,
            prev,
            next: None,
        });
        match prev.and_then(|p| self.nodes.get_mut(p)) {
            Some(node) => node.next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        key
    }

    /// Unlink and return a triangle. Returns `None` for stale keys.
    pub fn remove(&mut self, key: TriangleKey) -> Option<Triangle> {
        let node = self.nodes.remove(key)?;
        match node.prev.and_then(|p| self.nodes.get_mut(p)) {
            Some(prev) => prev.next = node.next,
            None => self.head = node.next,
        }
        match node.next.and_then(|n| self.nodes.get_mut(n)) {
            Some(next) => next.prev = node.prev,
            None => self.tail = node.prev,
        }
        Some(node.tri)
    }

    /// Whether `key` refers to a live triangle.
    #[must_use]
    pub fn contains(&self, key: TriangleKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Borrow a triangle.
    #[must_use]
    pub fn get(&self, key: TriangleKey) -> Option<&Triangle> {
        self.nodes.get(key).map(|node| &node.tri)
    }

    /// Mutably borrow a triangle.
    ///
    /// Callers must not change the vertices; the edge table indexes them.
    pub fn get_mut(&mut self, key: TriangleKey) -> Option<&mut Triangle> {
        self.nodes.get_mut(key).map(|node| &mut node.tri)
    }

    /// Key of the first triangle.
    #[must_use]
    pub const fn head(&self) -> Option<TriangleKey> {
        self.head
    }

    /// Key following `key` in insertion order.
    #[must_use]
    pub fn next(&self, key: TriangleKey) -> Option<TriangleKey> {
        self.nodes.get(key).and_then(|node| node.next)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = TriangleKey> + '_ {
        std::iter::successors(self.head, move |&k| self.next(k))
    }

    /// Triangles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (TriangleKey, &Triangle)> + '_ {
        self.keys().filter_map(move |k| self.get(k).map(|t| (k, t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_keeps_order_and_links() {
        let mut list = TriangleList::new();
        let keys: Vec<_> = (0..5).map(|i| list.push(Triangle::new(i, i + 1, i + 2))).collect();

        assert_eq!(list.remove(keys[0]).map(|t| t.u), Some(0));
        assert_eq!(list.remove(keys[2]).map(|t| t.u), Some(2));
        assert_eq!(list.remove(keys[4]).map(|t| t.u), Some(4));
        assert!(list.remove(keys[4]).is_none());

        let order: Vec<_> = list.iter().map(|(_, t)| t.u).collect();
        assert_eq!(order, vec![1, 3]);
        assert_eq!(list.head(), Some(keys[1]));

        let k = list.push(Triangle::new(9, 10, 11));
        assert_eq!(list.keys().last(), Some(k));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn stale_keys_are_rejected_after_reuse() {
        let mut list = TriangleList::new();
        let a = list.push(Triangle::new(0, 1, 2));
        list.remove(a);
        let b = list.push(Triangle::new(3, 4, 5));
        assert_ne!(a, b);
        assert!(!list.contains(a));
        assert!(list.get(a).is_none());
        assert_eq!(list.get(b).map(|t| t.u), Some(3));
    }

    #[test]
    fn removing_every_triangle_empties_the_list() {
        let mut list = TriangleList::new();
        let a = list.push(Triangle::new(0, 1, 2));
        let b = list.push(Triangle::new(1, 3, 2));
        assert!(list.remove(a).is_some());
        assert!(list.remove(b).is_some());
        assert!(list.is_empty());
        assert!(list.head().is_none());
        assert_eq!(list.keys().count(), 0);
    }
}
