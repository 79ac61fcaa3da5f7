//! Directed-edge adjacency table.
//!
//! Every live triangle `(a, b, c)` registers its three directed edges
//! `(a, b)`, `(b, c)` and `(c, a)`. The triangle across edge `(u, v)` of a
//! triangle is then the owner of the reversed edge `(v, u)`: a single lookup.
//!
//! The table chains colliding entries per bucket and doubles its bucket count
//! once it holds more than [`REHASH_LOAD`] entries per bucket. Rehashing keeps
//! every entry.

use crate::core::triangle_list::TriangleKey;
use thiserror::Error;

/// Average chain length that triggers a rehash.
pub const REHASH_LOAD: usize = 10;

/// Bucket count of a fresh table.
const INITIAL_BUCKETS: usize = 64;

/// Violations of the mesh topology. These are programming errors and always
/// surface to the caller.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    /// A directed edge was claimed by a second triangle.
    #[error("Directed edge ({u}, {v}) is already owned by another triangle")]
    DuplicateEdge {
        /// Edge start.
        u: usize,
        /// Edge end.
        v: usize,
    },
    /// A live triangle's edge is missing from the table.
    #[error("Directed edge ({u}, {v}) is not registered")]
    MissingEdge {
        /// Edge start.
        u: usize,
        /// Edge end.
        v: usize,
    },
    /// A triangle would repeat a vertex.
    #[error("Triangle ({u}, {v}, {w}) repeats a vertex")]
    DegenerateTriangle {
        /// First vertex.
        u: usize,
        /// Second vertex.
        v: usize,
        /// Third vertex.
        w: usize,
    },
    /// A triangle would not be counter-clockwise in parameter space.
    #[error("Triangle ({u}, {v}, {w}) is not counter-clockwise")]
    Inverted {
        /// First vertex.
        u: usize,
        /// Second vertex.
        v: usize,
        /// Third vertex.
        w: usize,
    },
    /// A triangle key no longer refers to a live triangle.
    #[error("Triangle key refers to a deleted triangle")]
    StaleTriangle,
}

/// Stable polynomial hash of a slice of indices (FNV basis with a final
/// avalanche step).
fn stable_hash(values: &[usize]) -> u64 {
    const HASH_PRIME: u64 = 1_099_511_628_211;
    const HASH_OFFSET: u64 = 14_695_981_039_346_656_037;

    let mut hash = HASH_OFFSET;
    for &value in values {
        hash = hash.wrapping_mul(HASH_PRIME).wrapping_add(value as u64);
    }

    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51_afd7_ed55_8ccd);
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    hash ^= hash >> 33;
    hash
}

#[expect(clippy::cast_possible_truncation, reason = "reduced modulo a usize")]
fn reduce(hash: u64, nbuckets: usize) -> usize {
    (hash % nbuckets.max(1) as u64) as usize
}

/// Bucket of the directed edge `(u, v)`. Order-sensitive.
///
/// # Examples
///
/// ```rust
/// use frontal_delaunay::core::edge_table::edge_hash;
///
/// assert!(edge_hash(3, 8, 1024) < 1024);
/// assert_ne!(edge_hash(3, 8, 1 << 20), edge_hash(8, 3, 1 << 20));
/// ```
#[must_use]
pub fn edge_hash(u: usize, v: usize, nbuckets: usize) -> usize {
    reduce(stable_hash(&[u, v]), nbuckets)
}

/// Bucket of the triangle with vertex set `{u, v, w}`. Order-insensitive.
#[must_use]
pub fn triangle_hash(u: usize, v: usize, w: usize, nbuckets: usize) -> usize {
    let mut vs = [u, v, w];
    vs.sort_unstable();
    reduce(stable_hash(&vs), nbuckets)
}

#[derive(Clone, Copy, Debug)]
struct EdgeEntry {
    u: usize,
    v: usize,
    tri: TriangleKey,
}

/// Chained hash table from directed edges to their owning triangle.
#[derive(Clone, Debug)]
pub struct EdgeTable {
    buckets: Vec<Vec<EdgeEntry>>,
    len: usize,
}

impl Default for EdgeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); INITIAL_BUCKETS],
            len: 0,
        }
    }

    /// Number of registered directed edges.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the table is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current bucket count.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Register `(u, v) → tri`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::DuplicateEdge`] if the directed edge is
    /// already owned; the table is left unchanged.
    pub fn insert(&mut self, u: usize, v: usize, tri: TriangleKey) -> Result<(), TopologyError> {
        let b = edge_hash(u, v, self.buckets.len());
        if self.buckets[b].iter().any(|e| e.u == u && e.v == v) {
            return Err(TopologyError::DuplicateEdge { u, v });
        }
        self.buckets[b].push(EdgeEntry { u, v, tri });
        self.len += 1;

        if self.len > REHASH_LOAD * self.buckets.len() {
            self.rehash(2 * self.buckets.len());
        }
        Ok(())
    }

    /// Unregister `(u, v)`, returning its previous owner.
    pub fn remove(&mut self, u: usize, v: usize) -> Option<TriangleKey> {
        let b = edge_hash(u, v, self.buckets.len());
        let bucket = &mut self.buckets[b];
        let pos = bucket.iter().position(|e| e.u == u && e.v == v)?;
        self.len -= 1;
        Some(bucket.swap_remove(pos).tri)
    }

    /// Owner of the directed edge `(u, v)`.
    #[must_use]
    pub fn get(&self, u: usize, v: usize) -> Option<TriangleKey> {
        let b = edge_hash(u, v, self.buckets.len());
        self.buckets[b]
            .iter()
            .find(|e| e.u == u && e.v == v)
            .map(|e| e.tri)
    }

    /// Whether `(u, v)` is registered.
    #[must_use]
    pub fn contains(&self, u: usize, v: usize) -> bool {
        self.get(u, v).is_some()
    }

    /// All `(u, v, owner)` entries, in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, TriangleKey)> + '_ {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter().map(|e| (e.u, e.v, e.tri)))
    }

    fn rehash(&mut self, nbuckets: usize) {
        let mut buckets = vec![Vec::new(); nbuckets];
        for entry in self.buckets.drain(..).flatten() {
            buckets[edge_hash(entry.u, entry.v, nbuckets)].push(entry);
        }
        tracing::trace!(nbuckets, len = self.len, "rehashed edge table");
        self.buckets = buckets;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn keys(n: usize) -> Vec<TriangleKey> {
        let mut map: SlotMap<TriangleKey, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn duplicate_directed_edge_is_rejected() {
        let k = keys(2);
        let mut table = EdgeTable::new();
        table.insert(1, 2, k[0]).unwrap();
        table.insert(2, 1, k[1]).unwrap();

        assert_eq!(
            table.insert(1, 2, k[1]),
            Err(TopologyError::DuplicateEdge { u: 1, v: 2 })
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1, 2), Some(k[0]));
        assert_eq!(table.get(2, 1), Some(k[1]));
    }

    #[test]
    fn remove_returns_owner() {
        let k = keys(1);
        let mut table = EdgeTable::new();
        table.insert(4, 5, k[0]).unwrap();
        assert_eq!(table.remove(4, 5), Some(k[0]));
        assert_eq!(table.remove(4, 5), None);
        assert!(table.is_empty());
    }

    #[test]
    fn growth_keeps_every_entry() {
        let k = keys(1);
        let mut table = EdgeTable::new();
        let n = 3000;
        for i in 0..n {
            table.insert(i, i + 1, k[0]).unwrap();
        }
        assert_eq!(table.len(), n);
        assert!(table.bucket_count() > INITIAL_BUCKETS);
        assert!(table.len() <= REHASH_LOAD * table.bucket_count());
        assert!((0..n).all(|i| table.contains(i, i + 1)));
        assert!(!table.contains(1, 0));
        assert_eq!(table.iter().count(), n);
    }

    #[test]
    fn triangle_hash_ignores_vertex_order() {
        let nb = 977;
        let h = triangle_hash(3, 9, 27, nb);
        assert_eq!(triangle_hash(9, 27, 3, nb), h);
        assert_eq!(triangle_hash(27, 3, 9, nb), h);
        assert_eq!(edge_hash(3, 9, nb), edge_hash(3, 9, nb));
    }
}
