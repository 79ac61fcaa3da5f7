//! Collection aliases shared across the triangulation engine.
//!
//! The engine keys everything by small integer point indices, so the fast
//! non-cryptographic `FxHash` is used throughout.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Hash map used for all internal index lookups.
///
/// # Examples
///
/// ```rust
/// use frontal_delaunay::core::collections::FastHashMap;
///
/// let mut aliases: FastHashMap<usize, usize> = FastHashMap::default();
/// aliases.insert(7, 4);
/// assert_eq!(aliases.get(&7), Some(&4));
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Hash set used for all internal index lookups.
pub type FastHashSet<T> = FxHashSet<T>;

/// Small inline buffer; spills to the heap past `N` elements.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Inline capacity for per-point triangle stars.
pub const STAR_BUFFER_SIZE: usize = 16;

/// Inline capacity for the chain of points crossed by a segment.
pub const CHAIN_BUFFER_SIZE: usize = 16;

/// Unordered point-index pair, smaller index first.
#[must_use]
#[inline]
pub const fn undirected(u: usize, v: usize) -> (usize, usize) {
    if u <= v { (u, v) } else { (v, u) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undirected_pair_is_sorted() {
        assert_eq!(undirected(5, 2), (2, 5));
        assert_eq!(undirected(2, 5), (2, 5));
        assert_eq!(undirected(3, 3), (3, 3));
    }

    #[test]
    fn small_buffer_stays_inline() {
        let mut buf: SmallBuffer<usize, 4> = SmallBuffer::new();
        buf.extend([1, 2, 3]);
        assert!(!buf.spilled());
        buf.extend([4, 5]);
        assert!(buf.spilled());
    }
}
