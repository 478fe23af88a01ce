//! Round-scoped concurrent scratch structures.
//!
//! The pairwise candidate scan and the fallback-fill phase run data-parallel
//! on the rayon pool, and both funnel their results through two small shared
//! structures:
//!
//! - [`MergeMap`]: a sharded hash map with an atomic insert-or-merge
//!   operation. The merge function is supplied by the caller (union of
//!   coverage sets for candidates, min-distance replacement for the
//!   nearest-neighbour table).
//! - [`CoverMarks`]: a fixed-size atomic marker set over E indices, used by
//!   the fill phase to record which elements a filler newly covers.
//!
//! Both live for exactly one round and are drained or dropped at its end; no
//! state crosses rounds, let alone invocations.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// ============================================================================
// MergeMap
// ============================================================================

/// Number of independent shards. Collisions across threads only contend when
/// two keys land in the same shard, so this just needs to comfortably exceed
/// the worker count.
const SHARDS: usize = 64;

/// Sharded hash map with caller-supplied merge-on-duplicate-insert.
pub struct MergeMap<K, V> {
    shards: Vec<Mutex<HashMap<K, V>>>,
}

impl<K: Eq + Hash, V> MergeMap<K, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            shards: (0..SHARDS).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    #[inline]
    fn shard_of(&self, key: &K) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % SHARDS
    }

    /// Inserts `value` under `key`, or merges it into the existing value.
    ///
    /// The merge function must be commutative and associative for the result
    /// to be independent of thread interleaving.
    pub fn insert_or_merge(&self, key: K, value: V, merge: impl FnOnce(&mut V, V)) {
        let shard = self.shard_of(&key);
        let mut guard = self.shards[shard].lock().expect("merge map shard poisoned");
        match guard.entry(key) {
            std::collections::hash_map::Entry::Occupied(mut occupied) => {
                merge(occupied.get_mut(), value);
            }
            std::collections::hash_map::Entry::Vacant(vacant) => {
                vacant.insert(value);
            }
        }
    }

    /// Total number of distinct keys.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock().expect("merge map shard poisoned").len())
            .sum()
    }

    /// True if no key was ever inserted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drains the map into its entries. Consumes the map; a `MergeMap` never
    /// outlives its round.
    pub fn into_entries(self) -> impl Iterator<Item = (K, V)> {
        self.shards.into_iter().flat_map(|s| {
            s.into_inner()
                .expect("merge map shard poisoned")
                .into_iter()
        })
    }
}

impl<K: Eq + Hash, V> Default for MergeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// CoverMarks
// ============================================================================

/// Atomic marker set over the E index domain.
pub struct CoverMarks {
    flags: Vec<AtomicBool>,
}

impl CoverMarks {
    /// Creates a marker set of the given size with every index unmarked.
    pub fn new(len: usize) -> Self {
        Self {
            flags: (0..len).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    /// Seeds a marker set from already-covered indices.
    pub fn seeded(len: usize, covered: impl IntoIterator<Item = usize>) -> Self {
        let marks = Self::new(len);
        for idx in covered {
            marks.flags[idx].store(true, Ordering::Relaxed);
        }
        marks
    }

    /// Marks `idx`; returns `true` if it was not marked before.
    #[inline]
    pub fn mark(&self, idx: usize) -> bool {
        !self.flags[idx].swap(true, Ordering::Relaxed)
    }

    /// Returns whether `idx` is marked.
    #[inline]
    pub fn is_marked(&self, idx: usize) -> bool {
        self.flags[idx].load(Ordering::Relaxed)
    }

    /// Number of marked indices.
    pub fn marked_count(&self) -> usize {
        self.flags
            .iter()
            .filter(|f| f.load(Ordering::Relaxed))
            .count()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn insert_or_merge_keeps_minimum() {
        let map: MergeMap<u32, usize> = MergeMap::new();
        map.insert_or_merge(1, 10, |cur, new| *cur = (*cur).min(new));
        map.insert_or_merge(1, 4, |cur, new| *cur = (*cur).min(new));
        map.insert_or_merge(1, 7, |cur, new| *cur = (*cur).min(new));
        map.insert_or_merge(2, 3, |cur, new| *cur = (*cur).min(new));

        let entries: HashMap<u32, usize> = map.into_entries().collect();
        assert_eq!(entries[&1], 4);
        assert_eq!(entries[&2], 3);
    }

    #[test]
    fn concurrent_merges_are_not_lost() {
        let map: MergeMap<u32, u64> = MergeMap::new();
        (0..1000u64).into_par_iter().for_each(|i| {
            map.insert_or_merge((i % 7) as u32, i, |cur, new| *cur += new);
        });

        let total: u64 = map.into_entries().map(|(_, v)| v).sum();
        assert_eq!(total, (0..1000u64).sum());
    }

    #[test]
    fn cover_marks_first_marker_wins() {
        let marks = CoverMarks::new(8);
        assert!(marks.mark(3));
        assert!(!marks.mark(3));
        assert!(marks.is_marked(3));
        assert!(!marks.is_marked(2));
        assert_eq!(marks.marked_count(), 1);
    }

    #[test]
    fn cover_marks_seeded() {
        let marks = CoverMarks::seeded(5, [0, 4]);
        assert!(marks.is_marked(0));
        assert!(!marks.is_marked(1));
        assert!(marks.is_marked(4));
        assert!(!marks.mark(4));
        assert_eq!(marks.marked_count(), 2);
    }

    #[test]
    fn cover_marks_parallel_exactly_one_winner() {
        let marks = CoverMarks::new(1);
        let winners: usize = (0..256)
            .into_par_iter()
            .filter(|_| marks.mark(0))
            .count();
        assert_eq!(winners, 1);
    }
}
