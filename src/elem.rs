//! Elements of the covering model.
//!
//! - [`Incidence`]: one element of the set E. At round 0 this is the
//!   incidence vector of one hypernode (deduplicated, so an element may
//!   represent several nodes that share an identical vector); in later
//!   rounds it is one element of the previous round's solver output.
//! - [`Candidate`]: one element of the set S, built by OR-ing two E elements
//!   at Hamming distance 2. Identity is the combination alone; candidates
//!   with equal combinations are merged by unioning their coverage sets.
//! - [`NeighborTable`]: fallback lookup for E elements that have no
//!   distance-2 partner, consumed by the solver's fill phase.

use std::collections::{BTreeSet, HashMap};

use crate::bits::Bits;

// ============================================================================
// Incidence (E element)
// ============================================================================

/// One element of the incidence set E.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Incidence<B> {
    /// Hyperedge membership vector.
    pub combination: B,
    /// Original hypernode ids this element stands for. Never empty for
    /// solver-produced elements; the driver turns this set into one
    /// partition when the element survives to emission.
    pub covered_nodes: BTreeSet<u32>,
}

impl<B: Bits> Incidence<B> {
    /// Creates an element representing a single original hypernode.
    pub fn new(combination: B, node: u32) -> Self {
        let mut covered_nodes = BTreeSet::new();
        covered_nodes.insert(node);
        Self {
            combination,
            covered_nodes,
        }
    }

    /// Popcount of the combination (the element's hyperdegree).
    pub fn degree(&self) -> usize {
        self.combination.count_ones()
    }
}

// ============================================================================
// Candidate (S element)
// ============================================================================

/// One element of the candidate set S.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate<B> {
    /// OR of two E-element combinations at Hamming distance 2.
    pub combination: B,
    /// Indices into the current E set this candidate is a superset of.
    pub covered_elems: BTreeSet<u32>,
    /// Union of the source elements' original hypernode ids.
    pub covered_nodes: BTreeSet<u32>,
}

impl<B: Bits> Candidate<B> {
    /// Builds a candidate from a distance-2 pair of E elements.
    pub fn from_pair(
        combination: B,
        first_idx: u32,
        second_idx: u32,
        first_nodes: &BTreeSet<u32>,
        second_nodes: &BTreeSet<u32>,
    ) -> Self {
        let mut covered_elems = BTreeSet::new();
        covered_elems.insert(first_idx);
        covered_elems.insert(second_idx);
        let mut covered_nodes = first_nodes.clone();
        covered_nodes.extend(second_nodes.iter().copied());
        Self {
            combination,
            covered_elems,
            covered_nodes,
        }
    }

    /// Merges another candidate with an equal combination into this one.
    pub fn merge(&mut self, other: Candidate<B>) {
        debug_assert_eq!(self.combination, other.combination);
        self.covered_elems.extend(other.covered_elems);
        self.covered_nodes.extend(other.covered_nodes);
    }

    /// Deterministic ordering: coverage size first, then the numeric value
    /// of the combination. Sorting the candidate pool with this order makes
    /// the greedy scan's first-maximum selection reproducible.
    pub fn cmp_deterministic(&self, other: &Self) -> std::cmp::Ordering {
        self.covered_elems
            .len()
            .cmp(&other.covered_elems.len())
            .then_with(|| self.combination.cmp(&other.combination))
    }

    /// Consumes the candidate into the incidence element it becomes when the
    /// solver selects it (the per-round E-index coverage is dropped).
    pub fn into_incidence(self) -> Incidence<B> {
        Incidence {
            combination: self.combination,
            covered_nodes: self.covered_nodes,
        }
    }
}

// ============================================================================
// NeighborTable
// ============================================================================

/// Nearest-neighbour fallback table: for each E index without a distance-2
/// partner, the closest other index and their Hamming distance.
///
/// Rebuilt from scratch every round; never persisted across rounds.
#[derive(Clone, Debug, Default)]
pub struct NeighborTable {
    entries: HashMap<u32, (u32, usize)>,
}

impl NeighborTable {
    /// Builds the table from `(index, (partner, distance))` entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (u32, (u32, usize))>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Returns the recorded nearest partner and distance for `idx`.
    pub fn nearest(&self, idx: u32) -> Option<(u32, usize)> {
        self.entries.get(&idx).copied()
    }

    /// Number of indices with a recorded neighbour.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entries were recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
