//! Greedy minimal-cover solver.
//!
//! Given the current incidence set E, the candidate set S and the
//! nearest-neighbour fallback table, the solver picks an approximate minimum
//! subset of S covering all of E:
//!
//! - Phase 1 repeatedly selects the candidate covering the most not-yet-
//!   covered E elements. The candidate pool is pre-sorted on (coverage size,
//!   combination value) so that the first maximum found in the scan is the
//!   same on every run.
//! - Phase 2 covers the leftovers: each uncovered element gets a filler
//!   built from its own combination moved one bit towards its recorded
//!   nearest neighbour. A filler can cover several leftovers at once (always
//!   elements at or after the one it was built for, never earlier ones).
//!
//! Each selected candidate's node set is trimmed against the nodes already
//! claimed by earlier selections, which makes "every original node appears
//! in exactly one output element" a structural property; it is still
//! verified at the end and any violation is fatal.

use std::collections::BTreeSet;

use rayon::prelude::*;

use crate::bits::Bits;
use crate::elem::{Candidate, Incidence, NeighborTable};
use crate::sync::CoverMarks;
use crate::PartitionError;

/// Runs one round of the covering solver, producing the set S*.
///
/// `|S*|` is the partition count `k` this round achieves; the driver either
/// emits it or feeds it back as the next round's E.
///
/// # Errors
/// Returns [`PartitionError::MissingNeighbor`] if a leftover element has no
/// fallback entry, and [`PartitionError::DoubleAssignment`] if an original
/// node ends up in more than one output element. Both indicate an internal
/// inconsistency or an irregular input, not a recoverable condition.
pub fn minimal_cover<B: Bits>(
    e: &[Incidence<B>],
    mut s: Vec<Candidate<B>>,
    neighbors: &NeighborTable,
) -> Result<Vec<Incidence<B>>, PartitionError> {
    s.sort_by(Candidate::cmp_deterministic);

    let mut covered: BTreeSet<u32> = BTreeSet::new();
    let mut assigned: BTreeSet<u32> = BTreeSet::new();
    let mut subset: Vec<Incidence<B>> = Vec::new();

    // Phase 1: greedy growth over the candidate pool.
    while covered.len() != e.len() {
        let mut best_idx = None;
        let mut best_gain = 0usize;
        for (idx, candidate) in s.iter().enumerate() {
            let gain = candidate
                .covered_elems
                .iter()
                .filter(|&eidx| !covered.contains(eidx))
                .count();
            if gain > best_gain {
                best_gain = gain;
                best_idx = Some(idx);
            }
        }
        // No candidate helps any further; the rest of E needs fillers.
        let Some(best_idx) = best_idx else {
            break;
        };

        let mut candidate = s.remove(best_idx);
        covered.extend(candidate.covered_elems.iter().copied());

        // Claim only the nodes no earlier selection already owns.
        candidate
            .covered_nodes
            .retain(|node| !assigned.contains(node));
        // A candidate with positive gain covers an uncovered element, whose
        // nodes nothing selected earlier can have claimed.
        debug_assert!(
            !candidate.covered_nodes.is_empty(),
            "selected candidate owns no nodes"
        );
        assigned.extend(candidate.covered_nodes.iter().copied());
        subset.push(candidate.into_incidence());
    }

    // Phase 2: fallback fill for everything phase 1 left uncovered.
    if covered.len() != e.len() {
        let marks = CoverMarks::seeded(e.len(), covered.iter().map(|&idx| idx as usize));

        for eidx in 0..e.len() {
            if marks.is_marked(eidx) {
                continue;
            }
            let (neighbor, distance) = neighbors
                .nearest(eidx as u32)
                .ok_or(PartitionError::MissingNeighbor { index: eidx })?;
            debug_assert!(distance > 2);

            let mut filler = e[eidx].combination.clone();
            let advanced = filler.approach_towards(&e[neighbor as usize].combination);
            debug_assert!(advanced, "filler source already covers its neighbour");

            // One filler may cover several leftovers, but growing an
            // element's own combination can never absorb an element that an
            // earlier filler failed to cover.
            e.par_iter().enumerate().for_each(|(idx, elem)| {
                if filler.covers(&elem.combination) {
                    let newly = marks.mark(idx);
                    debug_assert!(
                        idx >= eidx || !newly,
                        "filler for element {eidx} newly covered earlier element {idx}"
                    );
                }
            });

            subset.push(Incidence {
                combination: filler,
                covered_nodes: e[eidx].covered_nodes.clone(),
            });
        }
    }

    // Partition property: each original node in exactly one output element.
    let mut seen: BTreeSet<u32> = BTreeSet::new();
    for elem in &subset {
        for &node in &elem.covered_nodes {
            if !seen.insert(node) {
                return Err(PartitionError::DoubleAssignment { node });
            }
        }
    }

    Ok(subset)
}

// ============================================================================
// Tests
// ============================================================================
