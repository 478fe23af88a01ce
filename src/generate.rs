//! Incidence-set construction and candidate generation.
//!
//! `build_incidence` turns the hypergraph into the round-0 set E: one
//! deduplicated incidence vector per hypernode, each element tagging the
//! original nodes that collapsed into it. Later rounds reuse the solver's
//! output as E directly and never come back here.
//!
//! `build_candidates` is the per-round pairwise scan: every unordered pair
//! of E elements at Hamming distance 2 contributes one candidate (their OR),
//! and every pair further apart feeds the nearest-neighbour fallback table.
//! The scan is the dominant cost of a round (`O(|E|^2)` distance
//! computations) and runs data-parallel over the first pair index.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;

use crate::bits::Bits;
use crate::elem::{Candidate, Incidence, NeighborTable};
use crate::hypergraph::Hypergraph;
use crate::sync::MergeMap;
use crate::PartitionError;

// ============================================================================
// Incidence set (E)
// ============================================================================

/// Builds the deduplicated round-0 incidence set from the hypergraph.
///
/// Bit `j` of node `i`'s vector is set iff hyperedge `j` contains `i`.
/// Nodes with identical vectors are merged into one element covering all of
/// them, so the output holds at most `node_count` elements, ordered by the
/// numeric value of their combinations.
///
/// # Errors
/// Returns [`PartitionError::IrregularDegree`] unless every element has the
/// same popcount (the uniform-hyperdegree assumption the growth loop relies
/// on).
pub fn build_incidence<B: Bits>(hg: &Hypergraph) -> Result<Vec<Incidence<B>>, PartitionError> {
    let width = hg.edge_count();
    let mut combinations: Vec<B> = (0..hg.node_count()).map(|_| B::zeroed(width)).collect();
    for (edge_idx, edge) in hg.edges().iter().enumerate() {
        for &node in edge {
            combinations[node as usize].set_bit(edge_idx);
        }
    }

    // Deduplicate; the BTreeMap doubles as a deterministic ordering of E.
    let mut dedup: BTreeMap<B, BTreeSet<u32>> = BTreeMap::new();
    for (node, combination) in combinations.into_iter().enumerate() {
        dedup.entry(combination).or_default().insert(node as u32);
    }

    let e: Vec<Incidence<B>> = dedup
        .into_iter()
        .map(|(combination, covered_nodes)| Incidence {
            combination,
            covered_nodes,
        })
        .collect();

    let cm = e.first().map_or(0, Incidence::degree);
    for (index, elem) in e.iter().enumerate() {
        let found = elem.degree();
        if found != cm {
            return Err(PartitionError::IrregularDegree {
                index,
                expected: cm,
                found,
            });
        }
    }

    Ok(e)
}

// ============================================================================
// Candidate set (S)
// ============================================================================

/// Builds the candidate set for popcount target `cm_plus_d` plus the
/// nearest-neighbour fallback table for elements without a distance-2
/// partner.
///
/// Candidates with equal combinations are merged (coverage sets unioned);
/// neighbour entries keep the smallest distance seen, with ties broken
/// towards the smaller partner index so the table does not depend on thread
/// interleaving.
pub fn build_candidates<B: Bits>(
    cm_plus_d: usize,
    e: &[Incidence<B>],
) -> (Vec<Candidate<B>>, NeighborTable) {
    assert!(!e.is_empty(), "candidate generation over an empty E set");

    let candidates: MergeMap<B, Candidate<B>> = MergeMap::new();
    let neighbors: MergeMap<u32, (u32, usize)> = MergeMap::new();

    (0..e.len()).into_par_iter().for_each(|first_idx| {
        for second_idx in (first_idx + 1)..e.len() {
            let first = &e[first_idx];
            let second = &e[second_idx];
            let distance = first.combination.distance(&second.combination);
            // Equal popcounts make every pairwise distance even and nonzero
            // (E is deduplicated).
            debug_assert!(distance >= 2 && distance % 2 == 0);

            if distance == 2 {
                let combination = first.combination.union(&second.combination);
                debug_assert_eq!(combination.count_ones(), cm_plus_d);
                let candidate = Candidate::from_pair(
                    combination.clone(),
                    first_idx as u32,
                    second_idx as u32,
                    &first.covered_nodes,
                    &second.covered_nodes,
                );
                candidates.insert_or_merge(combination, candidate, Candidate::merge);
            } else {
                record_neighbor(&neighbors, first_idx as u32, second_idx as u32, distance);
                record_neighbor(&neighbors, second_idx as u32, first_idx as u32, distance);
            }
        }
    });

    let s: Vec<Candidate<B>> = candidates.into_entries().map(|(_, c)| c).collect();
    let table = NeighborTable::from_entries(neighbors.into_entries());

    #[cfg(debug_assertions)]
    verify_candidate_coverage(e, &s);

    (s, table)
}

#[inline]
fn record_neighbor(
    neighbors: &MergeMap<u32, (u32, usize)>,
    from: u32,
    to: u32,
    distance: usize,
) {
    neighbors.insert_or_merge(from, (to, distance), |cur, new| {
        if new.1 < cur.1 || (new.1 == cur.1 && new.0 < cur.0) {
            *cur = new;
        }
    });
}

/// Cross-check: any candidate that covers an E element must already list it.
/// Two same-popcount subsets of a popcount+1 candidate are at distance <= 2,
/// so the covering pair was necessarily enumerated and merged.
#[cfg(debug_assertions)]
fn verify_candidate_coverage<B: Bits>(e: &[Incidence<B>], s: &[Candidate<B>]) {
    e.par_iter().enumerate().for_each(|(eidx, elem)| {
        for candidate in s {
            if candidate.combination.covers(&elem.combination) {
                debug_assert!(
                    candidate.covered_elems.contains(&(eidx as u32)),
                    "candidate covers element {eidx} without listing it"
                );
            }
        }
    });
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::{DenseBits, SparseBits};
    use crate::hypergraph::Hypergraph;

    fn bits(width: usize, indices: &[usize]) -> DenseBits {
        let mut b = DenseBits::zeroed(width);
        for &i in indices {
            b.set_bit(i);
        }
        b
    }

    #[test]
    fn single_hyperedge_collapses_to_one_element() {
        let hg = Hypergraph::from_edges(2, vec![vec![0, 1]]);
        let e = build_incidence::<DenseBits>(&hg).unwrap();
        assert_eq!(e.len(), 1);
        assert_eq!(e[0].degree(), 1);
        assert_eq!(e[0].covered_nodes, BTreeSet::from([0, 1]));
    }

    #[test]
    fn incidence_vectors_match_edge_membership() {
        // Edges: {0,1}, {0}, {1} -> each node has degree 2, distinct vectors.
        let hg = Hypergraph::from_edges(2, vec![vec![0, 1], vec![0], vec![1]]);
        let e = build_incidence::<DenseBits>(&hg).unwrap();
        assert_eq!(e.len(), 2);
        for elem in &e {
            assert_eq!(elem.degree(), 2);
            assert_eq!(elem.covered_nodes.len(), 1);
        }
        // Element for node 0 has bits {0, 1}; for node 1 bits {0, 2}.
        let node0 = e.iter().find(|x| x.covered_nodes.contains(&0)).unwrap();
        assert!(node0.combination.get_bit(0) && node0.combination.get_bit(1));
        assert!(!node0.combination.get_bit(2));
    }

    #[test]
    fn irregular_degree_is_a_reported_error() {
        // Node 0 sits in two hyperedges, node 1 in one.
        let hg = Hypergraph::from_edges(2, vec![vec![0, 1], vec![0]]);
        let err = build_incidence::<DenseBits>(&hg).unwrap_err();
        assert!(matches!(err, PartitionError::IrregularDegree { .. }));
    }

    #[test]
    fn sparse_backing_builds_the_same_set() {
        let hg = Hypergraph::from_edges(2, vec![vec![0, 1], vec![0], vec![1]]);
        let dense = build_incidence::<DenseBits>(&hg).unwrap();
        let sparse = build_incidence::<SparseBits>(&hg).unwrap();
        assert_eq!(dense.len(), sparse.len());
        for (d, s) in dense.iter().zip(&sparse) {
            assert_eq!(d.covered_nodes, s.covered_nodes);
            assert_eq!(d.degree(), s.degree());
        }
    }

    #[test]
    fn distance_two_pair_becomes_a_candidate() {
        let e = vec![
            Incidence::new(bits(6, &[0, 1]), 0),
            Incidence::new(bits(6, &[0, 2]), 1),
        ];
        let (s, table) = build_candidates(3, &e);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].combination.count_ones(), 3);
        assert_eq!(s[0].covered_elems, BTreeSet::from([0, 1]));
        assert_eq!(s[0].covered_nodes, BTreeSet::from([0, 1]));
        assert!(table.is_empty());
    }

    #[test]
    fn distant_elements_get_neighbor_entries() {
        let e = vec![
            Incidence::new(bits(8, &[0, 1]), 0),
            Incidence::new(bits(8, &[0, 2]), 1),
            Incidence::new(bits(8, &[6, 7]), 2),
        ];
        let (s, table) = build_candidates(3, &e);
        // Only the {0,1}/{0,2} pair is at distance 2.
        assert_eq!(s.len(), 1);
        // Element 2 is at distance 4 from both others; ties resolve to the
        // smaller partner index.
        assert_eq!(table.nearest(2), Some((0, 4)));
        // Entries are bidirectional.
        assert_eq!(table.nearest(0), Some((2, 4)));
        assert_eq!(table.nearest(1), Some((2, 4)));
    }

    #[test]
    fn equal_combinations_merge_their_coverage() {
        // Elements 0/1 and 2/3 both OR to {0,1,2}; the four of them pairwise
        // produce one deduplicated candidate covering all four.
        let e = vec![
            Incidence::new(bits(4, &[0, 1]), 0),
            Incidence::new(bits(4, &[0, 2]), 1),
            Incidence::new(bits(4, &[1, 2]), 2),
        ];
        let (s, _) = build_candidates(3, &e);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].covered_elems, BTreeSet::from([0, 1, 2]));
        assert_eq!(s[0].covered_nodes, BTreeSet::from([0, 1, 2]));
    }

    #[test]
    fn neighbor_entry_keeps_minimum_distance() {
        // Pairwise distances: (0,1) = 4, (0,2) = 6, (1,2) = 6. No pair is at
        // distance 2, so everything lands in the neighbour table.
        let e = vec![
            Incidence::new(bits(12, &[0, 1, 2]), 0),
            Incidence::new(bits(12, &[0, 3, 4]), 1),
            Incidence::new(bits(12, &[5, 6, 7]), 2),
        ];
        let (s, table) = build_candidates(4, &e);
        assert!(s.is_empty());
        assert_eq!(table.nearest(0), Some((1, 4)));
        assert_eq!(table.nearest(1), Some((0, 4)));
        // Element 2 is at distance 6 from both; the tie goes to index 0.
        assert_eq!(table.nearest(2), Some((0, 6)));
    }
}
