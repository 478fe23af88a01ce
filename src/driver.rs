//! Outer partitioning driver.
//!
//! `partition` runs the covering engine round by round. Round 0 is the
//! deduplicated incidence set E; every later round merges the previous
//! round's output under a popcount target one higher than before, so the
//! element count shrinks (or at worst stalls) monotonically. Whenever the
//! current element count drops to a requested CPU count, that request is
//! served from the current round's elements and retired. Requests the loop
//! cannot reach by the time the popcount target hits the hyperedge count are
//! reported together in one terminal error.
//!
//! Output goes through the [`ResultSink`] seam; [`DdfWriter`] is the
//! production sink emitting the data-distribution text format.

use std::io::{self, Write};

use crate::bits::Bits;
use crate::cover::minimal_cover;
use crate::generate::{build_candidates, build_incidence};
use crate::hypergraph::Hypergraph;
use crate::PartitionError;

// ============================================================================
// Configuration
// ============================================================================

/// Driver knobs. The defaults match the command line with no flags.
#[derive(Clone, Copy, Debug, Default)]
pub struct PartitionConfig {
    /// Sort each emitted result's partitions lexicographically so repeated
    /// runs produce byte-identical output.
    pub deterministic: bool,
    /// Suppress per-round progress on stderr.
    pub quiet: bool,
}

// ============================================================================
// Result sinks
// ============================================================================

/// Consumer of finished partitionings, one call per requested CPU count.
///
/// `partitions` always holds exactly `k` entries; trailing entries may be
/// empty when the engine found a finer split than requested.
pub trait ResultSink {
    /// Receives the partitioning for one requested CPU count.
    ///
    /// # Errors
    /// Propagates output failures to the driver, which aborts the run.
    fn emit(&mut self, k: usize, partitions: &[Vec<u32>]) -> io::Result<()>;
}

/// Writes results in the data-distribution file format: the CPU count on its
/// own line, then per CPU a `CPU<i> 1` header (numbered from 1) and one
/// `partition_0` row listing that CPU's site count and site ids.
pub struct DdfWriter<W> {
    writer: W,
}

impl<W: Write> DdfWriter<W> {
    /// Wraps an output stream.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> ResultSink for DdfWriter<W> {
    fn emit(&mut self, k: usize, partitions: &[Vec<u32>]) -> io::Result<()> {
        writeln!(self.writer, "{k}")?;
        for (cpu, sites) in partitions.iter().enumerate() {
            writeln!(self.writer, "CPU{} 1", cpu + 1)?;
            write!(self.writer, "partition_0 {}", sites.len())?;
            for &site in sites {
                write!(self.writer, " {site}")?;
            }
            writeln!(self.writer)?;
        }
        self.writer.flush()
    }
}

// ============================================================================
// Driver loop
// ============================================================================

/// Partitions the hypergraph's nodes for every requested CPU count.
///
/// Requests are served largest first; each is answered by the first round
/// whose element count is no larger than the request, padded with empty
/// partitions up to the requested count.
///
/// # Errors
/// Returns construction and solver errors unchanged, and
/// [`PartitionError::Exhausted`] naming the requests still unserved when the
/// popcount target reaches the hyperedge count. Sink failures surface as
/// [`PartitionError::Output`].
pub fn partition<B: Bits, S: ResultSink>(
    hg: &Hypergraph,
    targets: &[usize],
    cfg: &PartitionConfig,
    sink: &mut S,
) -> Result<(), PartitionError> {
    let mut pending: Vec<usize> = targets.to_vec();
    pending.sort_unstable_by(|a, b| b.cmp(a));
    pending.dedup();

    let mut e = build_incidence::<B>(hg)?;
    let cm = e.first().map_or(0, |elem| elem.degree());
    let m = hg.edge_count();
    if !cfg.quiet {
        eprintln!(
            "round 0: |E| = {}, hyperdegree = {cm}, hyperedges = {m}",
            e.len()
        );
    }

    let node_count = hg.node_count();

    // Requests at least as coarse as round 0 need no merging at all.
    while pending.first().is_some_and(|&t| t >= e.len()) {
        let target = pending.remove(0);
        emit_round(&e, target, node_count, cfg, sink)?;
    }

    for d in 1..m.saturating_sub(cm) {
        if pending.is_empty() {
            break;
        }

        let (s, neighbors) = build_candidates(cm + d, &e);
        let s_len = s.len();
        let s_star = minimal_cover(&e, s, &neighbors)?;
        debug_assert!(s_star.iter().all(|elem| elem.degree() == cm + d));
        if !cfg.quiet {
            eprintln!("round {d}: |E| = {}, |S| = {s_len}, k = {}", e.len(), s_star.len());
        }

        while pending.first().is_some_and(|&t| t >= s_star.len()) {
            let target = pending.remove(0);
            emit_round(&s_star, target, node_count, cfg, sink)?;
        }
        e = s_star;
    }

    if pending.is_empty() {
        Ok(())
    } else {
        Err(PartitionError::Exhausted { missed: pending })
    }
}

fn emit_round<B: Bits, S: ResultSink>(
    e: &[crate::elem::Incidence<B>],
    target: usize,
    node_count: u32,
    cfg: &PartitionConfig,
    sink: &mut S,
) -> Result<(), PartitionError> {
    let mut partitions: Vec<Vec<u32>> = e
        .iter()
        .map(|elem| elem.covered_nodes.iter().copied().collect())
        .collect();
    // The solver enforces exactly-once assignment, so completeness reduces
    // to the total count.
    debug_assert_eq!(
        partitions.iter().map(Vec::len).sum::<usize>(),
        node_count as usize
    );
    if cfg.deterministic {
        partitions.sort_unstable();
    }
    partitions.resize_with(target, Vec::new);
    sink.emit(target, &partitions)
        .map_err(|err| PartitionError::Output(err.to_string()))
}

// ============================================================================
// Tests
// ============================================================================
