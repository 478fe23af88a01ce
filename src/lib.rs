//! # Judicious Hypergraph Partitioning
//!
//! A Rust library for judiciously partitioning the hypernodes of a
//! hypergraph (alignment sites under site-repeat classes) across a set of
//! CPUs, minimising the largest per-CPU hyperedge load.
//!
//! This crate provides:
//! - A bitset abstraction with **dense** and **sparse** backings behind one
//!   trait, chosen by incidence density.
//! - An incremental covering heuristic: the deduplicated incidence set is
//!   repeatedly merged through distance-2 candidate generation and a greedy
//!   minimum-cover selection until the element count reaches each requested
//!   CPU count.
//! - A data-parallel candidate scan (the quadratic hot path) on the rayon
//!   pool, with deterministic tie-breaking throughout.
//!
//! ## Quick Start
//!
//! ```no_run
//! use judicious::bits::DenseBits;
//! use judicious::driver::{partition, DdfWriter, PartitionConfig};
//! use judicious::hypergraph;
//!
//! let hg = hypergraph::from_partition_file("input.part", 0)?;
//! let cfg = PartitionConfig::default();
//! let mut sink = DdfWriter::new(std::io::stdout().lock());
//! partition::<DenseBits, _>(&hg, &[16, 8, 4], &cfg, &mut sink)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Working with Bitsets Directly
//!
//! ```
//! use judicious::bits::{Bits, DenseBits};
//!
//! let mut a = DenseBits::zeroed(128);
//! a.set_bit(0);
//! a.set_bit(100);
//!
//! let mut b = DenseBits::zeroed(128);
//! b.set_bit(0);
//!
//! assert_eq!(a.count_ones(), 2);
//! assert_eq!(a.distance(&b), 1);
//! ```
//!
//! ## Modules
//!
//! - [`bits`]: The [`bits::Bits`] contract with dense and sparse backings.
//! - [`hypergraph`]: The immutable hypergraph model and partition-file parser.
//! - [`elem`]: Incidence and candidate element types.
//! - [`generate`]: Incidence-set construction and the pairwise candidate scan.
//! - [`cover`]: The greedy minimal-cover solver with nearest-neighbour fill.
//! - [`driver`]: The outer growth loop and the data-distribution output sink.
//!
//! ## Performance Notes
//!
//! - Candidate generation is `O(|E|^2)` bitset distance computations per
//!   round and parallelises over the first pair index.
//! - Dense bitsets cost `O(m/64)` per operation regardless of density; the
//!   sparse backing wins when incidence vectors stay short relative to the
//!   hyperedge count.
//! - For maximum performance, compile with:
//!   `RUSTFLAGS="-C target-cpu=native" cargo build --release`

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::doc_markdown)] // Set notation in docs
#![allow(clippy::multiple_crate_versions)] // Cargo.lock management is external

use thiserror::Error;

pub mod bits;
pub mod cover;
pub mod driver;
pub mod elem;
pub mod generate;
pub mod hypergraph;
pub mod sync;

/// Errors raised by the partitioning engine. Parse-time problems are
/// reported separately as [`hypergraph::ParseError`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PartitionError {
    /// A hypernode's hyperdegree differs from the rest. The growth loop
    /// assumes uniform degree; anything else is rejected up front.
    #[error("hypernode group {index} has hyperdegree {found}, expected {expected}")]
    IrregularDegree {
        /// Index of the offending element in the deduplicated incidence set.
        index: usize,
        /// Hyperdegree of the first element.
        expected: usize,
        /// Hyperdegree found at `index`.
        found: usize,
    },
    /// The fill phase needed a nearest-neighbour entry that was never
    /// recorded. Cannot happen for a uniform-degree input with more than one
    /// element; reported rather than panicked on.
    #[error("no nearest-neighbour entry for uncovered element {index}")]
    MissingNeighbor {
        /// Index of the uncovered element.
        index: usize,
    },
    /// A hypernode ended up in more than one partition.
    #[error("site {node} was assigned to more than one partition")]
    DoubleAssignment {
        /// The doubly-assigned hypernode id.
        node: u32,
    },
    /// The growth loop ran out of rounds with requests still unserved.
    #[error("no partitioning found for requested CPU count(s) {missed:?}")]
    Exhausted {
        /// The CPU counts that were never reached.
        missed: Vec<usize>,
    },
    /// The result sink failed to write.
    #[error("cannot write result: {0}")]
    Output(String),
}

/// Re-export commonly used types for convenience.
pub mod prelude {
    pub use crate::bits::{Bits, DenseBits, SparseBits};
    pub use crate::driver::{partition, DdfWriter, PartitionConfig, ResultSink};
    pub use crate::hypergraph::{from_partition_file, Hypergraph, ParseError};
    pub use crate::PartitionError;
}
