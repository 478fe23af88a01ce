//! Hypergraph model and partition-file parsing.
//!
//! A hypergraph is an ordered list of hypernode ids `[0..n)` (alignment
//! sites) and an ordered list of hyperedges, each the set of sites sharing
//! one repeat class. The model is built once from input and never mutated;
//! the partitioning engine only reads it.
//!
//! The input text format is the RAxML-style partition file: the first line
//! is a global header, `partition_N <sites>` lines open a partition block,
//! and each following row assigns a repeat class to every site. One
//! hyperedge is formed per (row, repeat class) pair from the sites carrying
//! that class.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

// ============================================================================
// Model
// ============================================================================

/// Immutable hypernode/hyperedge table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hypergraph {
    node_count: u32,
    edges: Vec<Vec<u32>>,
}

impl Hypergraph {
    /// Builds a hypergraph from a node count and hyperedge member lists.
    ///
    /// # Panics
    /// Panics if a hyperedge names a node outside `[0..node_count)`.
    pub fn from_edges(node_count: u32, edges: Vec<Vec<u32>>) -> Self {
        for edge in &edges {
            for &node in edge {
                assert!(node < node_count, "hyperedge names unknown node {node}");
            }
        }
        Self { node_count, edges }
    }

    /// Number of hypernodes; ids are `0..node_count`.
    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    /// Number of hyperedges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Hyperedge member lists, in input order.
    pub fn edges(&self) -> &[Vec<u32>] {
        &self.edges
    }

    /// Number of hyperedges containing `node` (the node's hyperdegree).
    pub fn degree(&self, node: u32) -> usize {
        self.edges
            .iter()
            .filter(|edge| edge.contains(&node))
            .count()
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Errors encountered while reading or parsing a partition file.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The file could not be read.
    #[error("cannot read partition file: {0}")]
    Io(String),
    /// No `partition_N` block with the requested number exists.
    #[error("partition {wanted} not found in input")]
    MissingPartition {
        /// The requested partition number.
        wanted: u32,
    },
    /// The selected partition block contains no site rows.
    #[error("partition {wanted} is empty")]
    EmptyPartition {
        /// The requested partition number.
        wanted: u32,
    },
    /// A token that should be a number is not.
    #[error("invalid number {token:?} on line {line}")]
    InvalidNumber {
        /// 1-based input line.
        line: usize,
        /// The offending token.
        token: String,
    },
    /// A site row has the wrong number of columns.
    #[error("line {line} has {got} sites, expected {expected}")]
    RaggedRow {
        /// 1-based input line.
        line: usize,
        /// Declared site count.
        expected: usize,
        /// Actual column count.
        got: usize,
    },
    /// A repeat class id is too large for the declared site count.
    #[error("repeat class {value} on line {line} out of range (< {sites} expected)")]
    ClassOutOfRange {
        /// 1-based input line.
        line: usize,
        /// The offending class id.
        value: u32,
        /// Declared site count.
        sites: u32,
    },
}

/// Reads a partition file and builds the hypergraph of one of its partitions.
///
/// # Errors
/// Returns a [`ParseError`] if the file is unreadable or malformed, or if
/// the requested partition does not exist.
pub fn from_partition_file(
    path: impl AsRef<Path>,
    partition_number: u32,
) -> Result<Hypergraph, ParseError> {
    let text = fs::read_to_string(path.as_ref()).map_err(|e| ParseError::Io(e.to_string()))?;
    parse_partition_text(&text, partition_number)
}

/// Parses partition-file text and builds the hypergraph of one partition.
///
/// # Errors
/// Returns a [`ParseError`] if the text is malformed or the requested
/// partition does not exist.
pub fn parse_partition_text(text: &str, partition_number: u32) -> Result<Hypergraph, ParseError> {
    let mut rows: Vec<Vec<u32>> = Vec::new();
    let mut declared_sites: Option<u32> = None;
    let mut in_wanted = false;
    let mut seen_wanted = false;

    // The first line is a global header; everything else is either a
    // partition header or a site row of the current block.
    for (line_idx, line) in text.lines().enumerate().skip(1) {
        let line_no = line_idx + 1;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&first) = tokens.first() else {
            continue;
        };

        if let Some(suffix) = first.strip_prefix("partition_") {
            let number = parse_number(suffix, line_no)?;
            in_wanted = number == partition_number;
            if in_wanted {
                seen_wanted = true;
                if let Some(&sites_token) = tokens.get(1) {
                    declared_sites = Some(parse_number(sites_token, line_no)?);
                }
            }
        } else if in_wanted {
            let mut row = Vec::with_capacity(tokens.len());
            for token in tokens {
                row.push(parse_number(token, line_no)?);
            }
            if let Some(expected) = declared_sites {
                if row.len() != expected as usize {
                    return Err(ParseError::RaggedRow {
                        line: line_no,
                        expected: expected as usize,
                        got: row.len(),
                    });
                }
            }
            if let Some(&bad) = row.iter().find(|&&c| {
                c >= declared_sites.unwrap_or(row.len() as u32)
            }) {
                return Err(ParseError::ClassOutOfRange {
                    line: line_no,
                    value: bad,
                    sites: declared_sites.unwrap_or(row.len() as u32),
                });
            }
            rows.push(row);
        }
    }

    if !seen_wanted {
        return Err(ParseError::MissingPartition {
            wanted: partition_number,
        });
    }
    let Some(first_row) = rows.first() else {
        return Err(ParseError::EmptyPartition {
            wanted: partition_number,
        });
    };
    let sites = first_row.len() as u32;

    // One hyperedge per (row, repeat class): the sites carrying that class.
    // Classes are dense per row, so the first class with no member ends it.
    let mut edges: Vec<Vec<u32>> = Vec::new();
    for row in &rows {
        let mut by_class: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for (site, &class) in row.iter().enumerate() {
            by_class.entry(class).or_default().push(site as u32);
        }
        for class in 0..sites {
            match by_class.remove(&class) {
                Some(edge) => edges.push(edge),
                None => break,
            }
        }
    }

    Ok(Hypergraph::from_edges(sites, edges))
}

fn parse_number(token: &str, line: usize) -> Result<u32, ParseError> {
    token.parse().map_err(|_| ParseError::InvalidNumber {
        line,
        token: token.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================
