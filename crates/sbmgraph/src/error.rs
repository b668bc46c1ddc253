//! Error types for sbmgraph.

use crate::NodeId;
use thiserror::Error;

/// Errors that can occur while building or exchanging a block-model graph.
#[derive(Error, Debug)]
pub enum Error {
    /// Block sizes do not sum to the requested node count.
    #[error("size mismatch: block sizes sum to {actual}, expected {expected} nodes")]
    SizeMismatch {
        /// Requested total node count `n`.
        expected: usize,
        /// Actual sum of the block sizes.
        actual: usize,
    },

    /// Probability matrix is not `k x k` for `k` blocks.
    #[error(
        "dimension mismatch: {blocks} blocks but probability matrix has {rows} rows{}",
        ragged_row_suffix(.row, .cols)
    )]
    DimensionMismatch {
        /// Number of blocks (`blockSizes.len()`).
        blocks: usize,
        /// Number of rows in the matrix.
        rows: usize,
        /// First row whose length differs from `blocks`, if any.
        row: Option<usize>,
        /// Length of that row.
        cols: Option<usize>,
    },

    /// Matrix rows differ in length.
    #[error("ragged matrix: row {row} has {actual} columns, expected {expected}")]
    RaggedMatrix {
        /// Offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        actual: usize,
    },

    /// Edge endpoint does not exist in the model.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Node ids in an export are not `0..n` in order.
    #[error("non-sequential node id: expected {expected}, found {actual}")]
    NonSequentialId {
        /// Position of the node in the export.
        expected: NodeId,
        /// Id the node carried.
        actual: NodeId,
    },

    /// Edge would connect a node to itself.
    #[error("self-loop on node {0}")]
    SelfLoop(NodeId),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for input-shape violations caught before any model is built.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::SizeMismatch { .. } | Self::DimensionMismatch { .. }
        )
    }
}

fn ragged_row_suffix(row: &Option<usize>, cols: &Option<usize>) -> String {
    match (row, cols) {
        (Some(r), Some(c)) => format!(" (row {r} has {c} columns)"),
        _ => String::new(),
    }
}

/// Result type for sbmgraph operations.
pub type Result<T> = std::result::Result<T, Error>;
