// Allow minor clippy style warnings at crate level
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::needless_range_loop)]

//! Stochastic block model graphs and 2-D layouts.
//!
//! - [`generate()`] - sample a graph from a block partition and a block
//!   probability matrix
//! - [`GraphModel`] - the resulting node/edge container, with per-node
//!   `label`, `block`, `x`, `y`, `size` and `color`
//! - [`layout`] - four placement strategies behind one [`layout::Layout`]
//!   trait
//! - [`SbmConfig`] - a plain-data snapshot of a full configuration
//! - [`algo::spectral`] - latent dimension of the adjacency spectrum
//!
//! # The Stochastic Block Model
//!
//! Nodes are split into `k` blocks. An edge between `i` and `j` appears
//! independently with probability `P[block(i)][block(j)]`:
//!
//! ```text
//!            block 0   block 1
//! block 0  [   0.8      0.05  ]     dense inside blocks,
//! block 1  [   0.05     0.8   ]     sparse between them
//! ```
//!
//! | Structure | `P` shape | Looks like |
//! |-----------|-----------|------------|
//! | Assortative | large diagonal | communities |
//! | Disassortative | large off-diagonal | near-bipartite |
//! | Core-periphery | one dense row/column | hub block |
//! | Erdős–Rényi | constant | no structure |
//!
//! # Layouts
//!
//! | Layout | Uses edges | Seeded |
//! |--------|------------|--------|
//! | random | no | yes |
//! | circular (circle pack) | degree | deterministic |
//! | forceatlas2 | yes | yes |
//! | block-grouped | no | yes |
//!
//! # Example
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand_xorshift::XorShiftRng;
//! use sbmgraph::layout::{ForceAtlas2Layout, Layout};
//! use sbmgraph::generate;
//!
//! let mut rng = XorShiftRng::seed_from_u64(42);
//! let p = vec![vec![0.8, 0.05], vec![0.05, 0.8]];
//! let mut g = generate(20, &[10, 10], &p, &mut rng).unwrap();
//!
//! ForceAtlas2Layout::new(100).assign(&mut g, &mut rng);
//!
//! let stats = g.stats();
//! println!("{} nodes, {} edges", stats.node_count, stats.edge_count);
//! ```
//!
//! # References
//!
//! - Holland, Laskey & Leinhardt (1983). "Stochastic blockmodels: First steps"
//! - Jacomy et al. (2014). "ForceAtlas2, a Continuous Graph Layout Algorithm
//!   for Handy Network Visualization"
//! - Wang et al. (2006). "Visualization of large hierarchical data by circle
//!   packing"

pub mod algo;
pub mod config;
mod error;
pub mod generate;
mod graph;
pub mod layout;

pub use config::{LayoutSpec, SbmConfig};
pub use error::{Error, Result};
pub use generate::{
    block_color, detect_degeneracies, generate, generate_seeded, Degeneracy, StochasticBlockModel,
    BLOCK_PALETTE,
};
pub use graph::{GraphExport, GraphModel, GraphStats, Node, NodeId};

// Re-export petgraph for callers that want its algorithms
pub use petgraph;
