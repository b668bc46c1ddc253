//! Stochastic Block Model sampling.
//!
//! # Model
//!
//! Nodes are split into `k` blocks of sizes `[s_0, ..., s_{k-1}]`. Every
//! unordered pair `(i, j)` is joined independently with probability
//! `P[block(i)][block(j)]`:
//!
//! ```text
//! P = | 0.9  0.05 |      block 0: dense inside, sparse across
//!     | 0.05 0.8  |      block 1: dense inside
//! ```
//!
//! Diagonal-heavy matrices give assortative communities, off-diagonal-heavy
//! matrices give (near-)bipartite structure, and a constant matrix reduces
//! to Erdős–Rényi `G(n, p)`.
//!
//! # Sampling
//!
//! Ids are handed out block by block (block 0 first), so block `b` occupies
//! a contiguous id range. Each node gets a uniform position in `[0, 1)²`,
//! size 5 and a palette color; then all `C(n, 2)` pairs are visited with
//! `i < j` and one Bernoulli draw each. For `i < j` only
//! `P[block(i)][block(j)]` is read, so an asymmetric matrix contributes
//! its upper-triangle entry (in block order).
//!
//! # Complexity
//!
//! O(n²) time, one random draw per pair.
//!
//! # References
//!
//! - Holland, Laskey & Leinhardt (1983). "Stochastic blockmodels: First steps"

use crate::{Error, GraphModel, Result};
use rand::prelude::*;
use rand_xorshift::XorShiftRng;
use tracing::{debug, warn};

/// Colors assigned to blocks, cycled with `block % len`.
pub const BLOCK_PALETTE: [&str; 10] = [
    "#d62728", "#1f77b4", "#2ca02c", "#ff7f0e", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Default visual size of a generated node.
pub const DEFAULT_NODE_SIZE: f64 = 5.0;

/// Palette color for a block. Wraps around past the palette length.
pub fn block_color(block: usize) -> &'static str {
    BLOCK_PALETTE[block % BLOCK_PALETTE.len()]
}

/// Valid but degenerate input. Never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degeneracy {
    /// `n == 0`: the graph is empty.
    NoNodes,
    /// No blocks were given.
    NoBlocks,
    /// Every probability is zero (or below): the graph is edgeless.
    EdgelessMatrix,
}

/// List the degeneracies of an input. Shape is not checked here.
pub fn detect_degeneracies(block_sizes: &[usize], p_matrix: &[Vec<f64>]) -> Vec<Degeneracy> {
    let mut found = Vec::new();
    if block_sizes.is_empty() {
        found.push(Degeneracy::NoBlocks);
    }
    if block_sizes.iter().sum::<usize>() == 0 {
        found.push(Degeneracy::NoNodes);
    }
    if !block_sizes.is_empty() && p_matrix.iter().flatten().all(|&p| p <= 0.0) {
        found.push(Degeneracy::EdgelessMatrix);
    }
    found
}

/// Check that `block_sizes` sums to `n` and `p_matrix` is `k x k`.
pub fn validate(n: usize, block_sizes: &[usize], p_matrix: &[Vec<f64>]) -> Result<()> {
    let actual: usize = block_sizes.iter().sum();
    if actual != n {
        return Err(Error::SizeMismatch {
            expected: n,
            actual,
        });
    }

    let k = block_sizes.len();
    let ragged = p_matrix.iter().position(|row| row.len() != k);
    if p_matrix.len() != k || ragged.is_some() {
        return Err(Error::DimensionMismatch {
            blocks: k,
            rows: p_matrix.len(),
            row: ragged,
            cols: ragged.map(|r| p_matrix[r].len()),
        });
    }
    Ok(())
}

/// A validated block partition plus probability matrix.
///
/// # Example
///
/// ```rust
/// use rand::SeedableRng;
/// use rand_xorshift::XorShiftRng;
/// use sbmgraph::StochasticBlockModel;
///
/// let sbm = StochasticBlockModel::new(vec![3, 3], vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
/// let g = sbm.sample(&mut XorShiftRng::seed_from_u64(7));
///
/// assert_eq!(g.node_count(), 6);
/// assert_eq!(g.edge_count(), 6); // two disjoint triangles
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StochasticBlockModel {
    block_sizes: Vec<usize>,
    p_matrix: Vec<Vec<f64>>,
    node_size: f64,
}

impl StochasticBlockModel {
    /// Build a model, deriving `n` from the block sizes.
    pub fn new(block_sizes: Vec<usize>, p_matrix: Vec<Vec<f64>>) -> Result<Self> {
        let n = block_sizes.iter().sum();
        Self::with_node_count(n, block_sizes, p_matrix)
    }

    /// Build a model for exactly `n` nodes.
    ///
    /// Fails with [`Error::SizeMismatch`] or [`Error::DimensionMismatch`].
    pub fn with_node_count(
        n: usize,
        block_sizes: Vec<usize>,
        p_matrix: Vec<Vec<f64>>,
    ) -> Result<Self> {
        validate(n, &block_sizes, &p_matrix)?;
        Ok(Self {
            block_sizes,
            p_matrix,
            node_size: DEFAULT_NODE_SIZE,
        })
    }

    /// Override the node size given to every generated node.
    pub fn with_node_size(mut self, size: f64) -> Self {
        self.node_size = size;
        self
    }

    /// Total node count.
    pub fn node_count(&self) -> usize {
        self.block_sizes.iter().sum()
    }

    /// Number of blocks `k`.
    pub fn block_count(&self) -> usize {
        self.block_sizes.len()
    }

    /// Block sizes in block order.
    pub fn block_sizes(&self) -> &[usize] {
        &self.block_sizes
    }

    /// The `k x k` probability matrix.
    pub fn p_matrix(&self) -> &[Vec<f64>] {
        &self.p_matrix
    }

    /// Block index of every node, in id order.
    pub fn block_assignment(&self) -> Vec<usize> {
        self.block_sizes
            .iter()
            .enumerate()
            .flat_map(|(b, &size)| std::iter::repeat(b).take(size))
            .collect()
    }

    /// Expected number of edges, `sum_{i<j} P[b(i)][b(j)]` (clamped to `[0, 1]`).
    pub fn expected_edge_count(&self) -> f64 {
        let k = self.block_count();
        let mut total = 0.0;
        for a in 0..k {
            let sa = self.block_sizes[a] as f64;
            let within = sa * (sa - 1.0).max(0.0) / 2.0;
            total += within * self.p_matrix[a][a].clamp(0.0, 1.0);
            for b in (a + 1)..k {
                let pairs = sa * self.block_sizes[b] as f64;
                total += pairs * self.p_matrix[a][b].clamp(0.0, 1.0);
            }
        }
        total
    }

    /// Draw a graph.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> GraphModel {
        let n = self.node_count();
        debug!(
            nodes = n,
            blocks = self.block_count(),
            expected_edges = self.expected_edge_count(),
            "sampling stochastic block model"
        );
        for degeneracy in detect_degeneracies(&self.block_sizes, &self.p_matrix) {
            warn!(?degeneracy, "degenerate block model input");
        }

        let blocks = self.block_assignment();
        let mut graph = GraphModel::with_capacity(n, self.expected_edge_count() as usize);
        for &block in &blocks {
            let x = rng.gen::<f64>();
            let y = rng.gen::<f64>();
            graph.add_node(block, x, y, self.node_size, block_color(block));
        }

        for i in 0..n {
            let row = &self.p_matrix[blocks[i]];
            for j in (i + 1)..n {
                if rng.gen::<f64>() < row[blocks[j]] {
                    graph.push_edge_unchecked(i, j);
                }
            }
        }

        debug!(edges = graph.edge_count(), "sampled stochastic block model");
        graph
    }
}

/// Generate an SBM graph with `n` nodes.
///
/// # Arguments
/// * `n` - Total node count; must equal `block_sizes.iter().sum()`
/// * `block_sizes` - Size of each block, in block order
/// * `p_matrix` - `k x k` edge probabilities between blocks
/// * `rng` - Randomness source (positions and edge draws)
///
/// # Errors
/// [`Error::SizeMismatch`] or [`Error::DimensionMismatch`]; nothing is built
/// on failure.
pub fn generate<R: Rng + ?Sized>(
    n: usize,
    block_sizes: &[usize],
    p_matrix: &[Vec<f64>],
    rng: &mut R,
) -> Result<GraphModel> {
    let sbm = StochasticBlockModel::with_node_count(n, block_sizes.to_vec(), p_matrix.to_vec())?;
    Ok(sbm.sample(rng))
}

/// [`generate`] with a fresh `XorShiftRng` seeded from `seed`.
pub fn generate_seeded(
    n: usize,
    block_sizes: &[usize],
    p_matrix: &[Vec<f64>],
    seed: u64,
) -> Result<GraphModel> {
    let mut rng = XorShiftRng::seed_from_u64(seed);
    generate(n, block_sizes, p_matrix, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(k: usize, inside: f64, across: f64) -> Vec<Vec<f64>> {
        (0..k)
            .map(|i| (0..k).map(|j| if i == j { inside } else { across }).collect())
            .collect()
    }

    #[test]
    fn test_size_mismatch() {
        let err = generate_seeded(5, &[3, 3], &diag(2, 0.5, 0.5), 1).unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                expected: 5,
                actual: 6
            }
        ));
        assert!(err.is_validation());
    }

    #[test]
    fn test_dimension_mismatch_rows() {
        let err = generate_seeded(6, &[3, 3], &diag(3, 0.5, 0.5), 1).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                blocks: 2,
                rows: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_dimension_mismatch_ragged() {
        let p = vec![vec![0.5, 0.5], vec![0.5]];
        let err = generate_seeded(6, &[3, 3], &p, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                row: Some(1),
                cols: Some(1),
                ..
            }
        ));
    }

    #[test]
    fn test_size_checked_before_dimension() {
        let err = generate_seeded(1, &[3, 3], &diag(3, 0.5, 0.5), 1).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { .. }));
    }

    #[test]
    fn test_block_order_and_attributes() {
        let g = generate_seeded(5, &[2, 0, 3], &diag(3, 0.0, 0.0), 3).unwrap();
        let blocks: Vec<_> = g.nodes().map(|n| n.block).collect();
        assert_eq!(blocks, vec![0, 0, 2, 2, 2]);
        for node in g.nodes() {
            assert_eq!(node.size, DEFAULT_NODE_SIZE);
            assert_eq!(node.color, block_color(node.block));
            assert_eq!(node.label, format!("Node {}", node.id));
            assert!((0.0..1.0).contains(&node.x));
            assert!((0.0..1.0).contains(&node.y));
        }
    }

    #[test]
    fn test_palette_wraps() {
        assert_eq!(block_color(0), "#d62728");
        assert_eq!(block_color(10), block_color(0));
        assert_eq!(block_color(13), block_color(3));
    }

    #[test]
    fn test_all_ones_is_complete() {
        let g = generate_seeded(7, &[4, 3], &diag(2, 1.0, 1.0), 11).unwrap();
        assert_eq!(g.edge_count(), 7 * 6 / 2);
    }

    #[test]
    fn test_all_zeros_is_edgeless() {
        let g = generate_seeded(7, &[4, 3], &diag(2, 0.0, 0.0), 11).unwrap();
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.node_count(), 7);
    }

    #[test]
    fn test_same_seed_same_graph() {
        let p = diag(3, 0.4, 0.1);
        let a = generate_seeded(30, &[10, 10, 10], &p, 42).unwrap();
        let b = generate_seeded(30, &[10, 10, 10], &p, 42).unwrap();
        assert_eq!(a.to_export(), b.to_export());
    }

    #[test]
    fn test_empty_input() {
        let g = generate_seeded(0, &[], &[], 0).unwrap();
        assert!(g.is_empty());
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_detect_degeneracies() {
        assert_eq!(
            detect_degeneracies(&[], &[]),
            vec![Degeneracy::NoBlocks, Degeneracy::NoNodes]
        );
        assert_eq!(
            detect_degeneracies(&[2, 2], &diag(2, 0.0, 0.0)),
            vec![Degeneracy::EdgelessMatrix]
        );
        assert!(detect_degeneracies(&[2, 2], &diag(2, 0.3, 0.0)).is_empty());
    }

    #[test]
    fn test_expected_edge_count() {
        let sbm = StochasticBlockModel::new(vec![3, 3], diag(2, 1.0, 0.0)).unwrap();
        assert!((sbm.expected_edge_count() - 6.0).abs() < 1e-12);

        let sbm = StochasticBlockModel::new(vec![2, 2], diag(2, 0.0, 0.5)).unwrap();
        assert!((sbm.expected_edge_count() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_density_tracks_probability() {
        // 200 nodes, p = 0.3: ~5970 edges, std ~ 35
        let g = generate_seeded(200, &[200], &[vec![0.3]], 5).unwrap();
        let density = g.stats().density;
        assert!((density - 0.3).abs() < 0.03, "density {density}");
    }
}
