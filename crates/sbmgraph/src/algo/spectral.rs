//! Spectral embedding dimension ("polarization") of a graph.
//!
//! # Intuition
//!
//! Under a Random Dot Product Graph (RDPG) view of an SBM, the adjacency
//! matrix is a low-rank signal plus noise. Its top singular values stand
//! out from a noise bulk; the number of outliers estimates the latent
//! dimension, i.e. how many distinct "camps" the graph is split into.
//!
//! # Algorithm
//!
//! 1. Singular values of the adjacency matrix, descending. Symmetric
//!    matrices use `|λ|` of a Jacobi eigen-decomposition; others use
//!    `sqrt(λ(AᵀA))`.
//! 2. Keep the top `k`.
//! 3. Profile likelihood (Zhu & Ghodsi): for each split `q`, model the
//!    head `σ[..q]` and tail `σ[q..]` as Gaussians with their own means and
//!    a pooled variance; return the `q` with the highest log-likelihood.
//!
//! ```text
//! σ:   18.8 17.6 17.5 | 3.1 2.9 2.4 1.8 ...
//!                     ^ q = 3
//! ```
//!
//! # Complexity
//!
//! - Time: O(n³) per Jacobi sweep (usually < 10 sweeps)
//! - Space: O(n²)
//!
//! # References
//!
//! - Zhu & Ghodsi (2006). "Automatic dimensionality selection from the
//!   scree plot via the use of profile likelihood"
//! - Athreya et al. (2018). "Statistical inference on random dot product
//!   graphs: a survey"

use crate::{Error, GraphModel, Result};
use rayon::prelude::*;
use std::f64::consts::PI;
use tracing::debug;

const MAX_SWEEPS: usize = 100;
const TOLERANCE: f64 = 1e-12;

/// Eigenvalues of a symmetric matrix by cyclic Jacobi rotations.
///
/// Only the upper triangle is meaningful; the input is assumed symmetric.
pub fn symmetric_eigenvalues(matrix: &[Vec<f64>]) -> Vec<f64> {
    let n = matrix.len();
    let mut a: Vec<Vec<f64>> = matrix.to_vec();
    let scale: f64 = a.iter().flatten().map(|v| v * v).sum::<f64>().max(f64::MIN_POSITIVE);

    for sweep in 0..MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| ((p + 1)..n).map(move |q| (p, q)))
            .map(|(p, q)| a[p][q] * a[p][q])
            .sum();
        if off <= TOLERANCE * scale {
            debug!(sweep, n, "jacobi converged");
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p][q];
                if apq.abs() <= f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for row in a.iter_mut() {
                    let (akp, akq) = (row[p], row[q]);
                    row[p] = c * akp - s * akq;
                    row[q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
            }
        }
    }

    (0..n).map(|i| a[i][i]).collect()
}

fn is_symmetric(matrix: &[Vec<f64>]) -> bool {
    let n = matrix.len();
    matrix.iter().all(|row| row.len() == n)
        && (0..n).all(|i| ((i + 1)..n).all(|j| matrix[i][j] == matrix[j][i]))
}

/// Singular values of a rectangular matrix, descending.
///
/// # Errors
/// [`Error::RaggedMatrix`] if rows differ in length.
pub fn singular_values(matrix: &[Vec<f64>]) -> Result<Vec<f64>> {
    let rows = matrix.len();
    let cols = matrix.first().map_or(0, Vec::len);
    if let Some(row) = matrix.iter().position(|r| r.len() != cols) {
        return Err(Error::RaggedMatrix {
            row,
            expected: cols,
            actual: matrix[row].len(),
        });
    }

    let mut values: Vec<f64> = if is_symmetric(matrix) {
        symmetric_eigenvalues(matrix)
            .into_iter()
            .map(f64::abs)
            .collect()
    } else {
        // Gram matrix AᵀA (cols x cols).
        let gram: Vec<Vec<f64>> = (0..cols)
            .into_par_iter()
            .map(|i| {
                (0..cols)
                    .map(|j| (0..rows).map(|k| matrix[k][i] * matrix[k][j]).sum())
                    .collect()
            })
            .collect();
        symmetric_eigenvalues(&gram)
            .into_iter()
            .map(|l| l.max(0.0).sqrt())
            .collect()
    };

    values.sort_by(|a, b| b.total_cmp(a));
    values.truncate(rows.min(cols));
    Ok(values)
}

/// Top `k` singular values. `None` or `Some(0)` keeps all of them.
pub fn truncated_singular_values(matrix: &[Vec<f64>], k: Option<usize>) -> Result<Vec<f64>> {
    let mut values = singular_values(matrix)?;
    if let Some(k) = k.filter(|&k| k > 0) {
        values.truncate(k);
    }
    Ok(values)
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

/// Sample variance (n - 1 denominator); zero for fewer than two values.
fn sample_variance(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64
}

fn normal_log_pdf(x: f64, mu: f64, sigma: f64) -> f64 {
    -0.5 * (2.0 * PI).ln() - sigma.ln() - (x - mu).powi(2) / (2.0 * sigma * sigma)
}

/// Profile log-likelihood of splitting descending `values` after `q`.
///
/// Returns `-inf` when the split is not scorable (empty tail, fewer than
/// three values, or a non-positive pooled variance).
pub fn profile_log_likelihood(values: &[f64], q: usize) -> f64 {
    let p = values.len();
    if q > p {
        return f64::NEG_INFINITY;
    }
    let (head, tail) = values.split_at(q);
    if tail.is_empty() || p <= 2 {
        return f64::NEG_INFINITY;
    }

    let (mu1, mu2) = (mean(head), mean(tail));
    let q_f = q as f64;
    let p_f = p as f64;
    let pooled = ((q_f - 1.0) * sample_variance(head)
        + (p_f - q_f - 1.0) * sample_variance(tail))
        / (p_f - 2.0);
    if !pooled.is_finite() || pooled <= 0.0 {
        return f64::NEG_INFINITY;
    }

    let sigma = pooled.sqrt();
    head.iter()
        .map(|&x| normal_log_pdf(x, mu1, sigma))
        .chain(tail.iter().map(|&x| normal_log_pdf(x, mu2, sigma)))
        .sum()
}

/// Estimate the embedding dimension from descending singular values.
///
/// Returns 1 for two or fewer values, or when no split is scorable. Ties
/// go to the smaller dimension.
pub fn embedding_dimension(values: &[f64]) -> usize {
    let p = values.len();
    if p <= 2 {
        return 1;
    }
    let mut best = (1, f64::NEG_INFINITY);
    for q in 1..p {
        let ll = profile_log_likelihood(values, q);
        if ll > best.1 {
            best = (q, ll);
        }
    }
    best.0
}

/// Estimated latent dimension of a graph's adjacency matrix.
///
/// `k` caps how many singular values enter the profile likelihood; it is
/// clamped to the node count, and `None`/`Some(0)` uses all of them.
///
/// # Example
///
/// ```rust
/// use sbmgraph::algo::spectral::polarization;
/// use sbmgraph::generate_seeded;
///
/// let p = vec![
///     vec![0.9, 0.02, 0.02],
///     vec![0.02, 0.9, 0.02],
///     vec![0.02, 0.02, 0.9],
/// ];
/// let g = generate_seeded(60, &[20, 20, 20], &p, 7).unwrap();
/// assert_eq!(polarization(&g, None), 3);
/// ```
pub fn polarization(graph: &GraphModel, k: Option<usize>) -> usize {
    let n = graph.node_count();
    let k = k.filter(|&k| k > 0).map_or(n, |k| k.min(n));
    // Adjacency is square by construction.
    let values = truncated_singular_values(&graph.adjacency_matrix(), Some(k)).unwrap_or_default();
    let dimension = embedding_dimension(&values);
    debug!(nodes = n, k, dimension, "estimated embedding dimension");
    dimension
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_seeded;

    fn close(a: &[f64], b: &[f64], tol: f64) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < tol)
    }

    #[test]
    fn test_symmetric_eigenvalues() {
        let m = vec![vec![2.0, 1.0], vec![1.0, 2.0]];
        let mut ev = symmetric_eigenvalues(&m);
        ev.sort_by(f64::total_cmp);
        assert!(close(&ev, &[1.0, 3.0], 1e-10), "{ev:?}");
    }

    #[test]
    fn test_singular_values_symmetric() {
        let m = vec![
            vec![3.0, 0.0, 0.0],
            vec![0.0, -2.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        let sv = singular_values(&m).unwrap();
        assert!(close(&sv, &[3.0, 2.0, 1.0], 1e-12));
    }

    #[test]
    fn test_singular_values_general() {
        let m = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let sv = singular_values(&m).unwrap();
        assert!(close(&sv, &[5.464_985_704, 0.365_966_190], 1e-8), "{sv:?}");
    }

    #[test]
    fn test_singular_values_rectangular() {
        let m = vec![vec![1.0, 0.0, 0.0], vec![0.0, 2.0, 0.0]];
        let sv = singular_values(&m).unwrap();
        assert!(close(&sv, &[2.0, 1.0], 1e-10), "{sv:?}");
    }

    #[test]
    fn test_ragged_matrix() {
        let m = vec![vec![1.0, 0.0], vec![0.0]];
        assert!(matches!(
            singular_values(&m),
            Err(Error::RaggedMatrix {
                row: 1,
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_truncation() {
        let m = vec![
            vec![3.0, 0.0, 0.0],
            vec![0.0, 2.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        assert_eq!(truncated_singular_values(&m, Some(2)).unwrap().len(), 2);
        assert_eq!(truncated_singular_values(&m, Some(0)).unwrap().len(), 3);
        assert_eq!(truncated_singular_values(&m, None).unwrap().len(), 3);
        assert_eq!(truncated_singular_values(&m, Some(10)).unwrap().len(), 3);
    }

    #[test]
    fn test_embedding_dimension_finds_gap() {
        let sv = [10.2, 9.9, 10.1, 1.1, 0.9, 1.0, 1.05];
        assert_eq!(embedding_dimension(&sv), 3);
    }

    #[test]
    fn test_embedding_dimension_short_input() {
        assert_eq!(embedding_dimension(&[]), 1);
        assert_eq!(embedding_dimension(&[5.0, 1.0]), 1);
    }

    #[test]
    fn test_embedding_dimension_unscorable() {
        // Constant values: every pooled variance is zero.
        assert_eq!(embedding_dimension(&[2.0; 6]), 1);
    }

    #[test]
    fn test_profile_log_likelihood_edges() {
        let sv = [3.0, 2.0, 1.0];
        assert_eq!(profile_log_likelihood(&sv, 3), f64::NEG_INFINITY);
        assert_eq!(profile_log_likelihood(&sv, 4), f64::NEG_INFINITY);
        assert!(profile_log_likelihood(&sv, 1).is_finite());
    }

    #[test]
    fn test_polarization_of_three_blocks() {
        let p = vec![
            vec![0.9, 0.02, 0.02],
            vec![0.02, 0.9, 0.02],
            vec![0.02, 0.02, 0.9],
        ];
        let g = generate_seeded(60, &[20, 20, 20], &p, 7).unwrap();
        assert_eq!(polarization(&g, None), 3);
        assert_eq!(polarization(&g, Some(0)), 3);
    }

    #[test]
    fn test_polarization_empty() {
        assert_eq!(polarization(&GraphModel::new(), None), 1);
    }
}
