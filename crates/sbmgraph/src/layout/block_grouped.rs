use super::Layout;
use crate::GraphModel;
use rand::{Rng, RngCore};
use std::f64::consts::TAU;
use tracing::{debug, warn};

/// Places each block in its own disk, disks evenly spaced on a circle.
///
/// Block `b` of `k` is centered at angle `2πb/k` on the circle of radius
/// [`radius`](Self::radius) around `(center, center)`. Nodes are spread
/// uniformly by area over a disk of radius
/// [`cluster_radius`](Self::cluster_radius): angle uniform in `[0, 2π)`,
/// distance `sqrt(u) * cluster_radius`.
///
/// A node whose block is `>= k` uses center `block % k`. When no block
/// count is set (or it is zero) the graph's own block count is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockGroupedLayout {
    /// Number of cluster centers `k`.
    pub block_count: Option<usize>,
    /// Coordinate of the circle center on both axes.
    pub center: f64,
    /// Radius of the circle the cluster centers sit on.
    pub radius: f64,
    /// Radius of each cluster disk.
    pub cluster_radius: f64,
}

impl Default for BlockGroupedLayout {
    fn default() -> Self {
        Self {
            block_count: None,
            center: 0.5,
            radius: 0.5,
            cluster_radius: 0.15,
        }
    }
}

impl BlockGroupedLayout {
    /// Layout with `block_count` centers and default geometry.
    pub fn new(block_count: usize) -> Self {
        Self {
            block_count: Some(block_count),
            ..Self::default()
        }
    }

    /// Cluster centers for `k` blocks.
    pub fn centers(&self, k: usize) -> Vec<(f64, f64)> {
        (0..k)
            .map(|b| {
                let angle = TAU * b as f64 / k as f64;
                (
                    self.center + self.radius * angle.cos(),
                    self.center + self.radius * angle.sin(),
                )
            })
            .collect()
    }

    fn resolve_block_count(&self, graph: &GraphModel) -> usize {
        match self.block_count {
            Some(k) if k > 0 => k,
            _ => graph.block_count(),
        }
    }
}

impl Layout for BlockGroupedLayout {
    fn name(&self) -> &'static str {
        "block-grouped"
    }

    fn assign(&self, graph: &mut GraphModel, rng: &mut dyn RngCore) {
        let k = self.resolve_block_count(graph);
        debug!(nodes = graph.node_count(), blocks = k, "block-grouped layout");
        if k == 0 {
            return;
        }
        let actual = graph.block_count();
        if actual > k {
            warn!(
                layout_blocks = k,
                graph_blocks = actual,
                "block count smaller than graph's; wrapping block centers"
            );
        }

        let centers = self.centers(k);
        let positions: Vec<(f64, f64)> = graph
            .nodes()
            .map(|node| {
                let (cx, cy) = centers[node.block % k];
                let angle = rng.gen::<f64>() * TAU;
                let r = rng.gen::<f64>().sqrt() * self.cluster_radius;
                (cx + r * angle.cos(), cy + r * angle.sin())
            })
            .collect();
        graph.apply_positions(&positions);
    }
}
