//! 2-D layouts for block-model graphs.
//!
//! Every layout implements [`Layout`] and only writes node coordinates; the
//! node set, edge set and all other attributes are left alone.
//!
//! | Layout | Deterministic | Reads edges | Cost |
//! |--------|---------------|-------------|------|
//! | [`RandomLayout`] | no (rng) | no | O(n) |
//! | [`CirclePackLayout`] | yes | degree only | O(n²) worst case |
//! | [`ForceAtlas2Layout`] | given a seed | yes | O(iterations · n²), O(iterations · n log n) with Barnes-Hut |
//! | [`BlockGroupedLayout`] | no (rng) | no | O(n + k) |
//!
//! Randomness is always injected, so a seeded rng reproduces a layout
//! exactly.
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand_xorshift::XorShiftRng;
//! use sbmgraph::generate_seeded;
//! use sbmgraph::layout::{BlockGroupedLayout, Layout};
//!
//! let mut g = generate_seeded(8, &[4, 4], &[vec![0.8, 0.1], vec![0.1, 0.8]], 1).unwrap();
//! let mut rng = XorShiftRng::seed_from_u64(2);
//! BlockGroupedLayout::new(2).assign(&mut g, &mut rng);
//! ```

mod block_grouped;
mod circlepack;
pub mod forceatlas2;
mod random;

pub use block_grouped::BlockGroupedLayout;
pub use circlepack::CirclePackLayout;
pub use forceatlas2::{ForceAtlas2Layout, ForceAtlas2Settings};
pub use random::RandomLayout;

use crate::{GraphModel, LayoutSpec};
use rand::RngCore;

/// A policy that assigns `x`/`y` to every node of a graph.
pub trait Layout {
    /// Short name used in logs and configs.
    fn name(&self) -> &'static str;

    /// Overwrite node positions in place.
    fn assign(&self, graph: &mut GraphModel, rng: &mut dyn RngCore);
}

/// Random layout: uniform positions in `[0, 1)²`.
pub fn random_layout(graph: &mut GraphModel, rng: &mut dyn RngCore) {
    RandomLayout.assign(graph, rng);
}

/// Circle-pack layout with default settings.
pub fn circular_layout(graph: &mut GraphModel) {
    CirclePackLayout::default().pack(graph);
}

/// ForceAtlas2 for `iterations` rounds with settings inferred from the graph.
pub fn force_atlas2(graph: &mut GraphModel, iterations: usize, rng: &mut dyn RngCore) {
    ForceAtlas2Layout::new(iterations).assign(graph, rng);
}

/// Cluster nodes around `block_count` centers on a circle.
pub fn block_grouped_layout(graph: &mut GraphModel, block_count: usize, rng: &mut dyn RngCore) {
    BlockGroupedLayout::new(block_count).assign(graph, rng);
}

/// Apply the layout a [`LayoutSpec`] describes.
pub fn apply_layout(graph: &mut GraphModel, spec: &LayoutSpec, rng: &mut dyn RngCore) {
    spec.to_layout().assign(graph, rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_seeded;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    fn sample() -> GraphModel {
        let p = vec![vec![0.7, 0.05], vec![0.05, 0.7]];
        generate_seeded(20, &[10, 10], &p, 4).unwrap()
    }

    #[test]
    fn test_apply_layout_matches_direct_call() {
        let spec = LayoutSpec::BlockGrouped {
            block_count: Some(2),
        };
        let mut a = sample();
        let mut b = sample();
        apply_layout(&mut a, &spec, &mut XorShiftRng::seed_from_u64(8));
        block_grouped_layout(&mut b, 2, &mut XorShiftRng::seed_from_u64(8));
        assert_eq!(a.positions(), b.positions());
    }

    #[test]
    fn test_layouts_only_move_nodes() {
        let original = sample();
        let specs = [
            LayoutSpec::Random,
            LayoutSpec::Circular,
            LayoutSpec::ForceAtlas2 {
                iterations: Some(10),
                settings: None,
            },
            LayoutSpec::BlockGrouped { block_count: None },
        ];
        for spec in &specs {
            let mut g = original.clone();
            apply_layout(&mut g, spec, &mut XorShiftRng::seed_from_u64(1));
            assert_eq!(g.node_count(), original.node_count(), "{}", spec.kind());
            assert!(g.edges().eq(original.edges()), "{}", spec.kind());
            for (a, b) in g.nodes().zip(original.nodes()) {
                assert_eq!((a.id, a.block, &a.color, a.size), (b.id, b.block, &b.color, b.size));
                assert!(a.x.is_finite() && a.y.is_finite());
            }
        }
    }

    #[test]
    fn test_circular_ignores_rng() {
        let mut a = sample();
        let mut b = sample();
        circular_layout(&mut a);
        apply_layout(&mut b, &LayoutSpec::Circular, &mut XorShiftRng::seed_from_u64(99));
        assert_eq!(a.positions(), b.positions());
    }
}
