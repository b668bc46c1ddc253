use super::Layout;
use crate::GraphModel;
use rand::{Rng, RngCore};
use tracing::debug;

/// Uniform random positions in `[0, 1)²`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RandomLayout;

impl Layout for RandomLayout {
    fn name(&self) -> &'static str {
        "random"
    }

    fn assign(&self, graph: &mut GraphModel, rng: &mut dyn RngCore) {
        debug!(nodes = graph.node_count(), "random layout");
        let positions: Vec<(f64, f64)> = (0..graph.node_count())
            .map(|_| (rng.gen::<f64>(), rng.gen::<f64>()))
            .collect();
        graph.apply_positions(&positions);
    }
}
