//! Serializable configuration snapshot.
//!
//! An [`SbmConfig`] is plain nested data (numbers and arrays), so a host can
//! store one and later rebuild the exact same graph:
//!
//! ```json
//! {
//!   "blockSizes": [3, 3],
//!   "pMatrix": [[0.9, 0.1], [0.1, 0.9]],
//!   "layout": { "kind": "forceatlas2", "params": { "iterations": 100 } },
//!   "seed": 7
//! }
//! ```
//!
//! `n` is optional and defaults to the sum of `blockSizes`. When given it
//! is checked against that sum like any other generator input.

use crate::generate::{self, StochasticBlockModel};
use crate::layout::forceatlas2::DEFAULT_ITERATIONS;
use crate::layout::{
    BlockGroupedLayout, CirclePackLayout, ForceAtlas2Layout, ForceAtlas2Settings, Layout,
    RandomLayout,
};
use crate::{GraphModel, Result};
use rand::{RngCore, SeedableRng};
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Layout choice and its parameters, as `{ "kind": ..., "params": {...} }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params")]
pub enum LayoutSpec {
    /// Uniform positions in `[0, 1)²`.
    #[default]
    #[serde(rename = "random")]
    Random,
    /// Block-aware circle packing.
    #[serde(rename = "circular")]
    Circular,
    /// ForceAtlas2 simulation.
    #[serde(rename = "forceatlas2")]
    ForceAtlas2 {
        /// Iteration count, 50 when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        iterations: Option<usize>,
        /// Explicit settings; inferred from the graph when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        settings: Option<ForceAtlas2Settings>,
    },
    /// One disk per block, disks on a circle.
    #[serde(rename = "block-grouped", rename_all = "camelCase")]
    BlockGrouped {
        /// Number of cluster centers; the graph's block count when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_count: Option<usize>,
    },
}

impl LayoutSpec {
    /// Wire name of the layout kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Circular => "circular",
            Self::ForceAtlas2 { .. } => "forceatlas2",
            Self::BlockGrouped { .. } => "block-grouped",
        }
    }

    /// Build the layout strategy for this kind and its parameters.
    pub fn to_layout(&self) -> Box<dyn Layout> {
        match self {
            Self::Random => Box::new(RandomLayout),
            Self::Circular => Box::new(CirclePackLayout::default()),
            Self::ForceAtlas2 {
                iterations,
                settings,
            } => Box::new(ForceAtlas2Layout {
                iterations: iterations.unwrap_or(DEFAULT_ITERATIONS),
                settings: *settings,
            }),
            Self::BlockGrouped { block_count } => Box::new(BlockGroupedLayout {
                block_count: *block_count,
                ..BlockGroupedLayout::default()
            }),
        }
    }
}

/// Full generator + layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SbmConfig {
    /// Requested node count; the sum of `block_sizes` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<usize>,
    /// Size of each block, in block order.
    pub block_sizes: Vec<usize>,
    /// `k x k` block edge probabilities.
    pub p_matrix: Vec<Vec<f64>>,
    /// Layout applied after generation.
    #[serde(default)]
    pub layout: LayoutSpec,
    /// Seed for [`SbmConfig::build_seeded`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl SbmConfig {
    /// Config with a random layout and no seed.
    pub fn new(block_sizes: Vec<usize>, p_matrix: Vec<Vec<f64>>) -> Self {
        Self {
            n: None,
            block_sizes,
            p_matrix,
            layout: LayoutSpec::default(),
            seed: None,
        }
    }

    /// Set the layout.
    pub fn with_layout(mut self, layout: LayoutSpec) -> Self {
        self.layout = layout;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parse from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Node count: `n` if set, else the sum of the block sizes.
    pub fn node_count(&self) -> usize {
        self.n.unwrap_or_else(|| self.block_sizes.iter().sum())
    }

    /// Check the generator inputs without building anything.
    pub fn validate(&self) -> Result<()> {
        generate::validate(self.node_count(), &self.block_sizes, &self.p_matrix)
    }

    /// Generate the graph and apply the layout, drawing from `rng`.
    pub fn build(&self, rng: &mut dyn RngCore) -> Result<GraphModel> {
        let sbm = StochasticBlockModel::with_node_count(
            self.node_count(),
            self.block_sizes.clone(),
            self.p_matrix.clone(),
        )?;
        let mut graph = sbm.sample(rng);
        let layout = self.layout.to_layout();
        debug!(layout = layout.name(), "applying configured layout");
        layout.assign(&mut graph, rng);
        Ok(graph)
    }

    /// [`build`](Self::build) with an `XorShiftRng` seeded from `seed`, or
    /// from entropy when no seed is set.
    pub fn build_seeded(&self) -> Result<GraphModel> {
        let mut rng = match self.seed {
            Some(seed) => XorShiftRng::seed_from_u64(seed),
            None => XorShiftRng::from_entropy(),
        };
        self.build(&mut rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    fn two_blocks() -> SbmConfig {
        SbmConfig::new(vec![3, 3], vec![vec![1.0, 0.0], vec![0.0, 1.0]])
    }

    #[test]
    fn test_layout_wire_shape() {
        let fa2 = LayoutSpec::ForceAtlas2 {
            iterations: Some(80),
            settings: None,
        };
        assert_eq!(
            serde_json::to_value(&fa2).unwrap(),
            json!({ "kind": "forceatlas2", "params": { "iterations": 80 } })
        );

        let grouped = LayoutSpec::BlockGrouped {
            block_count: Some(4),
        };
        assert_eq!(
            serde_json::to_value(&grouped).unwrap(),
            json!({ "kind": "block-grouped", "params": { "blockCount": 4 } })
        );

        assert_eq!(
            serde_json::to_value(LayoutSpec::Circular).unwrap(),
            json!({ "kind": "circular" })
        );
    }

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "blockSizes": [2, 3],
            "pMatrix": [[0.5, 0.1], [0.1, 0.5]],
            "layout": { "kind": "block-grouped", "params": {} },
            "seed": 11
        }"#;
        let cfg = SbmConfig::from_json_str(json).unwrap();
        assert_eq!(cfg.node_count(), 5);
        assert_eq!(cfg.seed, Some(11));
        assert_eq!(cfg.layout, LayoutSpec::BlockGrouped { block_count: None });
    }

    #[test]
    fn test_missing_layout_is_random() {
        let cfg = SbmConfig::from_json_str(r#"{"blockSizes":[1],"pMatrix":[[0.0]]}"#).unwrap();
        assert_eq!(cfg.layout, LayoutSpec::Random);
        assert_eq!(cfg.layout.to_layout().name(), "random");
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = SbmConfig::from_json_str(
            r#"{"blockSizes":[1],"pMatrix":[[0.0]],"layout":{"kind":"spiral"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_to_layout_defaults() {
        let spec = LayoutSpec::ForceAtlas2 {
            iterations: None,
            settings: None,
        };
        assert_eq!(spec.to_layout().name(), "forceatlas2");
        assert_eq!(spec.kind(), "forceatlas2");
        assert_eq!(LayoutSpec::Circular.to_layout().name(), "circular");
        assert_eq!(
            LayoutSpec::BlockGrouped { block_count: None }.kind(),
            "block-grouped"
        );
    }

    #[test]
    fn test_validate_reports_mismatch() {
        let mut cfg = two_blocks();
        assert!(cfg.validate().is_ok());

        cfg.n = Some(7);
        assert!(matches!(
            cfg.validate(),
            Err(Error::SizeMismatch {
                expected: 7,
                actual: 6
            })
        ));

        let cfg = SbmConfig::new(vec![3, 3], vec![vec![1.0, 0.0]]);
        assert!(matches!(
            cfg.validate(),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(cfg.build_seeded().is_err());
    }

    #[test]
    fn test_build_is_reproducible() {
        let cfg = two_blocks()
            .with_layout(LayoutSpec::ForceAtlas2 {
                iterations: Some(20),
                settings: None,
            })
            .with_seed(5);
        let a = cfg.build_seeded().unwrap();
        let b = cfg.build_seeded().unwrap();
        assert_eq!(a.edge_count(), 6);
        assert_eq!(a.positions(), b.positions());
    }

    #[test]
    fn test_round_trip_snapshot() {
        let cfg = two_blocks()
            .with_layout(LayoutSpec::BlockGrouped {
                block_count: Some(2),
            })
            .with_seed(1);
        let json = cfg.to_json_string().unwrap();
        assert!(json.contains("\"blockSizes\""));
        assert!(!json.contains("\"n\""));
        assert_eq!(SbmConfig::from_json_str(&json).unwrap(), cfg);
    }
}
