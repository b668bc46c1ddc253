//! The node/edge container every generator and layout works on.
//!
//! Nodes carry named attributes instead of a string-keyed map. Serde goes
//! through [`GraphExport`], so decoding re-checks every model invariant.

use crate::{Error, Result};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

/// Node identifier. Ids are `0..n` in creation order.
pub type NodeId = usize;

/// A node with the attributes a renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable identifier (equals the creation index).
    pub id: NodeId,
    /// Display label.
    pub label: String,
    /// Block index in `[0, k)`.
    pub block: usize,
    /// Horizontal coordinate, typically in `[0, 1]`.
    pub x: f64,
    /// Vertical coordinate, typically in `[0, 1]`.
    pub y: f64,
    /// Visual size (also the circle radius for circle packing).
    pub size: f64,
    /// CSS color, e.g. `#1f77b4`.
    pub color: String,
}

/// Summary statistics of a [`GraphModel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphStats {
    /// Number of nodes.
    pub node_count: usize,
    /// Number of edges.
    pub edge_count: usize,
    /// Number of distinct block indices (`max block + 1`).
    pub block_count: usize,
    /// `edges / C(n, 2)`, zero for fewer than two nodes.
    pub density: f64,
    /// Mean node degree.
    pub avg_degree: f64,
}

/// Plain-data form of a graph handed to renderers.
///
/// ```json
/// { "nodes": [{ "id": 0, "label": "Node 0", "block": 0, "x": 0.1, ... }],
///   "edges": [[0, 1], [0, 2]] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    /// Nodes in id order.
    pub nodes: Vec<Node>,
    /// Unordered endpoint pairs, smaller id first.
    pub edges: Vec<[NodeId; 2]>,
}

/// Simple undirected graph with per-node layout attributes.
///
/// Uses petgraph's undirected graph internally. Node ids coincide with
/// petgraph node indices, so lookups are O(1). The model never holds
/// self-loops or parallel edges.
///
/// # Example
///
/// ```rust
/// use sbmgraph::GraphModel;
///
/// let mut g = GraphModel::new();
/// let a = g.add_node(0, 0.1, 0.2, 5.0, "#d62728");
/// let b = g.add_node(1, 0.8, 0.9, 5.0, "#1f77b4");
///
/// assert!(g.add_edge(a, b).unwrap());
/// assert!(!g.add_edge(b, a).unwrap()); // already present
/// assert_eq!(g.edge_count(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "GraphExport", into = "GraphExport")]
pub struct GraphModel {
    graph: UnGraph<Node, ()>,
}

impl GraphModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self {
            graph: UnGraph::default(),
        }
    }

    /// Create an empty model with room for `nodes` nodes and `edges` edges.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            graph: UnGraph::with_capacity(nodes, edges),
        }
    }

    /// Add a node labelled `"Node {id}"` and return its id.
    pub fn add_node(
        &mut self,
        block: usize,
        x: f64,
        y: f64,
        size: f64,
        color: impl Into<String>,
    ) -> NodeId {
        let id = self.graph.node_count();
        self.graph.add_node(Node {
            id,
            label: format!("Node {id}"),
            block,
            x,
            y,
            size,
            color: color.into(),
        });
        id
    }

    /// Add an undirected edge.
    ///
    /// Returns `Ok(false)` if the edge already exists.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        for id in [a, b] {
            if id >= self.graph.node_count() {
                return Err(Error::NodeNotFound(id));
            }
        }
        if a == b {
            return Err(Error::SelfLoop(a));
        }
        if self.has_edge(a, b) {
            return Ok(false);
        }
        self.graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), ());
        Ok(true)
    }

    /// Add an edge the caller knows to be new and loop-free.
    pub(crate) fn push_edge_unchecked(&mut self, a: NodeId, b: NodeId) {
        debug_assert!(a != b && a.max(b) < self.graph.node_count());
        self.graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), ());
    }

    /// Access the underlying petgraph graph.
    pub fn as_petgraph(&self) -> &UnGraph<Node, ()> {
        &self.graph
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// True if the model has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.node_weight(NodeIndex::new(id))
    }

    /// Iterate over nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Iterate over edges as `(smaller, larger)` id pairs, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.graph.edge_references().map(|e| {
            let (a, b) = (e.source().index(), e.target().index());
            (a.min(b), a.max(b))
        })
    }

    /// True if `a` and `b` are adjacent.
    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        if a.max(b) >= self.graph.node_count() {
            return false;
        }
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .is_some()
    }

    /// Number of neighbors of `id` (0 for unknown ids).
    pub fn degree(&self, id: NodeId) -> usize {
        if id >= self.graph.node_count() {
            return 0;
        }
        self.graph.edges(NodeIndex::new(id)).count()
    }

    /// Degrees of all nodes, indexed by id.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.graph.node_count()];
        for (a, b) in self.edges() {
            degrees[a] += 1;
            degrees[b] += 1;
        }
        degrees
    }

    /// Neighbor ids of `id`.
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        if id >= self.graph.node_count() {
            return Vec::new();
        }
        self.graph
            .neighbors(NodeIndex::new(id))
            .map(NodeIndex::index)
            .collect()
    }

    /// Number of blocks referenced by nodes (`max block + 1`, or 0 if empty).
    pub fn block_count(&self) -> usize {
        self.nodes().map(|n| n.block + 1).max().unwrap_or(0)
    }

    /// Position of `id`.
    pub fn position(&self, id: NodeId) -> Option<(f64, f64)> {
        self.node(id).map(|n| (n.x, n.y))
    }

    /// Move a node. Returns `false` for unknown ids.
    ///
    /// Coordinates are the only attributes a layout may touch.
    pub fn set_position(&mut self, id: NodeId, x: f64, y: f64) -> bool {
        match self.graph.node_weight_mut(NodeIndex::new(id)) {
            Some(node) => {
                node.x = x;
                node.y = y;
                true
            }
            None => false,
        }
    }

    /// All positions, indexed by id.
    pub fn positions(&self) -> Vec<(f64, f64)> {
        self.nodes().map(|n| (n.x, n.y)).collect()
    }

    /// Write back positions produced by a layout, indexed by id.
    pub(crate) fn apply_positions(&mut self, positions: &[(f64, f64)]) {
        debug_assert_eq!(positions.len(), self.graph.node_count());
        for (node, &(x, y)) in self.graph.node_weights_mut().zip(positions) {
            node.x = x;
            node.y = y;
        }
    }

    /// Dense 0/1 adjacency matrix (symmetric), indexed by id.
    pub fn adjacency_matrix(&self) -> Vec<Vec<f64>> {
        let n = self.graph.node_count();
        let mut adj = vec![vec![0.0; n]; n];
        for (a, b) in self.edges() {
            adj[a][b] = 1.0;
            adj[b][a] = 1.0;
        }
        adj
    }

    /// Summary statistics.
    pub fn stats(&self) -> GraphStats {
        let n = self.node_count();
        let m = self.edge_count();
        let pairs = n.saturating_sub(1) * n / 2;
        GraphStats {
            node_count: n,
            edge_count: m,
            block_count: self.block_count(),
            density: if pairs == 0 {
                0.0
            } else {
                m as f64 / pairs as f64
            },
            avg_degree: if n == 0 {
                0.0
            } else {
                2.0 * m as f64 / n as f64
            },
        }
    }

    /// Plain-data snapshot for renderers.
    pub fn to_export(&self) -> GraphExport {
        GraphExport {
            nodes: self.nodes().cloned().collect(),
            edges: self.edges().map(|(a, b)| [a, b]).collect(),
        }
    }

    /// Rebuild a model from an export, re-checking every invariant.
    ///
    /// Node ids must be exactly `0..n` in order; edges must reference
    /// existing nodes and may not repeat or loop.
    pub fn from_export(export: GraphExport) -> Result<Self> {
        let mut model = Self::with_capacity(export.nodes.len(), export.edges.len());
        for (expected, node) in export.nodes.into_iter().enumerate() {
            if node.id != expected {
                return Err(Error::NonSequentialId {
                    expected,
                    actual: node.id,
                });
            }
            model.graph.add_node(node);
        }

        for [a, b] in export.edges {
            if !model.add_edge(a, b)? {
                tracing::warn!(a, b, "dropping duplicate edge in export");
            }
        }
        Ok(model)
    }

    /// Serialize the renderer export as JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_export())?)
    }

    /// Parse a renderer export from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let export: GraphExport = serde_json::from_str(json)?;
        Self::from_export(export)
    }
}

impl TryFrom<GraphExport> for GraphModel {
    type Error = Error;

    fn try_from(export: GraphExport) -> Result<Self> {
        Self::from_export(export)
    }
}

impl From<GraphModel> for GraphExport {
    fn from(model: GraphModel) -> Self {
        model.to_export()
    }
}
