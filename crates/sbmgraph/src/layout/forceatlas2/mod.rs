//! ForceAtlas2 force-directed layout.
//!
//! # Forces
//!
//! Every node carries a mass `m = 1 + degree`. Per iteration:
//!
//! ```text
//! repulsion   F_r(u, v) = k_r · m_u · m_v / d(u, v)        (all pairs)
//! attraction  F_a(u, v) = d(u, v)                          (edges; linlog: log(1 + d))
//! gravity     F_g(u)    = g · m_u                          (strong mode; else g · m_u / d(u, 0))
//! ```
//!
//! Nodes then move along their net force with an adaptive speed: the
//! "swinging" of a node (how much its force changed direction since the last
//! step) slows it down, the "traction" (how consistent the force is) speeds
//! it up. A per-node convergence term remembers past speed.
//!
//! # Settings inference
//!
//! | Setting | Inferred |
//! |---------|----------|
//! | `barnes_hut_optimize` | `n > 2000` |
//! | `strong_gravity_mode` | `true` |
//! | `gravity` | `0.05` |
//! | `scaling_ratio` | `10` |
//! | `slow_down` | `1 + ln(n)` |
//!
//! # Determinism
//!
//! The simulation itself has no randomness. Nodes sharing the exact same
//! position feel no repulsion from each other, so before the first step
//! they are separated once with a jitter drawn from the injected rng.
//!
//! # References
//!
//! - Jacomy, Venturini, Heymann & Bastian (2014). "ForceAtlas2, a Continuous
//!   Graph Layout Algorithm for Handy Network Visualization Designed for the
//!   Gephi Software". PLoS ONE 9(6).
//! - Barnes & Hut (1986). "A hierarchical O(N log N) force-calculation
//!   algorithm"

mod barnes_hut;

use super::Layout;
use crate::GraphModel;
use barnes_hut::QuadTree;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

/// Iterations run when none are requested.
pub const DEFAULT_ITERATIONS: usize = 50;

/// Node count above which inferred settings switch on Barnes-Hut.
pub const BARNES_HUT_THRESHOLD: usize = 2000;

/// Overlap penalty multiplier when `adjust_sizes` is on.
const OVERLAP_REPULSION: f64 = 100.0;

/// Spread of the coincident-node jitter, relative to the layout extent.
const JITTER_SCALE: f64 = 0.01;

/// Jitter draws per node before a collision is left in place.
const MAX_JITTER_ATTEMPTS: usize = 64;

/// ForceAtlas2 tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForceAtlas2Settings {
    /// Logarithmic attraction; tightens clusters.
    pub lin_log_mode: bool,
    /// Divide attraction by the source mass, pushing hubs to the border.
    pub outbound_attraction_distribution: bool,
    /// Treat nodes as disks of radius `size` and repel overlaps.
    pub adjust_sizes: bool,
    /// Repulsion strength `k_r`.
    pub scaling_ratio: f64,
    /// Gravity independent of distance to the center.
    pub strong_gravity_mode: bool,
    /// Gravity strength `g`.
    pub gravity: f64,
    /// Divides every displacement.
    pub slow_down: f64,
    /// Approximate repulsion with a quadtree.
    pub barnes_hut_optimize: bool,
    /// Barnes-Hut opening angle; smaller is more exact.
    pub barnes_hut_theta: f64,
}

impl Default for ForceAtlas2Settings {
    fn default() -> Self {
        Self {
            lin_log_mode: false,
            outbound_attraction_distribution: false,
            adjust_sizes: false,
            scaling_ratio: 1.0,
            strong_gravity_mode: false,
            gravity: 1.0,
            slow_down: 1.0,
            barnes_hut_optimize: false,
            barnes_hut_theta: 0.5,
        }
    }
}

impl ForceAtlas2Settings {
    /// Settings suited to a graph's size.
    pub fn infer(graph: &GraphModel) -> Self {
        Self::infer_for_order(graph.node_count())
    }

    /// Settings suited to a graph of `order` nodes.
    pub fn infer_for_order(order: usize) -> Self {
        Self {
            barnes_hut_optimize: order > BARNES_HUT_THRESHOLD,
            strong_gravity_mode: true,
            gravity: 0.05,
            scaling_ratio: 10.0,
            slow_down: 1.0 + (order.max(1) as f64).ln(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    x: f64,
    y: f64,
    dx: f64,
    dy: f64,
    old_dx: f64,
    old_dy: f64,
    mass: f64,
    size: f64,
    convergence: f64,
}

/// Repulsion factor between two bodies; multiply by the coordinate deltas.
fn repulsion_factor(a: &Body, b: &Body, xd: f64, yd: f64, s: &ForceAtlas2Settings) -> f64 {
    let coefficient = s.scaling_ratio;
    if s.adjust_sizes {
        let distance = (xd * xd + yd * yd).sqrt() - a.size - b.size;
        if distance > 0.0 {
            coefficient * a.mass * b.mass / (distance * distance)
        } else if distance < 0.0 {
            OVERLAP_REPULSION * coefficient * a.mass * b.mass
        } else {
            0.0
        }
    } else {
        let d2 = xd * xd + yd * yd;
        if d2 > 0.0 {
            coefficient * a.mass * b.mass / d2
        } else {
            0.0
        }
    }
}

/// A running ForceAtlas2 simulation.
///
/// [`ForceAtlas2Layout`] wraps this for one-shot use; hosts that need to
/// yield between iterations can drive [`step`](Self::step) themselves.
///
/// ```rust
/// use sbmgraph::generate_seeded;
/// use sbmgraph::layout::forceatlas2::{ForceAtlas2, ForceAtlas2Settings};
///
/// let mut g = generate_seeded(20, &[10, 10], &[vec![0.6, 0.05], vec![0.05, 0.6]], 3).unwrap();
/// let mut sim = ForceAtlas2::new(&g, ForceAtlas2Settings::infer(&g));
/// for _ in 0..5 {
///     sim.run(10); // a host could yield here
/// }
/// assert_eq!(sim.iterations(), 50);
/// sim.write_to(&mut g);
/// ```
#[derive(Debug, Clone)]
pub struct ForceAtlas2 {
    settings: ForceAtlas2Settings,
    bodies: Vec<Body>,
    edges: Vec<(usize, usize)>,
    iterations: usize,
}

impl ForceAtlas2 {
    /// Snapshot a graph's positions, degrees and edges.
    pub fn new(graph: &GraphModel, settings: ForceAtlas2Settings) -> Self {
        let degrees = graph.degrees();
        let bodies = graph
            .nodes()
            .map(|n| Body {
                x: n.x,
                y: n.y,
                dx: 0.0,
                dy: 0.0,
                old_dx: 0.0,
                old_dy: 0.0,
                mass: 1.0 + degrees[n.id] as f64,
                size: n.size,
                convergence: 1.0,
            })
            .collect();
        Self {
            settings,
            bodies,
            edges: graph.edges().collect(),
            iterations: 0,
        }
    }

    /// Settings in use.
    pub fn settings(&self) -> &ForceAtlas2Settings {
        &self.settings
    }

    /// Iterations run so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Current positions, indexed by node id.
    pub fn positions(&self) -> Vec<(f64, f64)> {
        self.bodies.iter().map(|b| (b.x, b.y)).collect()
    }

    /// Copy positions back into the graph the simulation was built from.
    pub fn write_to(&self, graph: &mut GraphModel) {
        graph.apply_positions(&self.positions());
    }

    /// Nudge apart nodes that share an exact position.
    ///
    /// Nodes with a non-finite coordinate are first moved to a uniform
    /// position in `[0, 1)²`. Returns the number of nodes moved.
    pub fn separate_coincident(&mut self, rng: &mut dyn RngCore) -> usize {
        let extent = self.extent().max(1.0);
        let mut moved = 0;

        let mut reset = 0;
        for body in &mut self.bodies {
            if !(body.x.is_finite() && body.y.is_finite()) {
                body.x = rng.gen::<f64>();
                body.y = rng.gen::<f64>();
                reset += 1;
            }
        }
        if reset > 0 {
            warn!(reset, "reset non-finite node positions");
            moved += reset;
        }

        let mut seen = HashSet::with_capacity(self.bodies.len());
        for body in &mut self.bodies {
            let mut attempts = 0;
            while !seen.insert((body.x.to_bits(), body.y.to_bits()))
                && attempts < MAX_JITTER_ATTEMPTS
            {
                body.x += (rng.gen::<f64>() - 0.5) * JITTER_SCALE * extent;
                body.y += (rng.gen::<f64>() - 0.5) * JITTER_SCALE * extent;
                attempts += 1;
            }
            if attempts > 0 {
                moved += 1;
            }
        }
        if moved > 0 {
            debug!(moved, "separated coincident nodes");
        }
        moved
    }

    /// Side of the bounding box of the finite positions.
    fn extent(&self) -> f64 {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        let mut any = false;
        for b in self.bodies.iter().filter(|b| b.x.is_finite() && b.y.is_finite()) {
            min_x = min_x.min(b.x);
            min_y = min_y.min(b.y);
            max_x = max_x.max(b.x);
            max_y = max_y.max(b.y);
            any = true;
        }
        if any {
            (max_x - min_x).max(max_y - min_y)
        } else {
            0.0
        }
    }

    /// Run `iterations` steps.
    pub fn run(&mut self, iterations: usize) {
        for _ in 0..iterations {
            self.step();
        }
    }

    /// One iteration: accumulate forces, then move every node.
    pub fn step(&mut self) {
        if self.bodies.is_empty() {
            return;
        }
        for b in &mut self.bodies {
            b.old_dx = b.dx;
            b.old_dy = b.dy;
            b.dx = 0.0;
            b.dy = 0.0;
        }

        if self.settings.barnes_hut_optimize {
            self.apply_repulsion_barnes_hut();
        } else {
            self.apply_repulsion_exact();
        }
        self.apply_gravity();
        self.apply_attraction();
        let swing = self.apply_forces();

        self.iterations += 1;
        trace!(iteration = self.iterations, swing, "forceatlas2 step");
    }

    fn apply_repulsion_exact(&mut self) {
        let s = self.settings;
        let n = self.bodies.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (self.bodies[i], self.bodies[j]);
                let xd = a.x - b.x;
                let yd = a.y - b.y;
                let factor = repulsion_factor(&a, &b, xd, yd, &s);
                self.bodies[i].dx += xd * factor;
                self.bodies[i].dy += yd * factor;
                self.bodies[j].dx -= xd * factor;
                self.bodies[j].dy -= yd * factor;
            }
        }
    }

    fn apply_repulsion_barnes_hut(&mut self) {
        let s = self.settings;
        let tree = QuadTree::build(&self.bodies);
        let forces: Vec<(f64, f64)> = (0..self.bodies.len())
            .map(|i| tree.repulsion(&self.bodies, i, &s))
            .collect();
        for (b, (fx, fy)) in self.bodies.iter_mut().zip(forces) {
            b.dx += fx;
            b.dy += fy;
        }
    }

    fn apply_gravity(&mut self) {
        let s = self.settings;
        // g' = g / k_r, scaled back by k_r.
        let g = s.gravity / s.scaling_ratio;
        let coefficient = s.scaling_ratio;
        for b in &mut self.bodies {
            let distance = (b.x * b.x + b.y * b.y).sqrt();
            let factor = if distance <= 0.0 {
                0.0
            } else if s.strong_gravity_mode {
                coefficient * b.mass * g
            } else {
                coefficient * b.mass * g / distance
            };
            b.dx -= b.x * factor;
            b.dy -= b.y * factor;
        }
    }

    fn apply_attraction(&mut self) {
        let s = self.settings;
        let coefficient = if s.outbound_attraction_distribution {
            self.bodies.iter().map(|b| b.mass).sum::<f64>() / self.bodies.len() as f64
        } else {
            1.0
        };

        for &(u, v) in &self.edges {
            let (a, b) = (self.bodies[u], self.bodies[v]);
            let xd = a.x - b.x;
            let yd = a.y - b.y;
            let mut distance = (xd * xd + yd * yd).sqrt();
            if s.adjust_sizes {
                distance -= a.size + b.size;
            }
            let per_mass = if s.outbound_attraction_distribution {
                a.mass
            } else {
                1.0
            };

            let factor = if s.lin_log_mode {
                if distance > 0.0 {
                    -coefficient * (1.0 + distance).ln() / distance / per_mass
                } else {
                    0.0
                }
            } else if s.adjust_sizes {
                if distance > 0.0 {
                    -coefficient / per_mass
                } else {
                    0.0
                }
            } else {
                distance = 1.0;
                -coefficient / per_mass
            };

            if distance > 0.0 {
                self.bodies[u].dx += xd * factor;
                self.bodies[u].dy += yd * factor;
                self.bodies[v].dx -= xd * factor;
                self.bodies[v].dy -= yd * factor;
            }
        }
    }

    /// Move nodes along their forces. Returns the total swinging.
    fn apply_forces(&mut self) -> f64 {
        let s = self.settings;
        let mut total_swing = 0.0;
        for b in &mut self.bodies {
            let swinging = b.mass
                * ((b.old_dx - b.dx).powi(2) + (b.old_dy - b.dy).powi(2)).sqrt();
            let traction = ((b.old_dx + b.dx).powi(2) + (b.old_dy + b.dy).powi(2)).sqrt() / 2.0;
            total_swing += swinging;

            let speed = if s.adjust_sizes {
                let speed = 0.1 * (1.0 + traction).ln() / (1.0 + swinging.sqrt());
                speed.min(10.0)
            } else {
                let speed = b.convergence * (1.0 + traction).ln() / (1.0 + swinging.sqrt());
                b.convergence = (speed * (b.dx * b.dx + b.dy * b.dy)
                    / (1.0 + swinging.sqrt()))
                .sqrt()
                .min(1.0);
                speed
            };

            b.x += b.dx * (speed / s.slow_down);
            b.y += b.dy * (speed / s.slow_down);
        }
        total_swing
    }
}

/// ForceAtlas2 as a [`Layout`].
///
/// Settings are inferred from the graph unless given. Zero iterations or an
/// empty graph leave every position untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceAtlas2Layout {
    /// Number of iterations to run.
    pub iterations: usize,
    /// Explicit settings; `None` infers them from the graph.
    pub settings: Option<ForceAtlas2Settings>,
}

impl Default for ForceAtlas2Layout {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

impl ForceAtlas2Layout {
    /// Layout running `iterations` steps with inferred settings.
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            settings: None,
        }
    }

    /// Use explicit settings instead of inferring them.
    pub fn with_settings(mut self, settings: ForceAtlas2Settings) -> Self {
        self.settings = Some(settings);
        self
    }
}

impl Layout for ForceAtlas2Layout {
    fn name(&self) -> &'static str {
        "forceatlas2"
    }

    fn assign(&self, graph: &mut GraphModel, rng: &mut dyn RngCore) {
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            iterations = self.iterations,
            "forceatlas2 layout"
        );
        if self.iterations == 0 || graph.is_empty() {
            return;
        }
        let settings = self
            .settings
            .unwrap_or_else(|| ForceAtlas2Settings::infer(graph));
        let mut sim = ForceAtlas2::new(graph, settings);
        sim.separate_coincident(rng);
        sim.run(self.iterations);
        sim.write_to(graph);
    }
}
