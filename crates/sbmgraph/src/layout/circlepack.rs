//! Hierarchical circle packing.
//!
//! Each node is a circle of radius `size`. Nodes are grouped by block,
//! every group is packed into a tight cluster, and the clusters are packed
//! again around the origin. The final pack is scaled into a disk of radius
//! `scale` around `(center, center)`.
//!
//! # Sibling packing
//!
//! The front-chain algorithm of Wang et al. places circles one at a time,
//! each tangent to two circles of the current outer boundary ("front
//! chain"), choosing the pair closest to the origin. The first circles end
//! up in the middle and later circles wrap around them in rings. Inside a
//! block, circles are fed in descending degree order (ties by id), so the
//! best-connected nodes form the core and weakly connected nodes the
//! outer rings.
//!
//! ```text
//!          ( 7 )( 4 )( 8 )
//!       ( 5 )( 1 )( 0 )( 3 )
//!          ( 6 )( 2 )( 9 )
//! ```
//!
//! No randomness is involved.
//!
//! # References
//!
//! - Wang, Wang, Dai & Wang (2006). "Visualization of large hierarchical
//!   data by circle packing"

use super::Layout;
use crate::{GraphModel, NodeId};
use rand::RngCore;
use std::collections::BTreeMap;
use tracing::debug;

const TOUCH_EPSILON: f64 = 1e-6;

/// Deterministic circle-pack layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CirclePackLayout {
    /// Coordinate of the pack center on both axes.
    pub center: f64,
    /// Radius of the disk the pack is scaled into.
    pub scale: f64,
    /// Pack each block as its own cluster first.
    pub group_by_block: bool,
}

impl Default for CirclePackLayout {
    fn default() -> Self {
        Self {
            center: 0.5,
            scale: 0.5,
            group_by_block: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Circle {
    x: f64,
    y: f64,
    r: f64,
}

impl CirclePackLayout {
    /// Node ids per cluster in packing order: clusters by block index,
    /// members by descending degree, then id.
    fn groups(&self, graph: &GraphModel) -> Vec<Vec<NodeId>> {
        let degrees = graph.degrees();
        let mut groups: BTreeMap<usize, Vec<NodeId>> = BTreeMap::new();
        for node in graph.nodes() {
            let key = if self.group_by_block { node.block } else { 0 };
            groups.entry(key).or_default().push(node.id);
        }
        groups
            .into_values()
            .map(|mut ids| {
                ids.sort_by(|&a, &b| degrees[b].cmp(&degrees[a]).then(a.cmp(&b)));
                ids
            })
            .collect()
    }

    /// Compute and apply the layout. Needs no randomness.
    pub fn pack(&self, graph: &mut GraphModel) {
        debug!(
            nodes = graph.node_count(),
            grouped = self.group_by_block,
            "circle-pack layout"
        );
        if graph.is_empty() {
            return;
        }

        let groups = self.groups(graph);
        let mut leaves: Vec<Circle> = graph
            .nodes()
            .map(|n| Circle {
                x: 0.0,
                y: 0.0,
                r: if n.size > 0.0 { n.size } else { 1.0 },
            })
            .collect();

        // Pack each group, then pack the group circles.
        let mut parents = Vec::with_capacity(groups.len());
        let mut members = Vec::with_capacity(groups.len());
        for ids in groups {
            let mut circles: Vec<Circle> = ids.iter().map(|&id| leaves[id]).collect();
            let r = pack_siblings(&mut circles);
            for (&id, c) in ids.iter().zip(&circles) {
                leaves[id] = *c;
            }
            parents.push(Circle { x: 0.0, y: 0.0, r });
            members.push(ids);
        }
        let outer = pack_siblings(&mut parents).max(f64::MIN_POSITIVE);

        let k = self.scale / outer;
        let positions: Vec<(f64, f64)> = {
            let mut out = vec![(0.0, 0.0); leaves.len()];
            for (parent, ids) in parents.iter().zip(&members) {
                for &id in ids {
                    let leaf = leaves[id];
                    out[id] = (
                        self.center + (parent.x + leaf.x) * k,
                        self.center + (parent.y + leaf.y) * k,
                    );
                }
            }
            out
        };
        graph.apply_positions(&positions);
    }
}

impl Layout for CirclePackLayout {
    fn name(&self) -> &'static str {
        "circular"
    }

    fn assign(&self, graph: &mut GraphModel, _rng: &mut dyn RngCore) {
        self.pack(graph);
    }
}

/// Place `c` tangent to both `a` and `b`.
fn place(b: Circle, a: Circle, c: &mut Circle) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let d2 = dx * dx + dy * dy;
    if d2 > 0.0 {
        let a2 = (a.r + c.r).powi(2);
        let b2 = (b.r + c.r).powi(2);
        if a2 > b2 {
            let x = (d2 + b2 - a2) / (2.0 * d2);
            let y = (b2 / d2 - x * x).max(0.0).sqrt();
            c.x = b.x - x * dx - y * dy;
            c.y = b.y - x * dy + y * dx;
        } else {
            let x = (d2 + a2 - b2) / (2.0 * d2);
            let y = (a2 / d2 - x * x).max(0.0).sqrt();
            c.x = a.x + x * dx - y * dy;
            c.y = a.y + x * dy + y * dx;
        }
    } else {
        c.x = a.x + c.r;
        c.y = a.y;
    }
}

fn intersects(a: Circle, b: Circle) -> bool {
    let dr = a.r + b.r - TOUCH_EPSILON;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

/// Squared distance from the origin to the weighted tangent point of `a`, `b`.
fn score(a: Circle, b: Circle) -> f64 {
    let ab = a.r + b.r;
    let dx = (a.x * b.r + b.x * a.r) / ab;
    let dy = (a.y * b.r + b.y * a.r) / ab;
    dx * dx + dy * dy
}

/// Pack circles in place around the origin and return the enclosing radius.
///
/// The front chain is a circular doubly linked list over circle indices.
fn pack_siblings(circles: &mut [Circle]) -> f64 {
    let n = circles.len();
    if n == 0 {
        return 0.0;
    }

    circles[0].x = 0.0;
    circles[0].y = 0.0;
    if n == 1 {
        return circles[0].r;
    }

    circles[0].x = -circles[1].r;
    circles[1].x = circles[0].r;
    circles[1].y = 0.0;
    if n == 2 {
        return recenter(circles);
    }

    let (c0, c1) = (circles[0], circles[1]);
    place(c1, c0, &mut circles[2]);

    let mut next = vec![0usize; n];
    let mut prev = vec![0usize; n];
    // Front chain: 0 -> 1 -> 2 -> 0.
    let (mut a, mut b) = (0usize, 1usize);
    next[0] = 1;
    prev[1] = 0;
    next[1] = 2;
    prev[2] = 1;
    next[2] = 0;
    prev[0] = 2;

    let mut i = 3;
    'pack: while i < n {
        let (ca, cb) = (circles[a], circles[b]);
        place(ca, cb, &mut circles[i]);
        let c = i;

        // Look for the nearest circle on the chain that overlaps `c`,
        // walking forward from `b` and backward from `a` in step.
        let mut j = next[b];
        let mut k = prev[a];
        let mut sj = circles[b].r;
        let mut sk = circles[a].r;
        loop {
            if sj <= sk {
                if intersects(circles[j], circles[c]) {
                    b = j;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sj += circles[j].r;
                j = next[j];
            } else {
                if intersects(circles[k], circles[c]) {
                    a = k;
                    next[a] = b;
                    prev[b] = a;
                    continue 'pack;
                }
                sk += circles[k].r;
                k = prev[k];
            }
            if j == next[k] {
                break;
            }
        }

        // Insert c between a and b.
        prev[c] = a;
        next[c] = b;
        next[a] = c;
        prev[b] = c;
        b = c;

        // New anchor pair: the chain pair closest to the origin.
        let mut best = score(circles[a], circles[next[a]]);
        let mut node = next[c];
        while node != b {
            let s = score(circles[node], circles[next[node]]);
            if s < best {
                a = node;
                best = s;
            }
            node = next[node];
        }
        b = next[a];
        i += 1;
    }

    // Enclose the front chain, which bounds every circle.
    let mut chain = vec![b];
    let mut node = next[b];
    while node != b {
        chain.push(node);
        node = next[node];
    }
    let chain_circles: Vec<Circle> = chain.iter().map(|&idx| circles[idx]).collect();
    center_on(circles, &chain_circles)
}

/// Center all circles on their smallest enclosing circle.
fn recenter(circles: &mut [Circle]) -> f64 {
    let boundary = circles.to_vec();
    center_on(circles, &boundary)
}

/// Move the smallest circle enclosing `boundary` to the origin and return
/// the radius that contains every circle.
fn center_on(circles: &mut [Circle], boundary: &[Circle]) -> f64 {
    let (ex, ey) = match enclose(boundary) {
        Some(e) => (e.x, e.y),
        None => bounding_center(boundary),
    };
    for circle in circles.iter_mut() {
        circle.x -= ex;
        circle.y -= ey;
    }
    enclosing_radius(circles)
}

fn bounding_center(circles: &[Circle]) -> (f64, f64) {
    let mut min = (f64::INFINITY, f64::INFINITY);
    let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for c in circles {
        min.0 = min.0.min(c.x - c.r);
        min.1 = min.1.min(c.y - c.r);
        max.0 = max.0.max(c.x + c.r);
        max.1 = max.1.max(c.y + c.r);
    }
    ((min.0 + max.0) / 2.0, (min.1 + max.1) / 2.0)
}

/// Radius of the origin-centered circle containing every circle.
fn enclosing_radius(circles: &[Circle]) -> f64 {
    circles
        .iter()
        .map(|c| (c.x * c.x + c.y * c.y).sqrt() + c.r)
        .fold(0.0, f64::max)
}

/// Smallest circle enclosing every circle (Welzl, move-to-front).
///
/// `None` for an empty input or when a basis degenerates (e.g. two
/// coincident circles of equal radius leave no unique tangent line).
fn enclose(circles: &[Circle]) -> Option<Circle> {
    let mut basis: Vec<Circle> = Vec::with_capacity(3);
    let mut e: Option<Circle> = None;
    let mut i = 0;
    while i < circles.len() {
        let p = circles[i];
        if e.is_some_and(|e| encloses_weak(e, p)) {
            i += 1;
        } else {
            basis = extend_basis(&basis, p)?;
            let circle = enclose_basis(&basis)?;
            if !(circle.x.is_finite() && circle.y.is_finite() && circle.r.is_finite()) {
                return None;
            }
            e = Some(circle);
            i = 0;
        }
    }
    e
}

fn extend_basis(basis: &[Circle], p: Circle) -> Option<Vec<Circle>> {
    if encloses_weak_all(p, basis) {
        return Some(vec![p]);
    }
    for &b in basis {
        if encloses_not(p, b) && encloses_weak_all(enclose2(b, p), basis) {
            return Some(vec![b, p]);
        }
    }
    for i in 0..basis.len().saturating_sub(1) {
        for j in (i + 1)..basis.len() {
            let (a, b) = (basis[i], basis[j]);
            if encloses_not(enclose2(a, b), p)
                && encloses_not(enclose2(a, p), b)
                && encloses_not(enclose2(b, p), a)
                && encloses_weak_all(enclose3(a, b, p), basis)
            {
                return Some(vec![a, b, p]);
            }
        }
    }
    None
}

/// `a` fails to contain `b`.
fn encloses_not(a: Circle, b: Circle) -> bool {
    let dr = a.r - b.r;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr < 0.0 || dr * dr < dx * dx + dy * dy
}

/// `a` contains `b`, up to a relative tolerance.
fn encloses_weak(a: Circle, b: Circle) -> bool {
    let dr = a.r - b.r + a.r.max(b.r).max(1.0) * 1e-9;
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dr > 0.0 && dr * dr > dx * dx + dy * dy
}

fn encloses_weak_all(a: Circle, basis: &[Circle]) -> bool {
    basis.iter().all(|&b| encloses_weak(a, b))
}

fn enclose_basis(basis: &[Circle]) -> Option<Circle> {
    match *basis {
        [a] => Some(a),
        [a, b] => Some(enclose2(a, b)),
        [a, b, c] => Some(enclose3(a, b, c)),
        _ => None,
    }
}

fn enclose2(a: Circle, b: Circle) -> Circle {
    let (x21, y21, r21) = (b.x - a.x, b.y - a.y, b.r - a.r);
    let l = (x21 * x21 + y21 * y21).sqrt();
    Circle {
        x: (a.x + b.x + x21 / l * r21) / 2.0,
        y: (a.y + b.y + y21 / l * r21) / 2.0,
        r: (l + a.r + b.r) / 2.0,
    }
}

/// Circle internally tangent to `a`, `b` and `c` (Apollonius).
fn enclose3(a: Circle, b: Circle, c: Circle) -> Circle {
    let (x1, y1, r1) = (a.x, a.y, a.r);
    let (a2, a3) = (x1 - b.x, x1 - c.x);
    let (b2, b3) = (y1 - b.y, y1 - c.y);
    let (c2, c3) = (b.r - r1, c.r - r1);
    let d1 = x1 * x1 + y1 * y1 - r1 * r1;
    let d2 = d1 - b.x * b.x - b.y * b.y + b.r * b.r;
    let d3 = d1 - c.x * c.x - c.y * c.y + c.r * c.r;
    let ab = a3 * b2 - a2 * b3;
    let xa = (b2 * d3 - b3 * d2) / (ab * 2.0) - x1;
    let xb = (b3 * c2 - b2 * c3) / ab;
    let ya = (a3 * d2 - a2 * d3) / (ab * 2.0) - y1;
    let yb = (a2 * c3 - a3 * c2) / ab;
    let qa = xb * xb + yb * yb - 1.0;
    let qb = 2.0 * (r1 + xa * xb + ya * yb);
    let qc = xa * xa + ya * ya - r1 * r1;
    let r = -(if qa.abs() > 1e-6 {
        (qb + (qb * qb - 4.0 * qa * qc).sqrt()) / (2.0 * qa)
    } else {
        qc / qb
    });
    Circle {
        x: x1 + xa + xb * r,
        y: y1 + ya + yb * r,
        r,
    }
}
