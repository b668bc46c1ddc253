//! Quadtree for Barnes-Hut repulsion.
//!
//! Regions are stored in an arena; an internal region owns four consecutive
//! children (NW, NE, SW, SE). Leaves hold node indices, more than one only
//! at [`MAX_DEPTH`] where coincident or near-coincident nodes pile up.

use super::{repulsion_factor, Body, ForceAtlas2Settings};

const MAX_DEPTH: usize = 24;

#[derive(Debug, Clone)]
struct Region {
    cx: f64,
    cy: f64,
    half: f64,
    mass: f64,
    mass_x: f64,
    mass_y: f64,
    first_child: Option<usize>,
    nodes: Vec<usize>,
}

impl Region {
    fn new(cx: f64, cy: f64, half: f64) -> Self {
        Self {
            cx,
            cy,
            half,
            mass: 0.0,
            mass_x: 0.0,
            mass_y: 0.0,
            first_child: None,
            nodes: Vec::new(),
        }
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        (x - self.cx).abs() <= self.half && (y - self.cy).abs() <= self.half
    }

    fn quadrant(&self, x: f64, y: f64) -> usize {
        usize::from(x >= self.cx) + 2 * usize::from(y >= self.cy)
    }
}

#[derive(Debug, Clone)]
pub(super) struct QuadTree {
    regions: Vec<Region>,
}

impl QuadTree {
    pub(super) fn build(bodies: &[Body]) -> Self {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for b in bodies {
            min_x = min_x.min(b.x);
            min_y = min_y.min(b.y);
            max_x = max_x.max(b.x);
            max_y = max_y.max(b.y);
        }
        let mut tree = Self {
            regions: Vec::with_capacity(bodies.len() * 2 + 1),
        };
        if bodies.is_empty() {
            return tree;
        }

        let half = ((max_x - min_x).max(max_y - min_y) / 2.0).max(f64::EPSILON) * 1.001;
        tree.regions.push(Region::new(
            (min_x + max_x) / 2.0,
            (min_y + max_y) / 2.0,
            half,
        ));
        for i in 0..bodies.len() {
            tree.insert(0, i, bodies, 0);
        }
        tree
    }

    fn insert(&mut self, idx: usize, i: usize, bodies: &[Body], depth: usize) {
        let body = &bodies[i];
        {
            let r = &mut self.regions[idx];
            let total = r.mass + body.mass;
            r.mass_x = (r.mass_x * r.mass + body.x * body.mass) / total;
            r.mass_y = (r.mass_y * r.mass + body.y * body.mass) / total;
            r.mass = total;
        }

        if let Some(first) = self.regions[idx].first_child {
            let q = self.regions[idx].quadrant(body.x, body.y);
            self.insert(first + q, i, bodies, depth + 1);
            return;
        }

        if self.regions[idx].nodes.is_empty() || depth >= MAX_DEPTH {
            self.regions[idx].nodes.push(i);
            return;
        }

        // Occupied leaf: split and push both occupants down.
        let first = self.subdivide(idx);
        let existing = std::mem::take(&mut self.regions[idx].nodes);
        for j in existing.into_iter().chain(std::iter::once(i)) {
            let q = self.regions[idx].quadrant(bodies[j].x, bodies[j].y);
            self.insert(first + q, j, bodies, depth + 1);
        }
    }

    fn subdivide(&mut self, idx: usize) -> usize {
        let (cx, cy, half) = {
            let r = &self.regions[idx];
            (r.cx, r.cy, r.half / 2.0)
        };
        let first = self.regions.len();
        for (sx, sy) in [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
            self.regions
                .push(Region::new(cx + sx * half, cy + sy * half, half));
        }
        self.regions[idx].first_child = Some(first);
        first
    }

    /// Approximate repulsion on body `i` from every other body.
    pub(super) fn repulsion(
        &self,
        bodies: &[Body],
        i: usize,
        settings: &ForceAtlas2Settings,
    ) -> (f64, f64) {
        let mut force = (0.0, 0.0);
        if !self.regions.is_empty() {
            self.accumulate(0, bodies, i, settings, &mut force);
        }
        force
    }

    fn accumulate(
        &self,
        idx: usize,
        bodies: &[Body],
        i: usize,
        s: &ForceAtlas2Settings,
        force: &mut (f64, f64),
    ) {
        let region = &self.regions[idx];
        if region.mass <= 0.0 {
            return;
        }
        let body = &bodies[i];

        let Some(first) = region.first_child else {
            for &j in &region.nodes {
                if j == i {
                    continue;
                }
                let other = &bodies[j];
                let xd = body.x - other.x;
                let yd = body.y - other.y;
                let factor = repulsion_factor(body, other, xd, yd, s);
                force.0 += xd * factor;
                force.1 += yd * factor;
            }
            return;
        };

        let xd = body.x - region.mass_x;
        let yd = body.y - region.mass_y;
        let d2 = xd * xd + yd * yd;
        let width = 2.0 * region.half;
        if !region.contains(body.x, body.y)
            && d2 > 0.0
            && width * width < s.barnes_hut_theta * s.barnes_hut_theta * d2
        {
            let factor = s.scaling_ratio * body.mass * region.mass / d2;
            force.0 += xd * factor;
            force.1 += yd * factor;
            return;
        }

        for child in first..first + 4 {
            self.accumulate(child, bodies, i, s, force);
        }
    }
}
