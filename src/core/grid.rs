//! Background grid for MPM simulation
//!
//! Dense `(resolution + 1)^3` node arena, allocated once per run and
//! zero-filled at the start of every step.

use crate::config::BOUNDARY;
use crate::math::{Real, Vector, zero_vector};

/// Grid node state.
///
/// `velocity` holds accumulated momentum after P2G and true velocity after the
/// grid update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridNode {
    pub velocity: Vector,
    pub mass: Real,
}

impl GridNode {
    #[inline(always)]
    pub fn zeroed() -> Self {
        Self {
            velocity: zero_vector(),
            mass: 0.0,
        }
    }

    #[inline(always)]
    pub fn zero(&mut self) {
        self.velocity = zero_vector();
        self.mass = 0.0;
    }
}

impl Default for GridNode {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Upper bound a stencil index is checked against, besides the grid extent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StencilBound {
    /// Indices must lie in `[0, particle_count + 1)`.
    #[default]
    ParticleCount,
    /// Indices must lie in `[0, resolution + 1)`.
    GridResolution,
}

impl StencilBound {
    #[inline]
    pub fn limit(&self, particle_count: usize, resolution: usize) -> i64 {
        match self {
            Self::ParticleCount => particle_count as i64 + 1,
            Self::GridResolution => resolution as i64 + 1,
        }
    }
}

/// Flat node index for `nodes_per_axis^3` storage (last axis fastest).
#[inline(always)]
pub fn flat_index(coord: [usize; 3], nodes_per_axis: usize) -> usize {
    (coord[0] * nodes_per_axis + coord[1]) * nodes_per_axis + coord[2]
}

#[inline(always)]
pub fn flat_coord(index: usize, nodes_per_axis: usize) -> [usize; 3] {
    let n = nodes_per_axis;
    [index / (n * n), (index / n) % n, index % n]
}

/// Sink for P2G contributions.
pub trait GridAccumulator {
    fn scatter(&mut self, index: usize, momentum: Vector, mass: Real);
}

pub struct Grid {
    nodes: Vec<GridNode>,
    resolution: usize,
}

impl Grid {
    pub fn new(resolution: usize) -> Self {
        let n = resolution + 1;
        Self {
            nodes: vec![GridNode::zeroed(); n * n * n],
            resolution,
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn nodes_per_axis(&self) -> usize {
        self.resolution + 1
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Zero every node in place.
    pub fn clear(&mut self) {
        self.nodes.iter_mut().for_each(GridNode::zero);
    }

    #[inline(always)]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        flat_index([i, j, k], self.nodes_per_axis())
    }

    #[inline(always)]
    pub fn coord(&self, index: usize) -> [usize; 3] {
        flat_coord(index, self.nodes_per_axis())
    }

    pub fn node(&self, i: usize, j: usize, k: usize) -> &GridNode {
        &self.nodes[self.index(i, j, k)]
    }

    pub fn node_mut(&mut self, i: usize, j: usize, k: usize) -> &mut GridNode {
        let index = self.index(i, j, k);
        &mut self.nodes[index]
    }

    pub fn nodes(&self) -> &[GridNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [GridNode] {
        &mut self.nodes
    }

    pub fn total_mass(&self) -> Real {
        self.nodes.iter().map(|node| node.mass).sum()
    }

    /// Sum of node momenta; only meaningful before the grid update runs.
    pub fn total_momentum(&self) -> Vector {
        self.nodes
            .iter()
            .fold(zero_vector(), |acc, node| acc + node.velocity)
    }
}

impl GridAccumulator for Grid {
    #[inline(always)]
    fn scatter(&mut self, index: usize, momentum: Vector, mass: Real) {
        let node = &mut self.nodes[index];
        node.velocity += momentum;
        node.mass += mass;
    }
}

/// Thread-local P2G contributions, merged into the grid in a fixed order.
#[derive(Default)]
pub struct ScatterBuffer {
    entries: Vec<(usize, Vector, Real)>,
}

impl ScatterBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replay the buffered contributions, in insertion order, into `target`.
    pub fn merge_into<A: GridAccumulator>(self, target: &mut A) {
        for (index, momentum, mass) in self.entries {
            target.scatter(index, momentum, mass);
        }
    }
}

impl GridAccumulator for ScatterBuffer {
    #[inline(always)]
    fn scatter(&mut self, index: usize, momentum: Vector, mass: Real) {
        self.entries.push((index, momentum, mass));
    }
}

/// Zero velocity components pointing out of the domain near its faces.
///
/// Applies to every node, with or without mass.
#[inline(always)]
pub fn apply_boundary_conditions(velocity: &mut Vector, coord: [usize; 3], resolution: usize) {
    for axis in 0..3 {
        let c = coord[axis];
        if c < BOUNDARY && velocity[axis] < 0.0 {
            velocity[axis] = 0.0;
        }
        if c + BOUNDARY >= resolution && velocity[axis] > 0.0 {
            velocity[axis] = 0.0;
        }
    }
}
