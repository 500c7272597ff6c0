//! Quadratic B-spline interpolation stencil shared by P2G and G2P.

use crate::error::{MpmError, Result};
use crate::math::{IVector, Real, Vector, repeat_vector, sqr};

/// Nodes per axis touched by the quadratic kernel
pub const KERNEL_SIZE: usize = 3;
/// Nodes touched per particle (3x3x3)
pub const NEIGHBOR_COUNT: usize = KERNEL_SIZE * KERNEL_SIZE * KERNEL_SIZE;

/// How the per-axis weight vectors combine into a node weight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WeightScheme {
    /// `w_i.x * w_j.y * w_k.z` for every neighbor, with `w_j = (fx - 1)^2 - 0.75`.
    ///
    /// The same product is used for all 27 offsets.
    #[default]
    Reference,
    /// Standard separable quadratic B-spline, `w[j].x * w[k].y * w[l].z`.
    /// The 27 weights sum to one.
    Separable,
}

/// Stencil offsets in scatter/gather order (last axis fastest).
#[inline]
pub fn stencil_offsets() -> impl Iterator<Item = [usize; 3]> {
    (0..KERNEL_SIZE).flat_map(|j| {
        (0..KERNEL_SIZE).flat_map(move |k| (0..KERNEL_SIZE).map(move |l| [j, k, l]))
    })
}

#[inline(always)]
fn offset_vector(offset: [usize; 3]) -> Vector {
    Vector::new(offset[0] as Real, offset[1] as Real, offset[2] as Real)
}

/// Interpolation data for one particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interpolation {
    /// Lowest grid node of the stencil, `floor(x / dx - 0.5)`.
    /// A non-finite coordinate maps to `i64::MIN` so the bounds check rejects it.
    pub base_coord: IVector,
    /// Particle position relative to `base_coord`, in cells
    pub fx: Vector,
    /// Per-axis weight vectors for stencil offsets 0, 1, 2
    pub weights: [Vector; 3],
    scheme: WeightScheme,
}

impl Interpolation {
    #[inline]
    pub fn compute(position: &Vector, inv_dx: Real, scheme: WeightScheme) -> Self {
        let scaled = position * inv_dx;
        let base_coord = (scaled - repeat_vector(0.5)).map(|c| {
            if c.is_finite() {
                c.floor() as i64
            } else {
                i64::MIN
            }
        });
        let fx = scaled - base_coord.map(|c| c as Real);

        let middle = match scheme {
            WeightScheme::Reference => sqr(fx - repeat_vector(1.0)) - repeat_vector(0.75),
            WeightScheme::Separable => repeat_vector(0.75) - sqr(fx - repeat_vector(1.0)),
        };
        let weights = [
            sqr(repeat_vector(1.5) - fx) * 0.5,
            middle,
            sqr(fx - repeat_vector(0.5)) * 0.5,
        ];

        Self {
            base_coord,
            fx,
            weights,
            scheme,
        }
    }

    #[inline(always)]
    pub fn weight(&self, offset: [usize; 3]) -> Real {
        match self.scheme {
            WeightScheme::Reference => self.weights[0].x * self.weights[1].y * self.weights[2].z,
            WeightScheme::Separable => {
                self.weights[offset[0]].x * self.weights[offset[1]].y * self.weights[offset[2]].z
            }
        }
    }

    /// `offset - fx`, the node's position relative to the particle in cells.
    #[inline(always)]
    pub fn cell_distance(&self, offset: [usize; 3]) -> Vector {
        offset_vector(offset) - self.fx
    }

    #[inline(always)]
    pub fn node_coord(&self, offset: [usize; 3]) -> IVector {
        self.base_coord + IVector::new(offset[0] as i64, offset[1] as i64, offset[2] as i64)
    }

    /// Iterator over (offset, weight, cell distance) for the 27 stencil nodes.
    #[inline]
    pub fn iter_neighbors(&self) -> impl Iterator<Item = ([usize; 3], Real, Vector)> + '_ {
        stencil_offsets().map(move |offset| (offset, self.weight(offset), self.cell_distance(offset)))
    }

    /// Check the base node and every stencil node against `bound` and the grid extent.
    ///
    /// `bound` comes from the run's `StencilBound` policy; `extent` is the
    /// number of nodes per axis. The first offending coordinate is reported.
    pub fn check_bounds(&self, particle: usize, bound: i64, extent: i64) -> Result<()> {
        let check = |coord: IVector| -> Result<()> {
            for limit in [bound, extent] {
                if coord.iter().any(|&c| c < 0 || c >= limit) {
                    return Err(MpmError::OutOfBounds {
                        particle,
                        coord: [coord.x, coord.y, coord.z],
                        bound: limit,
                    });
                }
            }
            Ok(())
        };

        check(self.base_coord)?;
        for offset in stencil_offsets() {
            check(self.node_coord(offset))?;
        }
        Ok(())
    }
}
