pub mod grid;
pub mod kernel;
pub mod particle_set;

pub use grid::{
    Grid, GridAccumulator, GridNode, ScatterBuffer, StencilBound, apply_boundary_conditions,
    flat_coord, flat_index,
};
pub use kernel::{Interpolation, KERNEL_SIZE, NEIGHBOR_COUNT, WeightScheme, stencil_offsets};
pub use particle_set::{ParticleMut, ParticleSet};
