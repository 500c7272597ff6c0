//! Particle-to-Grid (P2G) transfer operations
//!
//! Scatters particle mass and APIC momentum, with the fixed-corotated elastic
//! force folded into the affine term, onto the 27 surrounding grid nodes.

use rayon::prelude::*;
use tracing::error;

use crate::config::{P2G_CHUNK_SIZE, SimulationParams};
use crate::core::{
    Grid, GridAccumulator, Interpolation, NEIGHBOR_COUNT, ParticleSet, ScatterBuffer, flat_index,
};
use crate::error::Result;
use crate::materials::fixed_corotated_stress;

/// Chunks computed in parallel before being merged; bounds buffer memory.
const CHUNKS_PER_WAVE: usize = 64;

/// Stencil of particle `p`, checked against the run's bounds.
pub(crate) fn checked_interpolation(
    params: &SimulationParams,
    particles: &ParticleSet,
    p: usize,
    nodes_per_axis: usize,
) -> Result<Interpolation> {
    let interpolation = Interpolation::compute(&particles.x[p], params.inv_dx, params.weighting);
    let bound = params.stencil_bound.limit(particles.len(), params.resolution);
    interpolation
        .check_bounds(p, bound, nodes_per_axis as i64)
        .inspect_err(|err| {
            error!(particle = p, base = ?interpolation.base_coord, "{err}");
        })?;
    Ok(interpolation)
}

/// Scatter particle `p` into `out`.
pub fn scatter_particle<A: GridAccumulator>(
    params: &SimulationParams,
    particles: &ParticleSet,
    p: usize,
    nodes_per_axis: usize,
    out: &mut A,
) -> Result<()> {
    let interpolation = checked_interpolation(params, particles, p, nodes_per_axis)?;

    let (mu, lambda) = params.model.lame_parameters(
        params.mu_0,
        params.lambda_0,
        params.hardening,
        particles.jp[p],
    );
    let affine = fixed_corotated_stress(&particles.f[p], &particles.c[p], mu, lambda, params)
        .map_err(|err| err.at_particle(p))?;

    let mv = particles.v[p] * params.mass;

    for (offset, weight, cell_distance) in interpolation.iter_neighbors() {
        let dpos = cell_distance * params.dx;
        let momentum = (mv + affine * dpos) * weight;

        // check_bounds guarantees non-negative coordinates inside the grid
        let node = interpolation.node_coord(offset);
        let index = flat_index(
            [node.x as usize, node.y as usize, node.z as usize],
            nodes_per_axis,
        );
        out.scatter(index, momentum, weight * params.mass);
    }

    Ok(())
}

/// Scatter every particle onto `grid`.
///
/// Particles are processed in fixed-size chunks, each into its own
/// `ScatterBuffer`; buffers merge into the grid in particle order, so the
/// result is bit-identical for any thread count. Errors are also resolved in
/// chunk order, so a failing run reports its lowest failing particle id.
pub fn particle_to_grid(
    params: &SimulationParams,
    particles: &ParticleSet,
    grid: &mut Grid,
) -> Result<()> {
    let nodes_per_axis = grid.nodes_per_axis();
    let wave_len = P2G_CHUNK_SIZE * CHUNKS_PER_WAVE;

    for wave_start in (0..particles.len()).step_by(wave_len) {
        let wave_end = (wave_start + wave_len).min(particles.len());

        let buffers = (wave_start..wave_end)
            .into_par_iter()
            .chunks(P2G_CHUNK_SIZE)
            .map(|chunk| -> Result<ScatterBuffer> {
                let mut buffer = ScatterBuffer::with_capacity(chunk.len() * NEIGHBOR_COUNT);
                for p in chunk {
                    scatter_particle(params, particles, p, nodes_per_axis, &mut buffer)?;
                }
                Ok(buffer)
            })
            .collect::<Vec<Result<ScatterBuffer>>>()
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        for buffer in buffers {
            buffer.merge_into(grid);
        }
    }

    Ok(())
}
