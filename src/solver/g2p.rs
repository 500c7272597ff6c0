//! Grid-to-Particle (G2P) transfer operations
//!
//! Gathers grid velocities and velocity gradients back onto particles, then
//! advects them and updates deformation and plastic state.

use rayon::prelude::*;
use tracing::error;

use crate::config::{
    APIC_FACTOR, DETERMINANT_EPSILON, JP_MAX, JP_MIN, SimulationParams,
};
use crate::core::{Grid, Interpolation, ParticleMut, ParticleSet, flat_index};
use crate::error::{MpmError, Result};
use crate::math::{
    self, diagonal_from_vec, identity_matrix, outer_product, zero_matrix, zero_vector,
};

/// Gather one particle from the updated grid and advance its state.
pub fn gather_particle(
    params: &SimulationParams,
    grid: &Grid,
    p: usize,
    bound: i64,
    particle: ParticleMut<'_>,
) -> Result<()> {
    let ParticleMut { x, v, f, c, jp } = particle;
    let nodes_per_axis = grid.nodes_per_axis();

    let interpolation = Interpolation::compute(x, params.inv_dx, params.weighting);
    interpolation
        .check_bounds(p, bound, nodes_per_axis as i64)
        .inspect_err(|err| {
            error!(particle = p, base = ?interpolation.base_coord, "{err}");
        })?;

    *c = zero_matrix();
    *v = zero_vector();

    for (offset, weight, dpos) in interpolation.iter_neighbors() {
        let node = interpolation.node_coord(offset);
        let index = flat_index(
            [node.x as usize, node.y as usize, node.z as usize],
            nodes_per_axis,
        );
        let weighted_velocity = grid.nodes()[index].velocity * weight;

        *v += weighted_velocity;
        *c += outer_product(weighted_velocity, dpos) * (APIC_FACTOR * params.inv_dx);
    }

    *x += *v * params.dt;
    ensure_finite(p, "position", x.iter().all(|coord| coord.is_finite()))?;

    // F' = (I + dt C) F
    let candidate = (identity_matrix() + *c * params.dt) * *f;
    let svd = math::svd3(&candidate).map_err(|err| err.at_particle(p))?;
    let sigma = params.model.project_singular_values(svd.sigma);

    // Jp tracks the volume change removed by the clamp
    let old_j = math::matrix_determinant(&candidate);
    let committed = svd.u * diagonal_from_vec(sigma) * svd.v.transpose();
    let det = math::matrix_determinant(&committed) + DETERMINANT_EPSILON;

    *jp = (*jp * old_j / det).clamp(JP_MIN, JP_MAX);
    ensure_finite(p, "plastic volume ratio", jp.is_finite())?;
    *f = committed;

    Ok(())
}

// `clamp` keeps NaN, so non-finite state is rejected explicitly
fn ensure_finite(particle: usize, quantity: &'static str, finite: bool) -> Result<()> {
    if finite {
        return Ok(());
    }
    error!(particle, quantity, "non-finite particle state");
    Err(MpmError::NonFinite { particle, quantity })
}

/// Gather every particle from the updated grid.
///
/// On failure the error of the lowest failing particle id is returned.
pub fn grid_to_particle(
    params: &SimulationParams,
    grid: &Grid,
    particles: &mut ParticleSet,
) -> Result<()> {
    let bound = params.stencil_bound.limit(particles.len(), params.resolution);

    let failure = particles.par_iter_mut().find_map_first(|(p, particle)| {
        gather_particle(params, grid, p, bound, particle).err()
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GridNode, StencilBound, WeightScheme};
    use crate::materials::MaterialModel;
    use crate::math::{Matrix, PositionTable, Real, Vector};
    use approx::assert_relative_eq;

    fn params() -> SimulationParams {
        SimulationParams::default()
            .with_resolution(16)
            .with_cell_width(1.0 / 16.0)
            .with_dt(1e-3)
            .with_weighting(WeightScheme::Separable)
            .with_stencil_bound(StencilBound::GridResolution)
    }

    fn uniform_grid(params: &SimulationParams, velocity: Vector) -> Grid {
        let mut grid = Grid::new(params.resolution);
        grid.nodes_mut().iter_mut().for_each(|node| {
            *node = GridNode {
                velocity,
                mass: 1.0,
            }
        });
        grid
    }

    fn single(position: [Real; 3]) -> ParticleSet {
        ParticleSet::from_positions(&PositionTable::from_row_slice(&position))
    }

    #[test]
    fn uniform_flow_advects_without_gradient() {
        let params = params();
        let velocity = Vector::new(1.0, -0.5, 0.25);
        let grid = uniform_grid(&params, velocity);
        let mut particles = single([0.5, 0.5, 0.5]);

        grid_to_particle(&params, &grid, &mut particles).unwrap();

        assert_relative_eq!(particles.v[0], velocity, epsilon = 1e-12);
        assert_relative_eq!(particles.c[0], Matrix::zeros(), epsilon = 1e-10);
        assert_relative_eq!(
            particles.x[0],
            Vector::new(0.5, 0.5, 0.5) + velocity * params.dt,
            epsilon = 1e-12
        );
        assert_relative_eq!(particles.f[0], identity_matrix(), epsilon = 1e-9);
        assert_relative_eq!(particles.jp[0], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn previous_velocity_and_affine_field_are_discarded() {
        let params = params();
        let grid = uniform_grid(&params, Vector::zeros());
        let mut particles = single([0.5, 0.5, 0.5]);
        particles.v[0] = Vector::new(5.0, 5.0, 5.0);
        particles.c[0] = Matrix::from_element(3.0);

        grid_to_particle(&params, &grid, &mut particles).unwrap();

        assert_eq!(particles.v[0], Vector::zeros());
        assert_eq!(particles.c[0], Matrix::zeros());
        assert_eq!(particles.x[0], Vector::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn snow_clamps_stretch_and_tracks_jp() {
        let params = params().with_model(MaterialModel::Snow);
        let grid = uniform_grid(&params, Vector::zeros());
        let mut particles = single([0.5, 0.5, 0.5]);
        particles.f[0] = math::diagonal_from_value(1.2);

        grid_to_particle(&params, &grid, &mut particles).unwrap();

        let sigma = math::svd3(&particles.f[0]).unwrap().sigma;
        for s in sigma.iter() {
            assert_relative_eq!(*s, 1.0075, epsilon = 1e-9);
        }
        // volume removed by the clamp moves into Jp
        let expected = (1.2 as Real).powi(3) / (1.0075 as Real).powi(3);
        assert_relative_eq!(particles.jp[0], expected, max_relative = 1e-8);
    }

    #[test]
    fn jp_is_clamped() {
        let params = params().with_model(MaterialModel::Snow);
        let grid = uniform_grid(&params, Vector::zeros());
        let mut particles = single([0.5, 0.5, 0.5]);
        particles.f[0] = math::diagonal_from_value(4.0);

        grid_to_particle(&params, &grid, &mut particles).unwrap();
        assert_eq!(particles.jp[0], JP_MAX);

        particles.f[0] = math::diagonal_from_value(0.5);
        particles.jp[0] = 1.0;
        grid_to_particle(&params, &grid, &mut particles).unwrap();
        assert_eq!(particles.jp[0], JP_MIN);
    }

    #[test]
    fn corotated_keeps_deformation() {
        let params = params();
        let grid = uniform_grid(&params, Vector::zeros());
        let mut particles = single([0.5, 0.5, 0.5]);
        let f = Matrix::new(1.1, 0.05, 0.0, 0.0, 0.95, 0.02, 0.01, 0.0, 1.02);
        particles.f[0] = f;

        grid_to_particle(&params, &grid, &mut particles).unwrap();

        assert_relative_eq!(particles.f[0], f, epsilon = 1e-12);
        assert_relative_eq!(particles.jp[0], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn out_of_bounds_particle_aborts() {
        let params = params();
        let grid = uniform_grid(&params, Vector::zeros());
        let mut particles = single([-0.01, 0.5, 0.5]);

        let err = grid_to_particle(&params, &grid, &mut particles).unwrap_err();
        assert!(matches!(err, MpmError::OutOfBounds { particle: 0, .. }));
    }

    #[test]
    fn reference_weights_gather_27_shared_contributions() {
        let params = params().with_weighting(WeightScheme::Reference);
        let velocity = Vector::new(0.4, -0.2, 0.1);
        let grid = uniform_grid(&params, velocity);
        let mut particles = single([0.52, 0.47, 0.55]);
        let interp =
            Interpolation::compute(&particles.x[0], params.inv_dx, WeightScheme::Reference);
        let w = interp.weights[0].x * interp.weights[1].y * interp.weights[2].z;

        grid_to_particle(&params, &grid, &mut particles).unwrap();

        assert_relative_eq!(particles.v[0], velocity * (27.0 * w), max_relative = 1e-12);
        // offsets 0, 1, 2 on each axis: sum of (offset - fx) is 27 (1 - fx)
        let moment = (Vector::repeat(1.0) - interp.fx) * 27.0;
        let expected_c = outer_product(velocity * w, moment) * (APIC_FACTOR * params.inv_dx);
        assert_relative_eq!(particles.c[0], expected_c, epsilon = 1e-12, max_relative = 1e-10);
    }

    #[test]
    fn nan_grid_velocity_is_fatal() {
        let params = params();
        let grid = uniform_grid(&params, Vector::new(Real::NAN, 0.0, 0.0));
        let mut particles = single([0.5, 0.5, 0.5]);

        let err = grid_to_particle(&params, &grid, &mut particles).unwrap_err();
        assert_eq!(
            err,
            MpmError::NonFinite {
                particle: 0,
                quantity: "position"
            }
        );
    }

    #[test]
    fn failing_gather_reports_lowest_particle() {
        let params = params();
        let grid = uniform_grid(&params, Vector::zeros());
        let mut data = Vec::new();
        for p in 0..4096 {
            let x = if p == 700 || p == 2500 { -0.01 } else { 0.5 };
            data.extend([x, 0.5, 0.5]);
        }
        let table = PositionTable::from_row_slice(&data);

        for _ in 0..4 {
            let mut particles = ParticleSet::from_positions(&table);
            let err = grid_to_particle(&params, &grid, &mut particles).unwrap_err();
            assert!(matches!(err, MpmError::OutOfBounds { particle: 700, .. }));
        }
    }
}
