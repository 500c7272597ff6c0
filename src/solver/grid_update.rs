use rayon::prelude::*;

use crate::config::{SimulationParams, VERTICAL_AXIS};
use crate::core::{Grid, GridNode, apply_boundary_conditions, flat_coord};
use crate::math::Real;

/// Grid update stage (divides momentum by mass, applies gravity, clamps velocity and boundaries).
pub fn grid_update(params: &SimulationParams, grid: &mut Grid) {
    let resolution = grid.resolution();
    let nodes_per_axis = grid.nodes_per_axis();
    let gravity_step = params.dt * params.gravity;
    let v_allowed = params.v_allowed();

    grid.nodes_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(index, node)| {
            let coord = flat_coord(index, nodes_per_axis);
            update_node(node, coord, resolution, gravity_step, v_allowed);
        });
}

#[inline(always)]
pub fn update_node(
    node: &mut GridNode,
    coord: [usize; 3],
    resolution: usize,
    gravity_step: Real,
    v_allowed: Real,
) {
    if node.mass > 0.0 {
        node.velocity /= node.mass;
        node.velocity[VERTICAL_AXIS] += gravity_step;
        node.velocity = node.velocity.map(|c| c.clamp(-v_allowed, v_allowed));
    }

    apply_boundary_conditions(&mut node.velocity, coord, resolution);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector;

    fn params() -> SimulationParams {
        SimulationParams::default()
            .with_resolution(16)
            .with_cell_width(0.1)
            .with_dt(0.01)
            .with_gravity(-10.0)
    }

    #[test]
    fn momentum_becomes_velocity_with_gravity() {
        let params = params();
        let mut grid = Grid::new(params.resolution);
        *grid.node_mut(8, 8, 8) = GridNode {
            velocity: Vector::new(1.0, 2.0, -1.0),
            mass: 2.0,
        };

        grid_update(&params, &mut grid);

        let node = grid.node(8, 8, 8);
        assert_eq!(node.velocity, Vector::new(0.5, 1.0 - 0.1, -0.5));
    }

    #[test]
    fn velocity_is_clamped_to_cfl_limit() {
        let params = params();
        let mut grid = Grid::new(params.resolution);
        *grid.node_mut(8, 8, 8) = GridNode {
            velocity: Vector::new(100.0, 0.0, -100.0),
            mass: 1.0,
        };

        grid_update(&params, &mut grid);

        let limit = params.v_allowed();
        assert_eq!(grid.node(8, 8, 8).velocity.x, limit);
        assert_eq!(grid.node(8, 8, 8).velocity.z, -limit);
    }

    #[test]
    fn massless_nodes_keep_momentum_but_obey_walls() {
        let params = params();
        let mut grid = Grid::new(params.resolution);
        *grid.node_mut(1, 8, 8) = GridNode {
            velocity: Vector::new(-3.0, 0.5, 0.0),
            mass: 0.0,
        };
        *grid.node_mut(8, 8, 8) = GridNode {
            velocity: Vector::new(-3.0, 0.5, 0.0),
            mass: 0.0,
        };

        grid_update(&params, &mut grid);

        assert_eq!(grid.node(1, 8, 8).velocity, Vector::new(0.0, 0.5, 0.0));
        assert_eq!(grid.node(8, 8, 8).velocity, Vector::new(-3.0, 0.5, 0.0));
    }

    #[test]
    fn walls_apply_after_gravity() {
        let params = params();
        let mut grid = Grid::new(params.resolution);
        // at rest on the floor: gravity pulls down, the wall cancels it
        *grid.node_mut(8, 2, 8) = GridNode {
            velocity: Vector::zeros(),
            mass: 1.0,
        };

        grid_update(&params, &mut grid);

        assert_eq!(grid.node(8, 2, 8).velocity, Vector::zeros());
    }
}
