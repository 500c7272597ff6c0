//! Time-stepping driver
//!
//! Owns the particle arrays for the whole run and a grid arena reused by every
//! step. Each step runs P2G, the grid update and G2P in that order.

use tracing::{debug, info};

use crate::config::SimulationParams;
use crate::core::{Grid, ParticleSet};
use crate::error::Result;
use crate::math::{PositionTable, Real, Vector};
use crate::solver::{grid_to_particle, grid_update, particle_to_grid};

/// Position snapshots, one N x 3 table per completed step.
pub type Trajectory = Vec<PositionTable>;

/// Diagnostics gathered while running one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport {
    pub step: usize,
    /// Total grid mass after P2G
    pub grid_mass: Real,
    /// Total grid momentum after P2G, before the grid update
    pub grid_momentum: Vector,
    /// Particle kinetic energy after G2P
    pub kinetic_energy: Real,
}

pub struct Simulation {
    params: SimulationParams,
    particles: ParticleSet,
    grid: Grid,
    steps_run: usize,
}

impl Simulation {
    pub fn new(params: SimulationParams, positions: &PositionTable) -> Result<Self> {
        params.validate()?;
        let particles = ParticleSet::from_positions(positions);
        let grid = Grid::new(params.resolution);
        Ok(Self {
            params,
            particles,
            grid,
            steps_run: 0,
        })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    /// Grid state left by the last step (post-update velocities).
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn steps_run(&self) -> usize {
        self.steps_run
    }

    pub fn step(&mut self) -> Result<StepReport> {
        self.grid.clear();

        particle_to_grid(&self.params, &self.particles, &mut self.grid)?;
        let grid_mass = self.grid.total_mass();
        let grid_momentum = self.grid.total_momentum();

        grid_update(&self.params, &mut self.grid);
        grid_to_particle(&self.params, &self.grid, &mut self.particles)?;

        let report = StepReport {
            step: self.steps_run,
            grid_mass,
            grid_momentum,
            kinetic_energy: self.particles.kinetic_energy(self.params.mass),
        };
        self.steps_run += 1;

        debug!(
            step = report.step,
            grid_mass = report.grid_mass,
            kinetic_energy = report.kinetic_energy,
            "step complete"
        );
        Ok(report)
    }

    /// Run `params.timesteps` steps and return the position after each one.
    pub fn run(&mut self) -> Result<Trajectory> {
        self.run_with_progress(|_, _| {})
    }

    /// Like `run`, calling `progress(completed, total)` after every step.
    pub fn run_with_progress<P>(&mut self, mut progress: P) -> Result<Trajectory>
    where
        P: FnMut(usize, usize),
    {
        let total = self.params.timesteps;
        info!(
            particles = self.particles.len(),
            timesteps = total,
            resolution = self.params.resolution,
            model = self.params.model.material_name(),
            "starting MPM run"
        );

        let mut trajectory = Vec::with_capacity(total);
        for completed in 1..=total {
            self.step()?;
            trajectory.push(self.particles.positions_table());
            progress(completed, total);
        }

        info!(steps = self.steps_run, "MPM run finished");
        Ok(trajectory)
    }
}

/// Run a full simulation from initial positions.
pub fn simulate(params: &SimulationParams, positions: &PositionTable) -> Result<Trajectory> {
    Simulation::new(params.clone(), positions)?.run()
}
