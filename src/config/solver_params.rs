use crate::core::{StencilBound, WeightScheme};
use crate::error::{MpmError, Result};
use crate::materials::MaterialModel;
use crate::math::Real;

use super::constants::CFL_FACTOR;

/// Immutable physical and numerical settings for one simulation run.
///
/// Every stage receives this by reference; nothing is read from globals.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParams {
    /// Inverse grid cell size
    pub inv_dx: Real,
    /// Hardening coefficient (`e` for the corotated model, `h` for snow)
    pub hardening: Real,
    /// Base Lamé parameters before hardening
    pub mu_0: Real,
    pub lambda_0: Real,
    /// Mass of every particle
    pub mass: Real,
    /// Grid cell size
    pub dx: Real,
    pub dt: Real,
    /// Volume of every particle
    pub volume: Real,
    /// Cells per axis; the grid holds `resolution + 1` nodes per axis
    pub resolution: usize,
    /// Signed acceleration added along the vertical axis
    pub gravity: Real,
    pub timesteps: usize,
    pub model: MaterialModel,
    pub weighting: WeightScheme,
    pub stencil_bound: StencilBound,
}

impl Default for SimulationParams {
    fn default() -> Self {
        let resolution = 32;
        let dx = 1.0 / resolution as Real;
        let volume = (dx * 0.5).powi(3);
        Self {
            inv_dx: resolution as Real,
            hardening: 1.0,
            mu_0: 5.833e4,
            lambda_0: 3.889e4,
            mass: volume,
            dx,
            dt: 1e-4,
            volume,
            resolution,
            gravity: -9.8,
            timesteps: 100,
            model: MaterialModel::CorotatedElastic,
            weighting: WeightScheme::Reference,
            stencil_bound: StencilBound::ParticleCount,
        }
    }
}

impl SimulationParams {
    /// Build parameters in the order the simulation entry point takes them.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        inv_dx: Real,
        hardening: Real,
        mu_0: Real,
        lambda_0: Real,
        mass: Real,
        dx: Real,
        dt: Real,
        volume: Real,
        resolution: usize,
        gravity: Real,
        timesteps: usize,
    ) -> Self {
        Self {
            inv_dx,
            hardening,
            mu_0,
            lambda_0,
            mass,
            dx,
            dt,
            volume,
            resolution,
            gravity,
            timesteps,
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: MaterialModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_weighting(mut self, weighting: WeightScheme) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_stencil_bound(mut self, stencil_bound: StencilBound) -> Self {
        self.stencil_bound = stencil_bound;
        self
    }

    pub fn with_timesteps(mut self, timesteps: usize) -> Self {
        self.timesteps = timesteps;
        self
    }

    pub fn with_gravity(mut self, gravity: Real) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_hardening(mut self, hardening: Real) -> Self {
        self.hardening = hardening;
        self
    }

    pub fn with_lame(mut self, mu_0: Real, lambda_0: Real) -> Self {
        self.mu_0 = mu_0;
        self.lambda_0 = lambda_0;
        self
    }

    /// Set the cell size together with its inverse.
    pub fn with_cell_width(mut self, dx: Real) -> Self {
        self.dx = dx;
        self.inv_dx = 1.0 / dx;
        self
    }

    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    /// Uniform particle mass and volume.
    pub fn with_particle(mut self, mass: Real, volume: Real) -> Self {
        self.mass = mass;
        self.volume = volume;
        self
    }

    pub fn with_dt(mut self, dt: Real) -> Self {
        self.dt = dt;
        self
    }

    /// Per-component grid velocity limit.
    #[inline]
    pub fn v_allowed(&self) -> Real {
        CFL_FACTOR * self.dx / self.dt
    }

    /// Inverse of the quadratic kernel's inertia-like tensor, `4 / dx^2`.
    #[inline]
    pub fn d_inv(&self) -> Real {
        4.0 * self.inv_dx * self.inv_dx
    }

    #[inline]
    pub fn nodes_per_axis(&self) -> usize {
        self.resolution + 1
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("dx", self.dx),
            ("inv_dx", self.inv_dx),
            ("dt", self.dt),
            ("mass", self.mass),
            ("volume", self.volume),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(MpmError::InvalidParameter(format!(
                    "{name} must be finite and positive, got {value}"
                )));
            }
        }

        let finite = [
            ("mu_0", self.mu_0),
            ("lambda_0", self.lambda_0),
            ("hardening", self.hardening),
            ("gravity", self.gravity),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(MpmError::InvalidParameter(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }

        if self.resolution == 0 {
            return Err(MpmError::InvalidParameter(
                "resolution must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
