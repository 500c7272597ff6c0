//! Material model selector

use crate::config::{SNOW_CRITICAL_COMPRESSION, SNOW_CRITICAL_STRETCH};
use crate::math::{Real, Vector};

use super::hardening::{constant_hardening, snow_hardening};

/// Constitutive model shared by every particle of a run.
///
/// Both variants use fixed-corotated stress; they differ only in how the Lamé
/// parameters are hardened and whether G2P clamps the stretch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaterialModel {
    /// Hardening coefficient scales the Lamé parameters directly; no plasticity.
    #[default]
    CorotatedElastic,
    /// Exponential hardening driven by `Jp`, with singular value clamping.
    Snow,
}

impl MaterialModel {
    pub fn material_name(&self) -> &'static str {
        match self {
            Self::CorotatedElastic => "corotated-elastic",
            Self::Snow => "snow",
        }
    }

    /// Hardened `(mu, lambda)` for a particle with plastic volume ratio `jp`.
    #[inline]
    pub fn lame_parameters(&self, mu_0: Real, lambda_0: Real, hardening: Real, jp: Real) -> (Real, Real) {
        match self {
            Self::CorotatedElastic => constant_hardening(mu_0, lambda_0, hardening),
            Self::Snow => snow_hardening(mu_0, lambda_0, hardening, jp),
        }
    }

    /// Clamp singular values to the model's elastic range.
    #[inline]
    pub fn project_singular_values(&self, sigma: Vector) -> Vector {
        match self {
            Self::CorotatedElastic => sigma,
            Self::Snow => sigma.map(|s| {
                s.clamp(1.0 - SNOW_CRITICAL_COMPRESSION, 1.0 + SNOW_CRITICAL_STRETCH)
            }),
        }
    }
}
