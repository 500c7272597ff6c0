//! Fixed-corotated elasticity
//!
//! Produces the per-particle affine matrix that P2G scatters: the elastic force
//! contribution folded together with the APIC term `mass * C`.

use crate::config::SimulationParams;
use crate::error::Result;
use crate::math::{self, Matrix, Real};

/// Energy gradient `2 mu (F - R) F^T + lambda (J - 1) J I` of the fixed-corotated model.
pub fn corotated_energy_gradient(f: &Matrix, mu: Real, lambda: Real) -> Result<Matrix> {
    let (rotation, _stretch) = math::polar(f)?;
    let j = math::matrix_determinant(f);

    let corotation = (f - rotation) * f.transpose();
    Ok(corotation * (2.0 * mu) + math::identity_matrix() * (lambda * (j - 1.0) * j))
}

/// Stress-plus-affine matrix `-(dt * volume) * D_inv * PF + mass * C`.
pub fn fixed_corotated_stress(
    f: &Matrix,
    c: &Matrix,
    mu: Real,
    lambda: Real,
    params: &SimulationParams,
) -> Result<Matrix> {
    let pf = corotated_energy_gradient(f, mu, lambda)?;
    let stress = pf * (-(params.dt * params.volume) * params.d_inv());
    Ok(stress + c * params.mass)
}
