//! Hardening laws scaling the Lamé parameters

use crate::math::Real;

/// Scale both Lamé parameters by `e`.
#[inline]
pub fn constant_hardening(mu: Real, lambda: Real, e: Real) -> (Real, Real) {
    (mu * e, lambda * e)
}

/// Exponential snow hardening, `e = exp(h * (1 - jp))`.
#[inline]
pub fn snow_hardening(mu: Real, lambda: Real, h: Real, jp: Real) -> (Real, Real) {
    constant_hardening(mu, lambda, (h * (1.0 - jp)).exp())
}
