// Fixed solver constants

use crate::math::Real;

/// Sticky wall thickness, in cells, on every face of the grid.
pub const BOUNDARY: usize = 3;

/// Grid velocities are clamped to `CFL_FACTOR * dx / dt` per component.
pub const CFL_FACTOR: Real = 0.9;

/// Gravity acts along this axis.
pub const VERTICAL_AXIS: usize = 1;

/// Scale applied to the gathered velocity gradient in G2P.
pub const APIC_FACTOR: Real = 4.0;

// Snow stretch clamp: singular values stay in [1 - compression, 1 + stretch]
pub const SNOW_CRITICAL_COMPRESSION: Real = 2.5e-2;
pub const SNOW_CRITICAL_STRETCH: Real = 7.5e-3;

// Plastic volume ratio bounds
pub const JP_MIN: Real = 0.6;
pub const JP_MAX: Real = 20.0;

/// Regularizes the committed determinant when updating `Jp`.
pub const DETERMINANT_EPSILON: Real = 1e-10;

/// Particles per P2G scatter chunk. Fixed so the merge order never depends on thread count.
pub const P2G_CHUNK_SIZE: usize = 1024;
