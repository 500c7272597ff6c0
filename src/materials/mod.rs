//! Constitutive models for MPM simulation
//!
//! * `hardening` - Lamé parameter hardening laws
//! * `corotated` - fixed-corotated stress evaluation
//! * `material_types` - the per-run model selector

pub mod corotated;
pub mod hardening;
pub mod material_types;

pub use corotated::{corotated_energy_gradient, fixed_corotated_stress};
pub use hardening::{constant_hardening, snow_hardening};
pub use material_types::MaterialModel;
