//! Configuration and parameters
//!
//! Constants and per-run simulation settings.

pub mod constants;
pub mod solver_params;

pub use constants::*;
pub use solver_params::*;
