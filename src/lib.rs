//! Offline explicit Material Point Method solver.
//!
//! Elastic and snow-like continua are carried by Lagrangian particles and
//! advanced through a fixed background grid with APIC transfers and
//! quadratic B-spline interpolation.

pub mod config;
pub mod core;
pub mod error;
pub mod materials;
pub mod math;
pub mod simulation;
pub mod solver;

// Public re-exports for clean API
pub use config::SimulationParams;
pub use self::core::{Grid, GridNode, ParticleSet, StencilBound, WeightScheme};
pub use error::{MpmError, Result};
pub use materials::{MaterialModel, fixed_corotated_stress};
pub use math::{Matrix, PositionTable, Real, Vector, polar};
pub use simulation::{Simulation, StepReport, Trajectory, simulate};
