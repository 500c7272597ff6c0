//! Error types for the MPM solver.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MpmError {
    /// A particle's interpolation stencil left the valid index range.
    #[error("particle {particle} out of bounds: grid index {coord:?} outside [0, {bound})")]
    OutOfBounds {
        particle: usize,
        coord: [i64; 3],
        bound: i64,
    },

    /// G2P produced a NaN or infinite particle quantity.
    #[error("particle {particle} has non-finite {quantity}")]
    NonFinite {
        particle: usize,
        quantity: &'static str,
    },

    #[error("singular value decomposition did not converge (particle {particle:?})")]
    Decomposition { particle: Option<usize> },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl MpmError {
    /// Attach the particle id to a decomposition failure.
    pub fn at_particle(self, particle: usize) -> Self {
        match self {
            Self::Decomposition { .. } => Self::Decomposition {
                particle: Some(particle),
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, MpmError>;
