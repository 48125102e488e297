//! Error types for nodal-solver.

use nalgebra::DVector;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("singular matrix: no usable pivot in row {row}")]
    SingularMatrix { row: usize },

    #[error("convergence failed after {iterations} iterations (last update {delta:e})")]
    ConvergenceFailed {
        iterations: usize,
        delta: f64,
        last_iterate: DVector<f64>,
    },

    #[error("invalid matrix dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid analysis parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Device(#[from] nodal_devices::Error),

    #[error(transparent)]
    Core(#[from] nodal_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
