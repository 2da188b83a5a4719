//! Error kinds for the IIT core, per the error handling design: validation
//! errors propagate untouched, reducibility and cache misses are results
//! rather than errors.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IITError>;

#[derive(Debug, Error)]
pub enum IITError {
    /// Malformed TPM/CM/state at construction time: wrong shape, non-binary
    /// entries, state length mismatch, duplicate or out-of-range node
    /// indices, non-square CM.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid mechanism: {0}")]
    InvalidMechanism(String),

    #[error("invalid purview: {0}")]
    InvalidPurview(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("numerical instability: {0}")]
    NumericalInstability(String),

    #[error("earth mover's distance error: {0}")]
    EMDError(String),

    /// A requested distance function or algorithm variant is unavailable.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl IITError {
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        IITError::DimensionMismatch { expected, actual }
    }
}

/// Clamp floating-point noise: distances that drift slightly below zero due
/// to numerical error are reported as exactly zero.
pub fn clamp_phi(phi: f64) -> f64 {
    if phi < 0.0 && phi > -1e-9 {
        0.0
    } else {
        phi
    }
}
