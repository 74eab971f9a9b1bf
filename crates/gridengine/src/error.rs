//! Error type for the gridding engine.
//!
//! The core performs no I/O; `IoFailure` only exists so embedders (the
//! `cli` crate) can plumb `std::io::Error` through the same type via `?`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("no data points fall inside the grid region")]
    EmptyInput,

    #[error("degenerate grid: {0}")]
    Degenerate(String),

    #[error("envelope grid shape mismatch: expected {expected:?}, got {got:?}")]
    EnvelopeShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("io failure: {0}")]
    IoFailure(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GridError>;
