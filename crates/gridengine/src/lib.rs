//! Continuous-curvature gridding engine: a multigrid Gauss-Seidel/SOR
//! solver that reconstructs a smooth scalar surface `z(x, y)` from
//! scattered observations on a regular rectangular grid.
//!
//! The entry point is [`engine::Engine`]; construct it from an
//! [`config::EngineConfig`] and call [`engine::Engine::run`] with the
//! scattered data and any breaklines.

pub mod binning;
pub mod boundary;
pub mod breakline;
pub mod briggs;
pub mod classify;
pub mod config;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod expand;
pub mod finalize;
pub mod geometry;
pub mod relax;
pub mod schedule;
pub mod seed;
pub mod stencil;
pub mod trend;
pub mod types;

pub mod prelude {
    pub use crate::breakline::BreaklineVertex;
    pub use crate::config::{ConvergenceLimit, EngineConfig, EnvelopeSpec};
    pub use crate::engine::{Breakline, Engine, OutputGrid, Report};
    pub use crate::error::{GridError, Result};
    pub use crate::types::{DataPoint, PointKind};
}
