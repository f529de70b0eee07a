use thiserror::Error;

use super::SolverError;
use crate::config::ConfigError;
use crate::types::GridError;

/// Reasons a match cycle is abandoned. None of them are fatal: the held
/// transform is left untouched and the next live map starts a fresh cycle.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("live map resolution {live} cannot be aligned with reference resolution {target}")]
    ShapeMismatch { live: f32, target: f32 },
    #[error("pose solver unavailable: {0}")]
    ServiceUnavailable(#[source] SolverError),
    #[error("pose solver found no acceptable match")]
    NoSolution,
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),
    /// The solver answered, but its result cannot be applied to the grids.
    #[error("unusable solver result: {0}")]
    InvalidSolution(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Grid(#[from] GridError),
}
