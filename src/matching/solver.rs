//! Request/response contract of the remote pose solver.
//!
//! The solver owns the actual search (branch and bound or otherwise). This
//! crate only prepares requests and interprets responses, so any transport
//! can sit behind [`PoseSolver`].

use glam::IVec2;
use thiserror::Error;

use crate::types::OccupancyGridMsg;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SolverError {
    #[error("service unreachable: {0}")]
    Unavailable(String),
    #[error("solver failed: {0}")]
    Failed(String),
}

/// One `MatchToReference` call.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRequest {
    /// Source grid, already at the reference map's resolution.
    pub source: OccupancyGridMsg,
    pub acceptance_ratio: f32,
    /// 1 disables rotation downsampling.
    pub rotation_downsample: u32,
    /// 0 disables hit sampling.
    pub hit_sample_cap: u32,
    pub use_theta_prior: bool,
    pub use_window: bool,
    /// Window offset in reference cells. Positive values shift the window
    /// toward decreasing indices.
    pub i_offset: i32,
    pub j_offset: i32,
    pub i_window: u32,
    pub j_window: u32,
    pub theta_prior: f32,
    pub theta_window: f32,
}

/// Solver response.
///
/// Rotating the source's cells by `theta` about the source grid's center and
/// then adding `origin` places them in the reference grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub found: bool,
    pub theta: f32,
    pub score: f32,
    pub max_score: f32,
    pub origin: IVec2,
    /// Angular uncertainty of `theta`.
    pub dtheta: f32,
}

impl MatchResult {
    pub fn not_found() -> Self {
        Self {
            found: false,
            theta: 0.0,
            score: 0.0,
            max_score: 0.0,
            origin: IVec2::ZERO,
            dtheta: 0.0,
        }
    }
}

pub trait PoseSolver {
    /// `SetReferenceMap`: the grid every later request is matched against.
    fn set_reference_map(&mut self, grid: &OccupancyGridMsg) -> Result<(), SolverError>;

    /// `MatchToReference`. Blocks until the solver answers.
    fn match_to_reference(&mut self, request: &MatchRequest) -> Result<MatchResult, SolverError>;
}

impl<S: PoseSolver + ?Sized> PoseSolver for Box<S> {
    fn set_reference_map(&mut self, grid: &OccupancyGridMsg) -> Result<(), SolverError> {
        (**self).set_reference_map(grid)
    }

    fn match_to_reference(&mut self, request: &MatchRequest) -> Result<MatchResult, SolverError> {
        (**self).match_to_reference(request)
    }
}
