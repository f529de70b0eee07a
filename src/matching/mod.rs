pub mod error;
pub mod orchestrator;
pub mod solver;

pub use error::MatchError;
pub use orchestrator::{MatchOrchestrator, MatchPhase, MatchStage, normalize_resolution};
pub use solver::{MatchRequest, MatchResult, PoseSolver, SolverError};
