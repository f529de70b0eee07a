pub mod config;
pub mod grid;
pub mod loaders;
pub mod matching;
pub mod node;
pub mod publish;
pub mod state;
pub mod types;
pub mod visualization;

pub use config::LocalizerConfig;
pub use grid::GridMap;
pub use loaders::ros2::load_reference_map;
pub use matching::{MatchOrchestrator, PoseSolver};
pub use state::{SharedMatchState, StampedTransform};
pub use types::{MapInfo, OccupancyGridMsg, Pose2D};
