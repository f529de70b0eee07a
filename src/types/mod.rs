pub mod constants;
pub mod error;
pub mod geometry;
pub mod info;
pub mod message;

pub use constants::*;
pub use error::{GridError, MapLoadError};
pub use geometry::{Pose2D, rotate};
pub use info::MapInfo;
pub use message::OccupancyGridMsg;
