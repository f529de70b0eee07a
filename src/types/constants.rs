/// Message value for a cell of unknown occupancy.
pub const UNKNOWN: i8 = -1;
pub const FREE: i8 = 0;
pub const OCCUPIED: i8 = 100;

pub const DEFAULT_OCCUPIED_THRESH: f32 = 0.65;
pub const DEFAULT_FREE_THRESH: f32 = 0.196;

/// Probability written into a debug overlay for every reprojected source cell.
pub const OVERLAY_MARK: f32 = 1.0;
