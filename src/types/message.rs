//! Occupancy grid message exchanged with the pose solver and debug outputs.

use crate::types::MapInfo;

/// Flattened occupancy grid as it travels on the wire.
///
/// `data` is row-major over the declared width: the cell at `(x, y)` lives at
/// `data[y * width + x]`. Values are percentages in `0..=100`, or
/// [`UNKNOWN`](crate::types::UNKNOWN).
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGridMsg {
    pub frame_id: String,
    pub info: MapInfo,
    /// Yaw of the grid origin. Only zero is supported by the matcher.
    pub origin_yaw: f32,
    pub data: Vec<i8>,
}

impl OccupancyGridMsg {
    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }
}
