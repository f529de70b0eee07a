use glam::UVec2;

use crate::types::{
    DEFAULT_FREE_THRESH, DEFAULT_OCCUPIED_THRESH, GridError, MapInfo, OccupancyGridMsg, UNKNOWN,
};

/// Occupancy probabilities in `[0, 1]` over a regular grid.
///
/// The first axis (`i`, length `width`) follows world x and the second axis
/// (`j`, length `height`) follows world y. Cells are stored with `j` varying
/// fastest, so `(i, j)` lives at `data[i * height + j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMap {
    info: MapInfo,
    data: Vec<f32>,
    occupied_thresh: f32,
    free_thresh: f32,
}

impl GridMap {
    pub fn new(info: MapInfo, data: Vec<f32>) -> Result<Self, GridError> {
        if !(info.resolution.is_finite() && info.resolution > 0.0) {
            return Err(GridError::InvalidResolution(info.resolution));
        }
        let expected = info.cell_count();
        if data.len() != expected {
            return Err(GridError::DataLength {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            info,
            data,
            occupied_thresh: DEFAULT_OCCUPIED_THRESH,
            free_thresh: DEFAULT_FREE_THRESH,
        })
    }

    /// Assemble a grid from parts whose shape is already known to agree.
    pub(super) fn from_parts(
        info: MapInfo,
        data: Vec<f32>,
        occupied_thresh: f32,
        free_thresh: f32,
    ) -> Self {
        debug_assert_eq!(data.len(), info.cell_count());
        Self {
            info,
            data,
            occupied_thresh,
            free_thresh,
        }
    }

    /// A grid with every cell set to `value`.
    pub fn filled(info: MapInfo, value: f32) -> Result<Self, GridError> {
        let data = vec![value; info.cell_count()];
        Self::new(info, data)
    }

    pub fn with_thresholds(mut self, occupied_thresh: f32, free_thresh: f32) -> Self {
        self.occupied_thresh = occupied_thresh;
        self.free_thresh = free_thresh;
        self
    }

    /// Decode a wire message.
    ///
    /// Percentages are rescaled to `[0, 1]`; unknown cells decode as free.
    pub fn from_message(msg: &OccupancyGridMsg) -> Result<Self, GridError> {
        let info = msg.info.clone();
        let (width, height) = (info.width as usize, info.height as usize);
        if msg.data.len() != width * height {
            return Err(GridError::DataLength {
                expected: width * height,
                actual: msg.data.len(),
            });
        }

        let mut data = vec![0.0; width * height];
        for y in 0..height {
            for x in 0..width {
                let value = msg.data[y * width + x];
                data[x * height + y] = if value == UNKNOWN {
                    0.0
                } else {
                    f32::from(value.clamp(0, 100)) / 100.0
                };
            }
        }

        Self::new(info, data)
    }

    /// Encode into a wire message, the exact inverse layout of [`GridMap::from_message`].
    pub fn to_message(&self, frame_id: &str) -> OccupancyGridMsg {
        let (width, height) = (self.info.width as usize, self.info.height as usize);
        let mut data = vec![0i8; width * height];
        for x in 0..width {
            for y in 0..height {
                let p = self.data[x * height + y].clamp(0.0, 1.0);
                data[y * width + x] = (p * 100.0).round() as i8;
            }
        }

        OccupancyGridMsg {
            frame_id: frame_id.to_string(),
            info: self.info.clone(),
            origin_yaw: 0.0,
            data,
        }
    }

    pub fn info(&self) -> &MapInfo {
        &self.info
    }

    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }

    pub fn resolution(&self) -> f32 {
        self.info.resolution
    }

    pub fn occupied_thresh(&self) -> f32 {
        self.occupied_thresh
    }

    pub fn free_thresh(&self) -> f32 {
        self.free_thresh
    }

    /// A distance, in cells, that no path inside the grid can exceed.
    pub fn very_large_distance(&self) -> f32 {
        self.info.cell_count() as f32
    }

    pub fn get(&self, cell: UVec2) -> Option<f32> {
        if cell.x >= self.info.width || cell.y >= self.info.height {
            return None;
        }
        Some(self.data[self.index(cell)])
    }

    pub fn set(&mut self, cell: UVec2, value: f32) -> Result<(), GridError> {
        if cell.x >= self.info.width || cell.y >= self.info.height {
            return Err(GridError::OutOfBounds {
                x: cell.x,
                y: cell.y,
                width: self.info.width,
                height: self.info.height,
            });
        }
        self.set_in_bounds(cell, value);
        Ok(())
    }

    /// Write a cell the caller has already bounds-checked.
    pub(super) fn set_in_bounds(&mut self, cell: UVec2, value: f32) {
        debug_assert!(cell.x < self.info.width && cell.y < self.info.height);
        let idx = self.index(cell);
        self.data[idx] = value;
    }

    fn index(&self, cell: UVec2) -> usize {
        (cell.x as usize) * (self.info.height as usize) + (cell.y as usize)
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}
