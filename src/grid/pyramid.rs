//! Resolution pyramids built by 2x2 max-pooling.
//!
//! Each level halves the shape and doubles the resolution of its source while
//! keeping the origin. Taking the maximum of the four children keeps every
//! obstacle visible at the coarser level.

use super::GridMap;
use crate::types::{GridError, MapInfo};

impl GridMap {
    /// Derive the next pyramid level.
    ///
    /// Fails with [`GridError::OddShape`] if either dimension is odd; use
    /// [`GridMap::trim_to_even`] first.
    pub fn coarsen(&self) -> Result<GridMap, GridError> {
        let (width, height) = (self.width(), self.height());
        if width % 2 != 0 || height % 2 != 0 {
            return Err(GridError::OddShape { width, height });
        }

        let src_h = height as usize;
        let (dst_w, dst_h) = ((width / 2) as usize, (height / 2) as usize);
        let src = self.data();
        let mut data = Vec::with_capacity(dst_w * dst_h);
        for i in 0..dst_w {
            let row0 = 2 * i * src_h;
            let row1 = row0 + src_h;
            for j in 0..dst_h {
                let c = 2 * j;
                let value = src[row0 + c]
                    .max(src[row0 + c + 1])
                    .max(src[row1 + c])
                    .max(src[row1 + c + 1]);
                data.push(value);
            }
        }

        let info = MapInfo {
            width: dst_w as u32,
            height: dst_h as u32,
            resolution: self.resolution() * 2.0,
            origin: self.info().origin,
        };
        Ok(GridMap::from_parts(
            info,
            data,
            self.occupied_thresh(),
            self.free_thresh(),
        ))
    }

    /// Drop the last row and/or column so both dimensions are even.
    pub fn trim_to_even(&self) -> GridMap {
        let width = self.width() - self.width() % 2;
        let height = self.height() - self.height() % 2;
        if width == self.width() && height == self.height() {
            return self.clone();
        }

        let src_h = self.height() as usize;
        let mut data = Vec::with_capacity((width as usize) * (height as usize));
        for i in 0..width as usize {
            let start = i * src_h;
            data.extend_from_slice(&self.data()[start..start + height as usize]);
        }

        let info = MapInfo {
            width,
            height,
            ..self.info().clone()
        };
        GridMap::from_parts(info, data, self.occupied_thresh(), self.free_thresh())
    }

    /// Trim to even dimensions, then coarsen.
    pub fn coarsen_trimmed(&self) -> Result<GridMap, GridError> {
        self.trim_to_even().coarsen()
    }

    /// This grid followed by `levels` successively coarser levels.
    pub fn pyramid(&self, levels: usize) -> Result<Vec<GridMap>, GridError> {
        let mut out = Vec::with_capacity(levels + 1);
        out.push(self.clone());
        for _ in 0..levels {
            let next = out[out.len() - 1].coarsen_trimmed()?;
            out.push(next);
        }
        Ok(out)
    }
}
