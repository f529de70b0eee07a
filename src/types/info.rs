//! Map metadata.

use glam::Vec2;

/// Shape and placement of a grid.
///
/// `width` counts cells along the first grid axis (world x) and `height`
/// along the second (world y).
#[derive(Debug, Clone, PartialEq)]
pub struct MapInfo {
    pub width: u32,
    pub height: u32,
    pub resolution: f32,
    /// Origin of cell (0, 0) in world coordinates (meters).
    pub origin: Vec2,
}

impl Default for MapInfo {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            resolution: 0.05,
            origin: Vec2::ZERO,
        }
    }
}

impl MapInfo {
    pub fn square(width: u32, resolution: f32) -> Self {
        Self {
            width,
            height: width,
            resolution,
            ..Default::default()
        }
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Geometric center of the cell grid, in (fractional) cell units.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// Whether `cell` lies inside `[0, width) x [0, height)`.
    #[inline]
    pub fn contains(&self, cell: glam::IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as u32) < self.width && (cell.y as u32) < self.height
    }
}

#[cfg(test)]
mod tests {
    use glam::IVec2;

    use super::*;

    #[test]
    fn contains_rejects_negative_and_overflowing_cells() {
        let info = MapInfo {
            width: 4,
            height: 2,
            ..Default::default()
        };
        assert!(info.contains(IVec2::new(0, 0)));
        assert!(info.contains(IVec2::new(3, 1)));
        assert!(!info.contains(IVec2::new(4, 0)));
        assert!(!info.contains(IVec2::new(0, 2)));
        assert!(!info.contains(IVec2::new(-1, 0)));
    }

    #[test]
    fn center_is_half_the_shape() {
        let info = MapInfo {
            width: 5,
            height: 4,
            ..Default::default()
        };
        assert_eq!(info.center(), Vec2::new(2.5, 2.0));
        assert_eq!(info.cell_count(), 20);
    }
}
