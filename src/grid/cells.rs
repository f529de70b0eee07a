//! World/cell conversions and batch operations on cell coordinates.

use glam::{IVec2, UVec2, Vec2};

use super::GridMap;
use crate::types::rotate;

impl GridMap {
    /// Convert a world point to cell indices.
    ///
    /// Indices are truncated toward zero, not floored, so points just below
    /// the origin map to index 0 instead of -1. With `clip` the result is
    /// clamped into `[0, dim)`; otherwise it is returned as-is, possibly
    /// negative or past the end.
    pub fn world_to_cell(&self, point: Vec2, clip: bool) -> IVec2 {
        let info = self.info();
        let cell = ((point - info.origin) / info.resolution).as_ivec2();
        if !clip {
            return cell;
        }
        let max_i = info.width as i32 - 1;
        let max_j = info.height as i32 - 1;
        IVec2::new(cell.x.min(max_i).max(0), cell.y.min(max_j).max(0))
    }

    /// World coordinates of the corner of cell `(i, j)` closest to the origin.
    pub fn cell_to_world(&self, cell: IVec2) -> Vec2 {
        let info = self.info();
        info.origin + cell.as_vec2() * info.resolution
    }

    /// All cells whose occupancy is strictly above `threshold`, in `(i, j)`
    /// lexicographic order.
    pub fn occupied_cells(&self, threshold: f32) -> Vec<IVec2> {
        let height = self.height() as usize;
        self.data()
            .iter()
            .enumerate()
            .filter(|(_, p)| **p > threshold)
            .map(|(idx, _)| IVec2::new((idx / height) as i32, (idx % height) as i32))
            .collect()
    }

    /// Rotate cell coordinates by `theta` about this grid's geometric center.
    ///
    /// The center is `(width / 2, height / 2)` in fractional cells; results are
    /// truncated toward zero.
    pub fn rotate_around_center(&self, cells: &[IVec2], theta: f32) -> Vec<IVec2> {
        let center = self.info().center();
        cells
            .iter()
            .map(|cell| (rotate(cell.as_vec2() - center, theta) + center).as_ivec2())
            .collect()
    }

    /// Copy of this grid with `cells` set to `value`. Cells outside the grid
    /// are skipped.
    pub fn marked(&self, cells: &[IVec2], value: f32) -> GridMap {
        let mut out = self.clone();
        for cell in cells.iter().filter(|cell| self.info().contains(**cell)) {
            out.set_in_bounds(cell.as_uvec2(), value);
        }
        out
    }
}

/// Keep only the cells inside `[0, shape.x) x [0, shape.y)`, preserving order.
pub fn filter_out_of_bounds(cells: &[IVec2], shape: UVec2) -> Vec<IVec2> {
    cells
        .iter()
        .copied()
        .filter(|c| c.x >= 0 && c.y >= 0 && (c.x as u32) < shape.x && (c.y as u32) < shape.y)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use super::*;
    use crate::types::MapInfo;

    fn grid(width: u32, height: u32, resolution: f32, origin: Vec2) -> GridMap {
        let info = MapInfo {
            width,
            height,
            resolution,
            origin,
        };
        GridMap::filled(info, 0.0).unwrap()
    }

    #[test]
    fn world_to_cell_truncates_toward_zero() {
        let g = grid(10, 10, 0.5, Vec2::ZERO);
        assert_eq!(g.world_to_cell(Vec2::new(1.2, 2.9), false), IVec2::new(2, 5));
        // -0.25 / 0.5 = -0.5 truncates to 0, not -1.
        assert_eq!(g.world_to_cell(Vec2::new(-0.25, 0.0), false), IVec2::new(0, 0));
        assert_eq!(g.world_to_cell(Vec2::new(-0.75, 0.0), false), IVec2::new(-1, 0));
    }

    #[test]
    fn world_to_cell_without_clip_keeps_out_of_range_indices() {
        let g = grid(4, 4, 1.0, Vec2::new(-2.0, -2.0));
        assert_eq!(g.world_to_cell(Vec2::new(10.0, -9.5), false), IVec2::new(12, -7));
    }

    #[test]
    fn world_to_cell_with_clip_stays_in_bounds() {
        let g = grid(4, 3, 1.0, Vec2::ZERO);
        assert_eq!(g.world_to_cell(Vec2::new(10.0, 10.0), true), IVec2::new(3, 2));
        assert_eq!(g.world_to_cell(Vec2::new(-10.0, 1.5), true), IVec2::new(0, 1));
    }

    #[test]
    fn cell_to_world_inverts_world_to_cell_within_a_cell() {
        let g = grid(20, 20, 0.05, Vec2::new(-0.5, 0.25));
        let p = Vec2::new(0.123, 0.777);
        let back = g.cell_to_world(g.world_to_cell(p, false));
        assert!((back - p).abs().max_element() < g.resolution());
    }

    #[test]
    fn occupied_cells_use_strict_threshold() {
        let mut g = grid(3, 2, 1.0, Vec2::ZERO);
        g.set(UVec2::new(2, 1), 0.9).unwrap();
        g.set(UVec2::new(0, 1), 0.5).unwrap();
        g.set(UVec2::new(1, 0), 0.65).unwrap();
        assert_eq!(
            g.occupied_cells(0.5),
            vec![IVec2::new(1, 0), IVec2::new(2, 1)]
        );
    }

    #[test]
    fn rotate_around_center_half_turn() {
        let g = grid(10, 10, 1.0, Vec2::ZERO);
        // (7, 5) is 2 cells right of center (5, 5); half a turn puts it 2 cells left.
        let out = g.rotate_around_center(&[IVec2::new(7, 5)], PI);
        let cell = out[0];
        assert!((cell.x - 3).abs() <= 1, "got {cell}");
        assert!((cell.y - 5).abs() <= 1, "got {cell}");
    }

    #[test]
    fn rotate_around_center_zero_is_identity() {
        let g = grid(8, 6, 1.0, Vec2::ZERO);
        let cells = vec![IVec2::new(0, 0), IVec2::new(7, 5), IVec2::new(3, 2)];
        assert_eq!(g.rotate_around_center(&cells, 0.0), cells);
    }

    #[test]
    fn rotate_around_center_quarter_turn_is_counter_clockwise() {
        let g = grid(10, 10, 1.0, Vec2::ZERO);
        let out = g.rotate_around_center(&[IVec2::new(8, 5)], FRAC_PI_2);
        // (3, 0) from center becomes (0, 3).
        assert!((out[0].x - 5).abs() <= 1);
        assert!((out[0].y - 8).abs() <= 1);
    }

    #[test]
    fn filter_out_of_bounds_preserves_order() {
        let cells = vec![
            IVec2::new(3, 1),
            IVec2::new(-1, 0),
            IVec2::new(0, 0),
            IVec2::new(4, 0),
            IVec2::new(2, 2),
            IVec2::new(1, 1),
        ];
        assert_eq!(
            filter_out_of_bounds(&cells, UVec2::new(4, 2)),
            vec![IVec2::new(3, 1), IVec2::new(0, 0), IVec2::new(1, 1)]
        );
    }

    #[test]
    fn marked_skips_cells_outside_the_grid() {
        let g = grid(2, 2, 1.0, Vec2::ZERO);
        let out = g.marked(&[IVec2::new(1, 0), IVec2::new(5, 5)], 1.0);
        assert_eq!(out.get(UVec2::new(1, 0)), Some(1.0));
        assert_eq!(out.occupied_cells(0.5).len(), 1);
        assert_eq!(g.occupied_cells(0.5).len(), 0);
    }

    #[test]
    fn marked_writes_every_in_bounds_cell_and_nothing_else() {
        let g = grid(3, 2, 1.0, Vec2::ZERO);
        let cells = [
            IVec2::new(-1, 0),
            IVec2::new(2, 1),
            IVec2::new(0, 0),
            IVec2::new(3, 0),
            IVec2::new(0, 2),
            IVec2::new(2, 1),
        ];
        let out = g.marked(&cells, 0.8);
        assert_eq!(out.occupied_cells(0.5), vec![IVec2::new(0, 0), IVec2::new(2, 1)]);
        assert_eq!(out.get(UVec2::new(1, 1)), Some(0.0));
        assert_eq!(out.info(), g.info());
    }
}
