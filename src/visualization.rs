use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};
use log::{debug, warn};

use crate::grid::GridMap;
use crate::matching::MatchStage;
use crate::publish::OverlaySink;
use crate::types::OccupancyGridMsg;

/// Convert a grid to a grayscale image preview.
///
/// Occupancy 0 becomes near-white and 1 becomes black. The grid's `j = 0`
/// row (lowest in world y) is written to the **bottom** of the image.
pub fn grid_map_to_image(grid: &GridMap) -> GrayImage {
    let width = grid.width();
    let height = grid.height();
    let mut img = GrayImage::new(width, height);

    for y_img in 0..height {
        // Flip vertically to match the map loader's convention.
        let j = height - 1 - y_img;
        for i in 0..width {
            let value = grid.get(glam::UVec2::new(i, j)).unwrap_or(0.0);
            img.put_pixel(i, y_img, Luma([occupancy_to_gray(value)]));
        }
    }

    img
}

fn occupancy_to_gray(value: f32) -> u8 {
    // 0 (free) -> 254, 1 (occupied) -> 0
    (254.0 * (1.0 - value.clamp(0.0, 1.0))).round() as u8
}

/// Writes each overlay it receives to `<dir>/<stage>_overlay.png`,
/// overwriting the previous one.
#[derive(Debug, Clone)]
pub struct ImageOverlayWriter {
    dir: PathBuf,
}

impl ImageOverlayWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, stage: MatchStage) -> PathBuf {
        self.dir.join(format!("{stage}_overlay.png"))
    }
}

impl OverlaySink for ImageOverlayWriter {
    fn publish_overlay(&self, stage: MatchStage, overlay: &OccupancyGridMsg) {
        let grid = match GridMap::from_message(overlay) {
            Ok(grid) => grid,
            Err(err) => {
                warn!("dropping {stage} overlay: {err}");
                return;
            }
        };
        let path = self.path_for(stage);
        match grid_map_to_image(&grid).save(&path) {
            Ok(()) => debug!("wrote {}", path.display()),
            Err(err) => warn!("failed to write {}: {err}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::UVec2;
    use image::GenericImageView;

    use super::*;
    use crate::types::MapInfo;

    #[test]
    fn grid_map_to_image_maps_values_and_flips_y() {
        let info = MapInfo {
            width: 2,
            height: 2,
            resolution: 1.0,
            ..Default::default()
        };
        // (i, j) storage: (0,0)=0.0 (0,1)=1.0 (1,0)=0.0 (1,1)=0.5
        let grid = GridMap::new(info, vec![0.0, 1.0, 0.0, 0.5]).unwrap();
        assert_eq!(grid.get(UVec2::new(0, 1)), Some(1.0));

        let img = grid_map_to_image(&grid);
        assert_eq!(img.dimensions(), (2, 2));

        // Because we flip Y: image row 0 corresponds to j = 1.
        assert_eq!(img.get_pixel(0, 0).0[0], 0);
        assert_eq!(img.get_pixel(0, 1).0[0], 254);
        assert_eq!(img.get_pixel(1, 0).0[0], 127);
    }

    #[test]
    fn overlay_writer_saves_one_png_per_stage() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ImageOverlayWriter::new(dir.path());
        let grid = GridMap::filled(MapInfo::square(4, 0.1), 0.0).unwrap();

        writer.publish_overlay(MatchStage::Coarse, &grid.to_message("map"));

        let path = writer.path_for(MatchStage::Coarse);
        assert!(path.ends_with("coarse_overlay.png"));
        let img = image::open(&path).unwrap();
        assert_eq!(img.dimensions(), (4, 4));
        assert!(!writer.path_for(MatchStage::Fine).exists());
    }
}
