use std::path::{Path, PathBuf};

use glam::Vec2;
use image::GenericImageView;
use log::info;
use serde::Deserialize;

use crate::grid::GridMap;
use crate::types::{DEFAULT_FREE_THRESH, DEFAULT_OCCUPIED_THRESH, MapInfo, MapLoadError};

#[derive(Debug, Deserialize)]
struct RosMapMetadata {
    image: String,
    resolution: f32,
    origin: [f32; 3],
    #[serde(
        default = "default_occupied_thresh",
        deserialize_with = "deserialize_threshold"
    )]
    occupied_thresh: f32,
    #[serde(
        default = "default_free_thresh",
        deserialize_with = "deserialize_threshold"
    )]
    free_thresh: f32,
    #[serde(default = "default_negate")]
    negate: Negate,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Negate {
    Bool(bool),
    Int(i32),
}

impl Negate {
    fn is_negated(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Int(value) => *value != 0,
        }
    }
}

fn default_negate() -> Negate {
    Negate::Bool(false)
}

fn default_occupied_thresh() -> f32 {
    DEFAULT_OCCUPIED_THRESH
}

fn default_free_thresh() -> f32 {
    DEFAULT_FREE_THRESH
}

fn deserialize_threshold<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = f32::deserialize(deserializer)?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(serde::de::Error::custom(
            "thresholds must be in the range [0.0, 1.0]",
        ))
    }
}

/// Load the reference map `<folder>/<base_name>.yaml` and the image it names.
pub fn load_reference_map(
    folder: impl AsRef<Path>,
    base_name: &str,
) -> Result<GridMap, MapLoadError> {
    let yaml_path = folder.as_ref().join(format!("{base_name}.yaml"));
    load_grid_map(yaml_path)
}

/// Load a map_server style YAML + image pair as occupancy probabilities.
///
/// Dark pixels are occupied: each cell holds `1 - lightness`, or `lightness`
/// when the map is negated. The image's bottom row becomes `j = 0`.
pub fn load_grid_map(yaml_path: impl AsRef<Path>) -> Result<GridMap, MapLoadError> {
    let yaml_path = yaml_path.as_ref();
    let yaml_str = std::fs::read_to_string(yaml_path)?;
    let metadata: RosMapMetadata = serde_yaml::from_str(&yaml_str)?;

    if metadata.occupied_thresh <= metadata.free_thresh {
        return Err(MapLoadError::InvalidMetadata(
            "occupied_thresh must be greater than free_thresh".to_string(),
        ));
    }
    if metadata.origin[2] != 0.0 {
        return Err(MapLoadError::UnsupportedOrientation(metadata.origin[2]));
    }

    let negate = metadata.negate.is_negated();
    let image_path = resolve_image_path(yaml_path, &metadata.image);
    let image = image::open(&image_path)?;
    let (width, height) = image.dimensions();
    let rgba = image.to_rgba8();

    let mut data = vec![0.0; (width as usize) * (height as usize)];
    for y in 0..height {
        for x in 0..width {
            let [r, g, b, _] = rgba.get_pixel(x, y).0;
            let lightness = (r as f32 + g as f32 + b as f32) / (3.0 * 255.0);
            let occupancy = if negate { lightness } else { 1.0 - lightness };

            let j = height - y - 1;
            let idx = (x as usize) * (height as usize) + (j as usize);
            data[idx] = occupancy;
        }
    }

    let info = MapInfo {
        width,
        height,
        resolution: metadata.resolution,
        origin: Vec2::new(metadata.origin[0], metadata.origin[1]),
    };
    info!(
        "loaded reference map {} ({}x{} cells at {} m)",
        image_path.display(),
        width,
        height,
        metadata.resolution
    );

    Ok(GridMap::new(info, data)?.with_thresholds(metadata.occupied_thresh, metadata.free_thresh))
}

fn resolve_image_path(yaml_path: &Path, image_ref: &str) -> PathBuf {
    let image_path = PathBuf::from(image_ref);
    if image_path.is_absolute() {
        return image_path;
    }

    match yaml_path.parent() {
        Some(parent) => parent.join(image_path),
        None => image_path,
    }
}
