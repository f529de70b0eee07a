use thiserror::Error;

/// Errors raised by grid construction and pyramid derivation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("cannot coarsen a {width}x{height} grid: both dimensions must be even")]
    OddShape { width: u32, height: u32 },
    #[error("data length {actual} does not match map size {expected}")]
    DataLength { expected: usize, actual: usize },
    #[error("cell ({x}, {y}) out of bounds for map {width}x{height}")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },
    #[error("resolution must be positive and finite, got {0}")]
    InvalidResolution(f32),
}

/// Errors raised while loading a reference map from disk.
#[derive(Debug, Error)]
pub enum MapLoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
    #[error("reference map origin yaw must be zero, got {0}")]
    UnsupportedOrientation(f32),
    #[error(transparent)]
    Grid(#[from] GridError),
}
