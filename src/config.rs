//! Localizer configuration, read from YAML.
//!
//! Every field has a default so a partial file (or an empty one) is valid.

use std::f32::consts::FRAC_PI_2;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Deepest pyramid level whose resolution ratio (`2^level`) fits an `i32`
/// cell offset.
pub const MAX_COARSE_LEVEL: usize = 30;

/// Largest fine search radius, in cells.
pub const MAX_WINDOW_RADIUS: u32 = 1 << 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LocalizerConfig {
    /// Frame of the static reference map.
    pub reference_frame: String,
    /// Frame used for live maps that arrive without a frame id.
    pub live_frame: String,
    /// Number of pyramid halvings between the reference map and the coarse stage.
    pub coarse_level: usize,
    /// Relative tolerance when matching a live map's resolution to a reference level.
    pub resolution_tolerance: f32,
    pub coarse: CoarseStageConfig,
    pub fine: FineStageConfig,
    /// Period of the transform re-broadcast.
    pub broadcast_interval_ms: u64,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self {
            reference_frame: "map".to_string(),
            live_frame: "local_map".to_string(),
            coarse_level: 2,
            resolution_tolerance: 0.01,
            coarse: CoarseStageConfig::default(),
            fine: FineStageConfig::default(),
            broadcast_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CoarseStageConfig {
    /// Minimum fraction of the maximum score the solver must reach.
    pub acceptance_ratio: f32,
    /// Angular downsampling factor for the solver's rotation search.
    pub rotation_downsample: u32,
    /// Upper bound on occupied source cells the solver scores.
    pub hit_sample_cap: u32,
    /// Width (radians) of the θ window around a previously accepted θ.
    pub prior_theta_window: f32,
}

impl Default for CoarseStageConfig {
    fn default() -> Self {
        Self {
            acceptance_ratio: 0.5,
            rotation_downsample: 2,
            hit_sample_cap: 2000,
            prior_theta_window: FRAC_PI_2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FineStageConfig {
    pub acceptance_ratio: f32,
    /// Half-size, in full resolution cells, of the search box around the coarse solution.
    pub window_radius: u32,
}

impl Default for FineStageConfig {
    fn default() -> Self {
        Self {
            acceptance_ratio: 0.3,
            window_radius: 10,
        }
    }
}

impl LocalizerConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio_ok = |r: f32| r > 0.0 && r <= 1.0;
        if !ratio_ok(self.coarse.acceptance_ratio) || !ratio_ok(self.fine.acceptance_ratio) {
            return Err(ConfigError::Invalid(
                "acceptance ratios must be in (0, 1]".to_string(),
            ));
        }
        if !(self.resolution_tolerance > 0.0 && self.resolution_tolerance < 1.0) {
            return Err(ConfigError::Invalid(
                "resolution_tolerance must be in (0, 1)".to_string(),
            ));
        }
        if self.broadcast_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "broadcast_interval_ms must be positive".to_string(),
            ));
        }
        if self.coarse_level > MAX_COARSE_LEVEL {
            return Err(ConfigError::Invalid(format!(
                "coarse_level must be at most {MAX_COARSE_LEVEL}, got {}",
                self.coarse_level
            )));
        }
        if self.fine.window_radius > MAX_WINDOW_RADIUS {
            return Err(ConfigError::Invalid(format!(
                "fine.window_radius must be at most {MAX_WINDOW_RADIUS}, got {}",
                self.fine.window_radius
            )));
        }
        if self.coarse.rotation_downsample == 0 {
            return Err(ConfigError::Invalid(
                "rotation_downsample must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms)
    }
}
