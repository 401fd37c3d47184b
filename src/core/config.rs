//! Voxelization configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Upper bound on angular bins. Keeps a tiny `delta_theta_deg` from
/// allocating an unbounded offset table.
pub const MAX_BIN_COUNT: usize = 1 << 20;

/// Parameters for turning a point cloud into a cylindrical voxel grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CylVoxConfig {
    /// Radial cell size, in point units. Must be > 0.
    pub scale_r: f64,
    /// Vertical cell size, in point units. Must be > 0.
    pub scale_z: f64,
    /// Angular width of one slice in degrees. Must be > 0.
    pub delta_theta_deg: f64,
    /// Batches with at least this many points are quantized on the rayon pool.
    pub parallel_threshold: usize,
}

impl Default for CylVoxConfig {
    fn default() -> Self {
        Self {
            scale_r: 0.01,   // 1cm rings
            scale_z: 0.01,   // 1cm rows
            delta_theta_deg: 1.0,
            parallel_threshold: 65_536,
        }
    }
}

impl CylVoxConfig {
    /// Create a config with the given scales and default parallelism.
    pub fn new(scale_r: f64, scale_z: f64, delta_theta_deg: f64) -> Self {
        Self {
            scale_r,
            scale_z,
            delta_theta_deg,
            ..Default::default()
        }
    }

    /// Check every field and return the bin count `N = round(360 / Δθ)`.
    pub fn validate(&self) -> Result<usize> {
        if !(self.scale_r.is_finite() && self.scale_r > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "scale_r must be a positive finite number, got {}",
                self.scale_r
            )));
        }
        if !(self.scale_z.is_finite() && self.scale_z > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "scale_z must be a positive finite number, got {}",
                self.scale_z
            )));
        }
        if !(self.delta_theta_deg.is_finite() && self.delta_theta_deg > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "delta_theta_deg must be a positive finite number, got {}",
                self.delta_theta_deg
            )));
        }

        let bins = (360.0 / self.delta_theta_deg).round();
        if bins < 1.0 {
            return Err(Error::InvalidConfiguration(format!(
                "delta_theta_deg {} yields zero angular bins",
                self.delta_theta_deg
            )));
        }
        if bins > MAX_BIN_COUNT as f64 {
            return Err(Error::InvalidConfiguration(format!(
                "delta_theta_deg {} yields {} bins (max {})",
                self.delta_theta_deg, bins, MAX_BIN_COUNT
            )));
        }

        Ok(bins as usize)
    }

    /// Number of angular bins, if the config is valid.
    pub fn bin_count(&self) -> Result<usize> {
        self.validate()
    }

    /// Save to file (sync)
    pub fn save_sync(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from file (sync). The loaded config is validated.
    pub fn load_sync(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }
}
