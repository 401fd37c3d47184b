//! Quantization of cylindrical coordinates into voxel cells

use crate::core::{CylVoxConfig, Result};
use crate::math::angle::bin_for_angle;
use crate::math::cylindrical::CylindricalCoord;
use crate::voxel::key::VoxelKey;

/// Where a single point lands in the grid
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Angular bin, `[0, bins)`
    pub bin: usize,
    /// Cell inside that bin
    pub key: VoxelKey,
}

/// Why a point did not make it into the grid
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// NaN or infinite coordinate
    NonFinite,
    /// Radius or height index does not fit in 32 bits
    OutOfRange,
}

/// Maps continuous `(r, theta, z)` onto integer cells
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoxelQuantizer {
    scale_r: f64,
    scale_z: f64,
    delta_theta_deg: f64,
    bins: usize,
}

impl VoxelQuantizer {
    /// Create a quantizer from a config, validating it first
    pub fn new(config: &CylVoxConfig) -> Result<Self> {
        let bins = config.validate()?;
        Ok(Self {
            scale_r: config.scale_r,
            scale_z: config.scale_z,
            delta_theta_deg: config.delta_theta_deg,
            bins,
        })
    }

    /// Number of angular bins
    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn delta_theta_deg(&self) -> f64 {
        self.delta_theta_deg
    }

    /// Quantize one projected coordinate
    #[inline]
    pub fn quantize(&self, c: CylindricalCoord) -> std::result::Result<Placement, Rejection> {
        if !(c.r.is_finite() && c.theta_deg.is_finite() && c.z.is_finite()) {
            return Err(Rejection::NonFinite);
        }

        let ir = cell_index(c.r, self.scale_r).ok_or(Rejection::OutOfRange)?;
        let iz = cell_index(c.z, self.scale_z).ok_or(Rejection::OutOfRange)?;
        let bin = bin_for_angle(c.theta_deg, self.delta_theta_deg, self.bins);

        Ok(Placement { bin, key: VoxelKey::new(ir, iz) })
    }
}

/// `floor(value / scale)` as a u32, or `None` if it does not fit
#[inline]
fn cell_index(value: f64, scale: f64) -> Option<u32> {
    let idx = (value / scale).floor();
    // value is non-negative by construction; -0.0 floors to -0.0 and passes
    if idx >= 0.0 && idx <= u32::MAX as f64 {
        Some(idx as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(r: f64, theta_deg: f64, z: f64) -> CylindricalCoord {
        CylindricalCoord { r, theta_deg, z }
    }

    #[test]
    fn test_floor_indices() {
        let q = VoxelQuantizer::new(&CylVoxConfig::new(0.5, 2.0, 90.0)).unwrap();
        let p = q.quantize(coord(1.2, 100.0, 4.9)).unwrap();
        assert_eq!(p.bin, 1);
        assert_eq!(p.key.unpack(), (2, 2));
    }

    #[test]
    fn test_same_cell_same_key() {
        let q = VoxelQuantizer::new(&CylVoxConfig::new(1.0, 1.0, 10.0)).unwrap();
        let a = q.quantize(coord(3.1, 12.0, 0.2)).unwrap();
        let b = q.quantize(coord(3.9, 19.9, 0.9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_last_bin_clamped() {
        let q = VoxelQuantizer::new(&CylVoxConfig::new(1.0, 1.0, 7.0)).unwrap();
        assert_eq!(q.bins(), 51);
        assert_eq!(q.quantize(coord(1.0, 359.5, 0.0)).unwrap().bin, 50);
    }

    #[test]
    fn test_rejects_overflow() {
        let q = VoxelQuantizer::new(&CylVoxConfig::new(1e-6, 1.0, 1.0)).unwrap();
        assert_eq!(q.quantize(coord(1e9, 0.0, 0.0)), Err(Rejection::OutOfRange));
        assert_eq!(q.quantize(coord(1.0, 0.0, f64::INFINITY)), Err(Rejection::NonFinite));
    }

    #[test]
    fn test_invalid_config() {
        assert!(VoxelQuantizer::new(&CylVoxConfig::new(0.0, 1.0, 1.0)).is_err());
    }
}
