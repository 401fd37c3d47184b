//! The finished cylindrical voxel grid
//!
//! A `CylVox` is immutable once built. All slices share one contiguous key
//! buffer; `offsets[b]..offsets[b + 1]` is the sorted, deduplicated occupancy
//! of bin `b`.

use std::collections::HashSet;

use glam::DVec2;

use crate::core::{CylVoxConfig, Result};
use crate::frame::Frame;
use crate::math::angle::bin_span;
use crate::math::cylindrical::CylindricalProjector;
use crate::voxel::key::VoxelKey;

/// Summary numbers for sizing a display driver
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CylVoxStats {
    /// Occupied cells across all bins
    pub voxel_count: usize,
    /// Bins with at least one cell
    pub occupied_bins: usize,
    /// Largest occupied cells in a single bin
    pub max_slice_len: usize,
    /// Largest radius index present, if any cell is occupied
    pub max_radius_index: Option<u32>,
    /// Largest height index present, if any cell is occupied
    pub max_height_index: Option<u32>,
}

/// Cylindrical voxel grid split into angular slices
#[derive(Clone, Debug, PartialEq)]
pub struct CylVox {
    scale_r: f64,
    scale_z: f64,
    delta_theta_deg: f64,
    centroid: DVec2,
    z_min: f64,
    keys: Vec<VoxelKey>,
    offsets: Vec<usize>,
}

impl CylVox {
    /// Grid with every slice empty
    pub fn empty(config: &CylVoxConfig) -> Result<Self> {
        let bins = config.validate()?;
        Ok(Self {
            scale_r: config.scale_r,
            scale_z: config.scale_z,
            delta_theta_deg: config.delta_theta_deg,
            centroid: DVec2::ZERO,
            z_min: 0.0,
            keys: Vec::new(),
            offsets: vec![0; bins + 1],
        })
    }

    /// Freeze per-bin occupancy sets into the packed layout
    pub(crate) fn from_sets(
        config: &CylVoxConfig,
        projector: &CylindricalProjector,
        sets: Vec<HashSet<VoxelKey>>,
    ) -> Self {
        let total: usize = sets.iter().map(HashSet::len).sum();
        let mut keys = Vec::with_capacity(total);
        let mut offsets = Vec::with_capacity(sets.len() + 1);
        offsets.push(0);

        for set in sets {
            let start = keys.len();
            keys.extend(set);
            keys[start..].sort_unstable();
            offsets.push(keys.len());
        }

        Self {
            scale_r: config.scale_r,
            scale_z: config.scale_z,
            delta_theta_deg: config.delta_theta_deg,
            centroid: projector.centroid(),
            z_min: projector.z_min(),
            keys,
            offsets,
        }
    }

    pub fn scale_r(&self) -> f64 {
        self.scale_r
    }

    pub fn scale_z(&self) -> f64 {
        self.scale_z
    }

    /// Angular width of one slice in degrees
    pub fn delta_theta_deg(&self) -> f64 {
        self.delta_theta_deg
    }

    /// XY centroid of the source cloud (the rotation axis)
    pub fn centroid(&self) -> DVec2 {
        self.centroid
    }

    /// Height baseline of the source cloud
    pub fn z_min(&self) -> f64 {
        self.z_min
    }

    /// Number of angular bins, always >= 1
    pub fn bin_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Total occupied cells across all slices
    pub fn voxel_count(&self) -> usize {
        self.keys.len()
    }

    /// True when no slice holds any cell
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sorted occupancy of one bin
    #[inline]
    pub fn slice(&self, bin: usize) -> Option<&[VoxelKey]> {
        let start = *self.offsets.get(bin)?;
        let end = *self.offsets.get(bin + 1)?;
        Some(&self.keys[start..end])
    }

    /// Iterate slices in bin order
    pub fn slices(&self) -> impl ExactSizeIterator<Item = &[VoxelKey]> + '_ {
        self.offsets.windows(2).map(|w| &self.keys[w[0]..w[1]])
    }

    /// Whether `key` is occupied in `bin`
    pub fn contains(&self, bin: usize, key: VoxelKey) -> bool {
        self.slice(bin).is_some_and(|s| s.binary_search(&key).is_ok())
    }

    /// Angular span `[start, end)` of a bin in degrees
    pub fn bin_span(&self, bin: usize) -> (f64, f64) {
        bin_span(bin, self.delta_theta_deg, self.bin_count())
    }

    /// Physical `(radius, height)` of a cell center, in source units.
    /// Height is absolute, the baseline is added back.
    pub fn cell_center(&self, key: VoxelKey) -> (f64, f64) {
        let (ir, iz) = key.unpack();
        (
            (ir as f64 + 0.5) * self.scale_r,
            self.z_min + (iz as f64 + 0.5) * self.scale_z,
        )
    }

    /// Frame to show at `phase_angle_deg`. See [`crate::frame::resolve`].
    #[inline]
    pub fn resolve(&self, phase_angle_deg: f64) -> Result<Frame<'_>> {
        crate::frame::resolve(self, phase_angle_deg)
    }

    pub fn stats(&self) -> CylVoxStats {
        let mut stats = CylVoxStats {
            voxel_count: self.keys.len(),
            ..Default::default()
        };

        for slice in self.slices() {
            if slice.is_empty() {
                continue;
            }
            stats.occupied_bins += 1;
            stats.max_slice_len = stats.max_slice_len.max(slice.len());
            // Sorted by radius first, so the last key has the largest ring
            if let Some(last) = slice.last() {
                let ir = last.radius_index();
                stats.max_radius_index = Some(stats.max_radius_index.map_or(ir, |m| m.max(ir)));
            }
            for key in slice {
                let iz = key.height_index();
                stats.max_height_index = Some(stats.max_height_index.map_or(iz, |m| m.max(iz)));
            }
        }

        stats
    }
}
