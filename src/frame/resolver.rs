//! Phase angle to frame resolution
//!
//! Runs inside the display's rotation loop: O(1), no locks, no allocation.
//! A bad angle is an error, never a silent fallback to bin 0.

use std::sync::Arc;

use crate::core::{Error, Result};
use crate::frame::Frame;
use crate::math::angle::{bin_for_angle, bin_span, normalize_degrees};
use crate::voxel::cylvox::CylVox;

/// Largest accepted phase magnitude in degrees. Beyond this an f64 angle
/// no longer resolves sub-degree bins reliably, so it points at a sensor or
/// accumulator fault upstream.
pub const MAX_PHASE_MAGNITUDE_DEG: f64 = 1.0e9;

/// Resolve `phase_angle_deg` against `grid`.
///
/// Finite angles wrap into `[0, 360)`, so `-10` and `350` select the same
/// bin, as do `0` and `360`. NaN, infinities and magnitudes above
/// [`MAX_PHASE_MAGNITUDE_DEG`] fail with `InvalidPhaseAngle`.
#[inline]
pub fn resolve(grid: &CylVox, phase_angle_deg: f64) -> Result<Frame<'_>> {
    if !phase_angle_deg.is_finite() || phase_angle_deg.abs() > MAX_PHASE_MAGNITUDE_DEG {
        return Err(Error::InvalidPhaseAngle(phase_angle_deg));
    }

    let bins = grid.bin_count();
    let bin = bin_for_angle(normalize_degrees(phase_angle_deg), grid.delta_theta_deg(), bins);
    let keys = grid.slice(bin).unwrap_or_default();

    Ok(Frame::new(bin, bin_span(bin, grid.delta_theta_deg(), bins), keys))
}

/// Holds one published grid and serves frames from it.
///
/// Cloning is a pointer copy. A resolver keeps its grid alive even after a
/// newer one is published, so a display loop sees one consistent grid until
/// it asks for a fresh resolver.
#[derive(Clone, Debug)]
pub struct FrameResolver {
    grid: Arc<CylVox>,
}

impl FrameResolver {
    pub fn new(grid: Arc<CylVox>) -> Self {
        Self { grid }
    }

    /// Grid this resolver reads from
    pub fn grid(&self) -> &Arc<CylVox> {
        &self.grid
    }

    /// Frame to show at `phase_angle_deg`
    #[inline]
    pub fn get_slice(&self, phase_angle_deg: f64) -> Result<Frame<'_>> {
        resolve(&self.grid, phase_angle_deg)
    }
}
