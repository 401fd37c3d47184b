//! Centroid-relative cylindrical projection
//!
//! The rotation axis is vertical, so centering only moves the horizontal
//! plane. Heights are measured from the lowest point of the batch so every
//! height index comes out non-negative.

use glam::DVec2;

use crate::core::types::Point3D;
use crate::math::angle::normalize_degrees;

/// Cylindrical coordinate of one point relative to the projection axis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CylindricalCoord {
    /// Horizontal distance from the axis
    pub r: f64,
    /// Azimuth in degrees, `[0, 360)`
    pub theta_deg: f64,
    /// Height above the batch minimum
    pub z: f64,
}

/// Projects Cartesian points around a vertical axis through the XY centroid
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CylindricalProjector {
    centroid: DVec2,
    z_min: f64,
}

impl CylindricalProjector {
    /// Create a projector with an explicit axis and height baseline
    pub fn new(centroid: DVec2, z_min: f64) -> Self {
        Self { centroid, z_min }
    }

    /// Fit the axis to a batch: XY mean and minimum Z over finite points.
    ///
    /// Returns the projector and the number of finite points it was fitted on.
    /// With no finite points the axis sits at the origin with a zero baseline.
    pub fn fit(points: &[Point3D]) -> (Self, usize) {
        let mut sum = DVec2::ZERO;
        let mut z_min = f64::INFINITY;
        let mut count = 0usize;

        for p in points.iter().filter(|p| p.is_finite()) {
            sum += DVec2::new(p.x as f64, p.y as f64);
            z_min = z_min.min(p.z as f64);
            count += 1;
        }

        if count == 0 {
            return (Self::default(), 0);
        }

        (Self::new(sum / count as f64, z_min), count)
    }

    /// XY centroid the axis passes through
    pub fn centroid(&self) -> DVec2 {
        self.centroid
    }

    /// Height baseline subtracted from every point
    pub fn z_min(&self) -> f64 {
        self.z_min
    }

    /// Project a point. Returns `None` for non-finite coordinates.
    #[inline]
    pub fn project(&self, p: Point3D) -> Option<CylindricalCoord> {
        if !p.is_finite() {
            return None;
        }

        let dx = p.x as f64 - self.centroid.x;
        let dy = p.y as f64 - self.centroid.y;
        let r = (dx * dx + dy * dy).sqrt();
        let theta_deg = normalize_degrees(dy.atan2(dx).to_degrees());

        Some(CylindricalCoord {
            r,
            theta_deg,
            z: p.z as f64 - self.z_min,
        })
    }
}
