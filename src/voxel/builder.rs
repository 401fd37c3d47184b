//! Cylindrical voxel grid construction from raw point clouds

use std::collections::HashSet;
use std::convert::Infallible;

use rayon::prelude::*;

use crate::core::{CylVoxConfig, Error, Point3D, Result};
use crate::math::cylindrical::CylindricalProjector;
use crate::voxel::cylvox::CylVox;
use crate::voxel::key::VoxelKey;
use crate::voxel::quantizer::{Placement, Rejection, VoxelQuantizer};

/// Points processed between cancellation checks
pub const CANCEL_CHECK_INTERVAL: usize = 16_384;

/// Outcome counters of one build
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Points handed to the builder
    pub total_points: usize,
    /// Points that landed in a cell (before deduplication)
    pub accepted_points: usize,
    /// Points skipped for NaN/Inf coordinates
    pub non_finite: usize,
    /// Points whose cell index overflowed
    pub out_of_range: usize,
    /// Distinct occupied cells after deduplication
    pub voxel_count: usize,
    /// Bins with at least one cell
    pub occupied_bins: usize,
}

impl BuildReport {
    /// Points that were skipped for any reason
    pub fn rejected(&self) -> usize {
        self.non_finite + self.out_of_range
    }

    /// True when input was non-empty but nothing survived
    pub fn all_rejected(&self) -> bool {
        self.total_points > 0 && self.accepted_points == 0
    }

    fn record(&mut self, result: std::result::Result<Placement, Rejection>, sets: &mut [HashSet<VoxelKey>]) {
        match result {
            Ok(placement) => {
                self.accepted_points += 1;
                sets[placement.bin].insert(placement.key);
            }
            Err(Rejection::NonFinite) => self.non_finite += 1,
            Err(Rejection::OutOfRange) => self.out_of_range += 1,
        }
    }
}

/// Builds [`CylVox`] grids for one configuration
#[derive(Clone, Debug)]
pub struct CylVoxBuilder {
    config: CylVoxConfig,
    quantizer: VoxelQuantizer,
}

impl CylVoxBuilder {
    /// Create a builder. Fails with `InvalidConfiguration` for bad scales.
    pub fn new(config: CylVoxConfig) -> Result<Self> {
        let quantizer = VoxelQuantizer::new(&config)?;
        Ok(Self { config, quantizer })
    }

    pub fn config(&self) -> &CylVoxConfig {
        &self.config
    }

    /// Number of angular bins every grid from this builder has
    pub fn bins(&self) -> usize {
        self.quantizer.bins()
    }

    /// Build a grid. Malformed points are skipped and counted in the report.
    pub fn build(&self, points: &[Point3D]) -> (CylVox, BuildReport) {
        let Ok(built) = self.build_with(points, || Ok::<(), Infallible>(()));
        built
    }

    /// Build a grid, polling `is_cancelled` between batches.
    ///
    /// Returns `Error::Cancelled` as soon as the predicate reports true; no
    /// partial grid escapes.
    pub fn build_cancellable<F>(&self, points: &[Point3D], is_cancelled: F) -> Result<(CylVox, BuildReport)>
    where
        F: Fn() -> bool,
    {
        self.build_with(points, || if is_cancelled() { Err(Error::Cancelled) } else { Ok(()) })
    }

    fn build_with<E, F>(&self, points: &[Point3D], checkpoint: F) -> std::result::Result<(CylVox, BuildReport), E>
    where
        F: Fn() -> std::result::Result<(), E>,
    {
        let (projector, finite) = CylindricalProjector::fit(points);
        log::debug!(
            "Fitted axis at ({:.4}, {:.4}), z_min {:.4} over {}/{} finite points",
            projector.centroid().x,
            projector.centroid().y,
            projector.z_min(),
            finite,
            points.len()
        );

        let mut report = BuildReport {
            total_points: points.len(),
            ..Default::default()
        };
        let mut sets: Vec<HashSet<VoxelKey>> = vec![HashSet::new(); self.quantizer.bins()];

        let parallel = points.len() >= self.config.parallel_threshold;
        let mut placed = Vec::new();

        for batch in points.chunks(CANCEL_CHECK_INTERVAL) {
            checkpoint()?;

            if parallel {
                batch
                    .par_iter()
                    .map(|p| self.place(&projector, *p))
                    .collect_into_vec(&mut placed);
                for result in placed.drain(..) {
                    report.record(result, &mut sets);
                }
            } else {
                for p in batch {
                    report.record(self.place(&projector, *p), &mut sets);
                }
            }
        }

        checkpoint()?;

        let grid = CylVox::from_sets(&self.config, &projector, sets);
        report.voxel_count = grid.voxel_count();
        report.occupied_bins = grid.slices().filter(|s| !s.is_empty()).count();

        if report.all_rejected() {
            log::warn!(
                "All {} points rejected ({} non-finite, {} out of range); grid is empty",
                report.total_points,
                report.non_finite,
                report.out_of_range
            );
        } else if report.rejected() > 0 {
            log::debug!(
                "Skipped {} malformed points ({} non-finite, {} out of range)",
                report.rejected(),
                report.non_finite,
                report.out_of_range
            );
        }

        log::info!(
            "Built cylindrical grid: {} voxels in {}/{} bins from {} points",
            report.voxel_count,
            report.occupied_bins,
            grid.bin_count(),
            report.total_points
        );

        Ok((grid, report))
    }

    #[inline]
    fn place(&self, projector: &CylindricalProjector, p: Point3D) -> std::result::Result<Placement, Rejection> {
        let coord = projector.project(p).ok_or(Rejection::NonFinite)?;
        self.quantizer.quantize(coord)
    }
}

/// Build a grid in one call: validate `config`, then voxelize `points`.
pub fn build(points: &[Point3D], config: &CylVoxConfig) -> Result<(CylVox, BuildReport)> {
    Ok(CylVoxBuilder::new(config.clone())?.build(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn unit_config(delta: f64) -> CylVoxConfig {
        CylVoxConfig::new(1.0, 1.0, delta)
    }

    #[test]
    fn test_empty_input() {
        let (grid, report) = build(&[], &unit_config(10.0)).unwrap();
        assert_eq!(grid.bin_count(), 36);
        assert!(grid.is_empty());
        assert_eq!(report, BuildReport::default());
        assert!(!report.all_rejected());
    }

    #[test]
    fn test_four_cardinal_points() {
        let points = [
            Point3D::new(1.0, 0.0, 0.0),
            Point3D::new(-1.0, 0.0, 0.0),
            Point3D::new(0.0, 1.0, 0.0),
            Point3D::new(0.0, -1.0, 0.0),
        ];
        let (grid, report) = build(&points, &unit_config(90.0)).unwrap();

        assert_eq!(grid.bin_count(), 4);
        assert_eq!(report.occupied_bins, 4);
        for bin in 0..4 {
            let slice = grid.slice(bin).unwrap();
            assert_eq!(slice.len(), 1, "bin {}", bin);
            assert_eq!(slice[0].unpack(), (1, 0));
        }
    }

    #[test]
    fn test_duplicates_collapse() {
        // Centroid at origin thanks to the balancing point on the far side
        let points = [
            Point3D::new(2.2, 0.1, 0.0),
            Point3D::new(2.2, 0.1, 0.0),
            Point3D::new(2.7, 0.2, 0.5),
            Point3D::new(-7.1, -0.4, 0.0),
        ];
        let (grid, report) = build(&points, &unit_config(90.0)).unwrap();
        assert_eq!(report.accepted_points, 4);
        assert_eq!(grid.slice(0).unwrap().len(), 1);
        assert_eq!(grid.voxel_count(), 2);
    }

    #[test]
    fn test_rejects_nan_point() {
        let points = [Point3D::new(f32::NAN, 0.0, 0.0), Point3D::new(1.0, 1.0, 1.0)];
        let (grid, report) = build(&points, &unit_config(45.0)).unwrap();

        assert_eq!(report.rejected(), 1);
        assert_eq!(report.non_finite, 1);
        assert_eq!(report.accepted_points, 1);
        assert_eq!(grid.voxel_count(), 1);
        // The lone valid point is its own centroid and baseline
        assert_eq!(grid.slice(0).unwrap(), &[VoxelKey::new(0, 0)]);
    }

    #[test]
    fn test_all_rejected_is_empty_success() {
        let points = [Point3D::new(f32::NAN, 0.0, 0.0), Point3D::new(0.0, f32::INFINITY, 0.0)];
        let (grid, report) = build(&points, &unit_config(45.0)).unwrap();
        assert!(grid.is_empty());
        assert!(report.all_rejected());
        assert_eq!(report.rejected(), 2);
    }

    #[test]
    fn test_invalid_config() {
        let result = build(&[Point3D::ZERO], &CylVoxConfig::new(-1.0, 1.0, 1.0));
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let points: Vec<Point3D> = (0..50_000)
            .map(|i| {
                let t = i as f32 * 0.013;
                Point3D::new(t.cos() * (1.0 + (i % 7) as f32), t.sin() * 3.0, (i % 113) as f32 * 0.1)
            })
            .collect();

        let serial = CylVoxConfig { parallel_threshold: usize::MAX, ..CylVoxConfig::new(0.25, 0.25, 3.0) };
        let parallel = CylVoxConfig { parallel_threshold: 1, ..serial.clone() };

        let (a, ra) = build(&points, &serial).unwrap();
        let (b, rb) = build(&points, &parallel).unwrap();
        assert_eq!(a, b);
        assert_eq!(ra, rb);
    }

    #[test]
    fn test_cancellation() {
        let points = vec![Point3D::ONE; CANCEL_CHECK_INTERVAL * 3];
        let builder = CylVoxBuilder::new(unit_config(1.0)).unwrap();

        let polls = Cell::new(0);
        let result = builder.build_cancellable(&points, || {
            polls.set(polls.get() + 1);
            polls.get() > 1
        });
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(polls.get(), 2);
    }
}
