//! Frames: the slice of voxels shown at one phase angle

pub mod resolver;

pub use resolver::{resolve, FrameResolver, MAX_PHASE_MAGNITUDE_DEG};

use crate::voxel::key::VoxelKey;

/// Borrowed view of one angular slice, ready for a display driver.
///
/// Cells are ordered ring-by-ring (radius ascending, then height). Only the
/// set of cells is meaningful; drivers must not rely on the order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame<'a> {
    bin: usize,
    span_deg: (f64, f64),
    keys: &'a [VoxelKey],
}

impl<'a> Frame<'a> {
    pub(crate) fn new(bin: usize, span_deg: (f64, f64), keys: &'a [VoxelKey]) -> Self {
        Self { bin, span_deg, keys }
    }

    /// Angular bin this frame was taken from
    pub fn bin_index(&self) -> usize {
        self.bin
    }

    /// `[start, end)` of the bin in degrees
    pub fn span_deg(&self) -> (f64, f64) {
        self.span_deg
    }

    /// Packed cells
    pub fn keys(&self) -> &'a [VoxelKey] {
        self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// `(radius_index, height_index)` pairs, without allocating
    pub fn cells(&self) -> impl ExactSizeIterator<Item = (u32, u32)> + 'a {
        self.keys.iter().map(|k| k.unpack())
    }

    /// Owned copy of the cells, for consumers that outlive the grid
    pub fn to_cells(&self) -> Vec<(u32, u32)> {
        self.cells().collect()
    }
}
