//! Packed (radius, height) voxel identifiers

/// Occupancy key for one cell inside an angular slice.
///
/// Radius index lives in the high 32 bits, height index in the low 32 bits,
/// so keys sort ring-by-ring with rows ascending inside each ring.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoxelKey(u64);

impl VoxelKey {
    /// Pack a radius index and a height index
    #[inline]
    pub const fn new(radius_index: u32, height_index: u32) -> Self {
        Self(((radius_index as u64) << 32) | height_index as u64)
    }

    /// Wrap an already packed value
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Packed representation
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn radius_index(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    pub const fn height_index(self) -> u32 {
        self.0 as u32
    }

    /// Split back into `(radius_index, height_index)`
    #[inline]
    pub const fn unpack(self) -> (u32, u32) {
        (self.radius_index(), self.height_index())
    }
}

impl From<(u32, u32)> for VoxelKey {
    fn from((ir, iz): (u32, u32)) -> Self {
        Self::new(ir, iz)
    }
}
