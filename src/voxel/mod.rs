//! Cylindrical voxel grid: keys, quantization, construction

pub mod key;
pub mod quantizer;
pub mod cylvox;
pub mod builder;

pub use key::VoxelKey;
pub use quantizer::{Placement, Rejection, VoxelQuantizer};
pub use cylvox::{CylVox, CylVoxStats};
pub use builder::{build, BuildReport, CylVoxBuilder};
