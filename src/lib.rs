//! Cylvox - cylindrical voxel slicing for rotating volumetric displays
//!
//! A point cloud is projected around a vertical axis through its centroid,
//! quantized into (radius, height) cells and split into angular slices. The
//! display loop then asks for the slice under the arm's current phase angle.

pub mod core;
pub mod math;
pub mod voxel;
pub mod frame;
pub mod loader;
pub mod streaming;

pub use crate::core::{CylVoxConfig, Error, LoadError, Point3D, Result};
pub use crate::frame::{Frame, FrameResolver};
pub use crate::loader::{FilePointSource, MemoryPointSource, PointSource};
pub use crate::streaming::{ArtifactSlot, AssetPipeline, LoadOutcome};
pub use crate::voxel::{build, BuildReport, CylVox, CylVoxBuilder, VoxelKey};
