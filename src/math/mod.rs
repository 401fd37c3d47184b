//! Angular math and cylindrical projection

pub mod angle;
pub mod cylindrical;

pub use angle::{normalize_degrees, bin_for_angle, FULL_TURN_DEG};
pub use cylindrical::{CylindricalCoord, CylindricalProjector};
