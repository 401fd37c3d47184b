//! Core type aliases and re-exports

pub use glam::{DVec2, Vec3};

/// A raw captured point. Coordinates are in the capture's units (usually meters).
pub type Point3D = Vec3;

/// Standard Result type for the crate
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;
