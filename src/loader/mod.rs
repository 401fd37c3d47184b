//! Point sources: where raw clouds come from
//!
//! The grid builder only needs a `Vec<Point3D>`. Anything that can produce
//! one for a path (file readers, network fetchers, fixtures) implements
//! [`PointSource`].

pub mod xyz;
pub mod ply;
pub mod pcd;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::core::{LoadError, Point3D};

/// Supplies the points of an asset
pub trait PointSource: Send + Sync {
    /// Load every point of the asset at `path`, in source order
    fn load(&self, path: &Path) -> Result<Vec<Point3D>, LoadError>;
}

/// File formats understood by [`FilePointSource`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointFormat {
    /// One `x y z [...]` row per line, whitespace or comma separated
    Xyz,
    /// Stanford PLY, ascii or binary
    Ply,
    /// PCL point cloud data, ascii or binary
    Pcd,
}

impl PointFormat {
    /// Pick a format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xyz" | "txt" | "csv" | "pts" => Some(Self::Xyz),
            "ply" => Some(Self::Ply),
            "pcd" => Some(Self::Pcd),
            _ => None,
        }
    }
}

/// Reads point files from the local filesystem, dispatching on extension
#[derive(Clone, Copy, Debug, Default)]
pub struct FilePointSource;

impl FilePointSource {
    pub fn new() -> Self {
        Self
    }
}

impl PointSource for FilePointSource {
    fn load(&self, path: &Path) -> Result<Vec<Point3D>, LoadError> {
        let format = PointFormat::from_path(path).ok_or_else(|| LoadError::Unsupported {
            path: path.to_path_buf(),
            reason: "unknown extension (expected .xyz, .txt, .csv, .pts, .ply or .pcd)".into(),
        })?;

        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(LoadError::Unsupported {
                    path: path.to_path_buf(),
                    reason: "not a regular file".into(),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        }

        let points = match format {
            PointFormat::Xyz => xyz::read(path)?,
            PointFormat::Ply => ply::read(path)?,
            PointFormat::Pcd => pcd::read(path)?,
        };
        log::debug!("Loaded {} points from {} ({:?})", points.len(), path.display(), format);
        Ok(points)
    }
}

/// In-memory assets keyed by path
#[derive(Debug, Default)]
pub struct MemoryPointSource {
    assets: RwLock<HashMap<PathBuf, Vec<Point3D>>>,
}

impl MemoryPointSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an asset
    pub fn insert(&self, path: impl Into<PathBuf>, points: Vec<Point3D>) {
        self.assets
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.into(), points);
    }

    /// Number of registered assets
    pub fn len(&self) -> usize {
        self.assets.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PointSource for MemoryPointSource {
    fn load(&self, path: &Path) -> Result<Vec<Point3D>, LoadError> {
        self.assets
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(path.to_path_buf()))
    }
}
