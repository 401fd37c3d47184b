//! Error types for cylvox

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid phase angle: {0}")]
    InvalidPhaseAngle(f64),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Build cancelled")]
    Cancelled,

    #[error("Build worker failed: {0}")]
    Worker(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a [`PointSource`](crate::loader::PointSource)
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Point file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported point file {}: {reason}", path.display())]
    Unsupported { path: PathBuf, reason: String },

    #[error("Malformed point data at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
}
