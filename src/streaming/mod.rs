//! Serving grids to the display loop
//!
//! Key concepts:
//! - Artifact slot: the one grid currently served, swapped whole
//! - Tickets: every load request supersedes the ones before it
//! - Asset pipeline: load + voxelize on a blocking worker, publish if still current

pub mod slot;
pub mod pipeline;

pub use slot::{ArtifactSlot, PublishOutcome};
pub use pipeline::{AssetPipeline, LoadOutcome};
