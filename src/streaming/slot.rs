//! ArtifactSlot - the currently served grid and its atomic replacement.
//!
//! Builds happen off to the side and are handed in whole; readers take an
//! `Arc` snapshot and never observe a half-built grid.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::frame::FrameResolver;
use crate::voxel::cylvox::CylVox;

/// Result of handing a finished grid to the slot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The grid is now served
    Published,
    /// A newer request exists; the grid was dropped
    Superseded,
}

struct Installed {
    ticket: u64,
    grid: Arc<CylVox>,
}

/// Holds the served grid plus the request counter used to detect stale builds
pub struct ArtifactSlot {
    installed: RwLock<Installed>,
    /// Highest ticket handed out so far
    latest_ticket: AtomicU64,
}

impl ArtifactSlot {
    /// Create a slot serving `initial` under ticket 0
    pub fn new(initial: CylVox) -> Self {
        Self {
            installed: RwLock::new(Installed {
                ticket: 0,
                grid: Arc::new(initial),
            }),
            latest_ticket: AtomicU64::new(0),
        }
    }

    /// Snapshot of the served grid. Only the pointer is copied.
    pub fn current(&self) -> Arc<CylVox> {
        Arc::clone(&self.installed.read().unwrap_or_else(|e| e.into_inner()).grid)
    }

    /// Ticket the served grid was published under
    pub fn current_ticket(&self) -> u64 {
        self.installed.read().unwrap_or_else(|e| e.into_inner()).ticket
    }

    /// Resolver bound to the served grid
    pub fn resolver(&self) -> FrameResolver {
        FrameResolver::new(self.current())
    }

    /// Reserve a ticket for a new build. Every earlier ticket becomes stale.
    pub fn next_ticket(&self) -> u64 {
        self.latest_ticket.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Most recently reserved ticket
    pub fn latest_ticket(&self) -> u64 {
        self.latest_ticket.load(Ordering::Acquire)
    }

    /// Whether a newer request than `ticket` has been made
    pub fn is_superseded(&self, ticket: u64) -> bool {
        self.latest_ticket() != ticket
    }

    /// Install `grid` if `ticket` is still the newest request.
    ///
    /// The check and the swap happen under the write lock, so a stale build
    /// can never overwrite a newer one.
    pub fn publish(&self, ticket: u64, grid: CylVox) -> PublishOutcome {
        let mut installed = self.installed.write().unwrap_or_else(|e| e.into_inner());

        if ticket <= installed.ticket || self.is_superseded(ticket) {
            log::debug!(
                "Dropping grid for ticket {} (served {}, latest {})",
                ticket,
                installed.ticket,
                self.latest_ticket()
            );
            return PublishOutcome::Superseded;
        }

        let previous = std::mem::replace(
            &mut *installed,
            Installed {
                ticket,
                grid: Arc::new(grid),
            },
        );
        drop(installed);

        log::debug!("Published grid for ticket {} (replaced ticket {})", ticket, previous.ticket);
        PublishOutcome::Published
    }
}

impl std::fmt::Debug for ArtifactSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactSlot")
            .field("current_ticket", &self.current_ticket())
            .field("latest_ticket", &self.latest_ticket())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CylVoxConfig, Point3D};
    use crate::voxel::builder::build;

    fn grid_with(points: &[Point3D]) -> CylVox {
        build(points, &CylVoxConfig::new(1.0, 1.0, 90.0)).unwrap().0
    }

    fn empty_slot() -> ArtifactSlot {
        ArtifactSlot::new(CylVox::empty(&CylVoxConfig::new(1.0, 1.0, 90.0)).unwrap())
    }

    #[test]
    fn test_publish_latest() {
        let slot = empty_slot();
        let ticket = slot.next_ticket();
        assert_eq!(ticket, 1);

        let outcome = slot.publish(ticket, grid_with(&[Point3D::X, Point3D::NEG_X]));
        assert_eq!(outcome, PublishOutcome::Published);
        assert_eq!(slot.current_ticket(), 1);
        assert_eq!(slot.current().voxel_count(), 2);
    }

    #[test]
    fn test_stale_ticket_dropped() {
        let slot = empty_slot();
        let old = slot.next_ticket();
        let new = slot.next_ticket();
        assert!(slot.is_superseded(old));

        assert_eq!(slot.publish(old, grid_with(&[Point3D::X])), PublishOutcome::Superseded);
        assert!(slot.current().is_empty());

        assert_eq!(slot.publish(new, grid_with(&[Point3D::X])), PublishOutcome::Published);
        // Re-publishing the same ticket is refused
        assert_eq!(slot.publish(new, grid_with(&[Point3D::Y])), PublishOutcome::Superseded);
        assert_eq!(slot.current_ticket(), new);
    }

    #[test]
    fn test_snapshot_survives_swap() {
        let slot = empty_slot();
        let before = slot.resolver();

        let ticket = slot.next_ticket();
        slot.publish(ticket, grid_with(&[Point3D::X, Point3D::NEG_X]));

        assert!(before.grid().is_empty());
        assert_eq!(before.get_slice(0.0).unwrap().len(), 0);
        assert!(!slot.resolver().grid().is_empty());
    }
}
