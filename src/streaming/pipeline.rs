//! Asset pipeline: load, voxelize and publish on a blocking worker.
//!
//! Every load request takes a ticket from the slot. A request that has been
//! overtaken by a newer one abandons its build and never publishes, so the
//! display always converges on the most recently requested asset.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::core::{CylVoxConfig, Error, Point3D, Result};
use crate::frame::FrameResolver;
use crate::loader::PointSource;
use crate::streaming::slot::{ArtifactSlot, PublishOutcome};
use crate::voxel::builder::{BuildReport, CylVoxBuilder};
use crate::voxel::cylvox::CylVox;

/// What became of a load request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The new grid is being served
    Published(BuildReport),
    /// A newer request overtook this one; nothing was published
    Superseded { ticket: u64 },
}

/// Loads assets from a [`PointSource`] and keeps the served grid current
pub struct AssetPipeline<S: PointSource> {
    source: Arc<S>,
    slot: Arc<ArtifactSlot>,
    builder: CylVoxBuilder,
}

impl<S: PointSource + 'static> AssetPipeline<S> {
    /// Create a pipeline serving an empty grid until the first load lands
    pub fn new(source: S, config: CylVoxConfig) -> Result<Self> {
        let builder = CylVoxBuilder::new(config)?;
        let slot = Arc::new(ArtifactSlot::new(CylVox::empty(builder.config())?));

        Ok(Self {
            source: Arc::new(source),
            slot,
            builder,
        })
    }

    pub fn config(&self) -> &CylVoxConfig {
        self.builder.config()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Shared slot, for display threads that outlive the pipeline handle
    pub fn slot(&self) -> &Arc<ArtifactSlot> {
        &self.slot
    }

    /// Snapshot of the served grid
    pub fn current(&self) -> Arc<CylVox> {
        self.slot.current()
    }

    /// Resolver bound to the served grid
    pub fn resolver(&self) -> FrameResolver {
        self.slot.resolver()
    }

    /// Start loading `path` on tokio's blocking pool.
    ///
    /// The ticket is taken before this returns, so requests are ordered by
    /// call order. Must be called from within a tokio runtime.
    pub fn spawn_load(&self, path: impl Into<PathBuf>) -> JoinHandle<Result<LoadOutcome>> {
        let path = path.into();
        let ticket = self.slot.next_ticket();
        let source = Arc::clone(&self.source);
        let slot = Arc::clone(&self.slot);
        let builder = self.builder.clone();

        log::info!("Loading asset {} (ticket {})", path.display(), ticket);
        tokio::task::spawn_blocking(move || run_load(source.as_ref(), &slot, &builder, ticket, &path))
    }

    /// Load `path` in the background and wait for the outcome
    pub async fn load_asset(&self, path: impl Into<PathBuf>) -> Result<LoadOutcome> {
        self.spawn_load(path)
            .await
            .map_err(|e| Error::Worker(e.to_string()))?
    }

    /// Load `path` on the calling thread
    pub fn load_asset_blocking(&self, path: &Path) -> Result<LoadOutcome> {
        let ticket = self.slot.next_ticket();
        log::info!("Loading asset {} (ticket {})", path.display(), ticket);
        run_load(self.source.as_ref(), &self.slot, &self.builder, ticket, path)
    }

    /// Voxelize points already in memory and publish them
    pub fn build_now(&self, points: &[Point3D]) -> Result<LoadOutcome> {
        let ticket = self.slot.next_ticket();
        build_and_publish(&self.slot, &self.builder, ticket, points)
    }
}

fn run_load<S: PointSource + ?Sized>(
    source: &S,
    slot: &ArtifactSlot,
    builder: &CylVoxBuilder,
    ticket: u64,
    path: &Path,
) -> Result<LoadOutcome> {
    let points = match source.load(path) {
        Ok(points) => points,
        Err(e) => {
            log::warn!("Failed to load {} (ticket {}): {}", path.display(), ticket, e);
            return Err(e.into());
        }
    };

    if slot.is_superseded(ticket) {
        log::debug!("Ticket {} superseded after loading {}", ticket, path.display());
        return Ok(LoadOutcome::Superseded { ticket });
    }

    build_and_publish(slot, builder, ticket, &points)
}

fn build_and_publish(
    slot: &ArtifactSlot,
    builder: &CylVoxBuilder,
    ticket: u64,
    points: &[Point3D],
) -> Result<LoadOutcome> {
    match builder.build_cancellable(points, || slot.is_superseded(ticket)) {
        Ok((grid, report)) => match slot.publish(ticket, grid) {
            PublishOutcome::Published => Ok(LoadOutcome::Published(report)),
            PublishOutcome::Superseded => Ok(LoadOutcome::Superseded { ticket }),
        },
        Err(Error::Cancelled) => {
            log::debug!("Build for ticket {} abandoned", ticket);
            Ok(LoadOutcome::Superseded { ticket })
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LoadError;
    use crate::loader::{FilePointSource, MemoryPointSource};
    use std::sync::Mutex;
    use std::sync::mpsc;
    use std::time::Duration;

    fn config() -> CylVoxConfig {
        CylVoxConfig::new(1.0, 1.0, 90.0)
    }

    /// Two points on ring `ring`, at 0 and 180 degrees
    fn ring(ring: f32) -> Vec<Point3D> {
        vec![Point3D::new(ring + 0.5, 0.0, 0.0), Point3D::new(-(ring + 0.5), 0.0, 0.0)]
    }

    /// Blocks loads of one path until released
    struct GatedSource {
        inner: MemoryPointSource,
        slow_path: PathBuf,
        entered: Mutex<mpsc::Sender<()>>,
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl PointSource for GatedSource {
        fn load(&self, path: &Path) -> std::result::Result<Vec<Point3D>, LoadError> {
            if path == self.slow_path {
                let _ = self.entered.lock().unwrap().send(());
                let _ = self.gate.lock().unwrap().recv_timeout(Duration::from_secs(10));
            }
            self.inner.load(path)
        }
    }

    #[tokio::test]
    async fn test_load_publishes() {
        crate::core::logging::init_for_tests();
        let source = MemoryPointSource::new();
        source.insert("asset", ring(2.0));
        let pipeline = AssetPipeline::new(source, config()).unwrap();
        assert!(pipeline.current().is_empty());

        let outcome = pipeline.load_asset("asset").await.unwrap();
        let LoadOutcome::Published(report) = outcome else {
            panic!("expected publish, got {:?}", outcome);
        };
        assert_eq!(report.voxel_count, 2);
        assert_eq!(pipeline.slot().current_ticket(), 1);

        let resolver = pipeline.resolver();
        assert_eq!(resolver.get_slice(0.0).unwrap().to_cells(), vec![(2, 0)]);
        assert_eq!(resolver.get_slice(-180.0).unwrap().to_cells(), vec![(2, 0)]);
        assert!(resolver.get_slice(90.0).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_error_keeps_current() {
        let source = MemoryPointSource::new();
        source.insert("good", ring(1.0));
        let pipeline = AssetPipeline::new(source, config()).unwrap();

        pipeline.load_asset("good").await.unwrap();
        let before = pipeline.current();

        let result = pipeline.load_asset("missing").await;
        assert!(matches!(result, Err(Error::Load(LoadError::NotFound(_)))));
        assert!(Arc::ptr_eq(&before, &pipeline.current()));
    }

    #[test]
    fn test_invalid_config() {
        let result = AssetPipeline::new(MemoryPointSource::new(), CylVoxConfig::new(1.0, 1.0, 0.0));
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_newer_request_wins() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (gate_tx, gate_rx) = mpsc::channel();

        let inner = MemoryPointSource::new();
        inner.insert("slow", ring(1.0));
        inner.insert("fast", ring(4.0));
        let source = GatedSource {
            inner,
            slow_path: PathBuf::from("slow"),
            entered: Mutex::new(entered_tx),
            gate: Mutex::new(gate_rx),
        };
        let pipeline = AssetPipeline::new(source, config()).unwrap();

        let slow = pipeline.spawn_load("slow");
        entered_rx.recv_timeout(Duration::from_secs(10)).expect("slow load never started");

        let fast = pipeline.load_asset("fast").await.unwrap();
        assert!(matches!(fast, LoadOutcome::Published(_)));

        gate_tx.send(()).unwrap();
        let slow = slow.await.unwrap().unwrap();
        assert_eq!(slow, LoadOutcome::Superseded { ticket: 1 });

        assert_eq!(pipeline.slot().current_ticket(), 2);
        let frame = pipeline.resolver().get_slice(0.0).unwrap().to_cells();
        assert_eq!(frame, vec![(4, 0)]);
    }

    #[test]
    fn test_build_now_empty() {
        let pipeline = AssetPipeline::new(MemoryPointSource::new(), config()).unwrap();
        let outcome = pipeline.build_now(&[]).unwrap();
        assert_eq!(outcome, LoadOutcome::Published(BuildReport::default()));
        assert_eq!(pipeline.current().bin_count(), 4);
    }

    #[test]
    fn test_load_file_blocking() {
        let dir = tempfile::TempDir::new().expect("failed to create temp dir");
        let path = dir.path().join("cloud.xyz");
        std::fs::write(&path, "1 0 0\n-1 0 0\n0 1 0\n0 -1 0\nnan 0 0\n").unwrap();

        let pipeline = AssetPipeline::new(FilePointSource, config()).unwrap();
        let LoadOutcome::Published(report) = pipeline.load_asset_blocking(&path).unwrap() else {
            panic!("expected publish");
        };
        assert_eq!(report.rejected(), 1);
        assert_eq!(report.occupied_bins, 4);
    }

    #[test]
    fn test_readers_see_whole_grids() {
        let pipeline = AssetPipeline::new(MemoryPointSource::new(), config()).unwrap();
        let small = ring(1.0);
        let large: Vec<Point3D> = (0..64)
            .map(|i| {
                let t = i as f32 / 64.0 * std::f32::consts::TAU;
                Point3D::new(t.cos() * 5.5, t.sin() * 5.5, i as f32)
            })
            .collect();
        pipeline.build_now(&small).unwrap();
        let small_count = pipeline.current().voxel_count();
        let large_count = crate::voxel::build(&large, &config()).unwrap().0.voxel_count();

        std::thread::scope(|scope| {
            for _ in 0..3 {
                scope.spawn(|| {
                    for _ in 0..500 {
                        let resolver = pipeline.resolver();
                        let mut total = 0;
                        let mut rings = Vec::new();
                        for bin in 0..4 {
                            let frame = resolver.get_slice(bin as f64 * 90.0 + 1.0).unwrap();
                            total += frame.len();
                            rings.extend(frame.cells().map(|(ir, _)| ir));
                        }
                        // Every frame from one snapshot belongs to the same grid
                        if total == small_count {
                            assert!(rings.iter().all(|&ir| ir == 1));
                        } else {
                            assert_eq!(total, large_count);
                            assert!(rings.iter().all(|&ir| ir == 5));
                        }
                    }
                });
            }

            scope.spawn(|| {
                for i in 0..200 {
                    let points = if i % 2 == 0 { &large } else { &small };
                    pipeline.build_now(points).unwrap();
                }
            });
        });
    }
}
