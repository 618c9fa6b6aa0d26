//! Asynchronous copy of cascade 0's displacement into a host snapshot.
//!
//! The worker thread receives copy jobs over a channel and answers each on
//! its own completion channel. Completed snapshots replace the current one
//! wholesale, so readers always see a complete frame (old or new).

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use glam::{Vec2, Vec3};
use parking_lot::RwLock;

use crate::error::ReadbackError;
use crate::grid::Grid;

/// Fixed-point iterations used to invert horizontal displacement
pub const HEIGHT_ITERATIONS: usize = 3;

/// Host copy of one displacement grid plus the length scale it tiles over.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementSnapshot {
    grid: Grid<Vec3>,
    length_scale_m: f32,
}

impl DisplacementSnapshot {
    /// Flat water; used until the first copy completes
    pub fn zeroed(size: usize, length_scale_m: f32) -> Self {
        Self {
            grid: Grid::new(size),
            length_scale_m,
        }
    }

    pub fn new(grid: Grid<Vec3>, length_scale_m: f32) -> Self {
        Self {
            grid,
            length_scale_m,
        }
    }

    pub fn grid(&self) -> &Grid<Vec3> {
        &self.grid
    }

    pub fn length_scale_m(&self) -> f32 {
        self.length_scale_m
    }

    /// Displacement under world position `pos`, tiled every `length_scale_m`
    pub fn displacement(&self, pos: Vec3) -> Vec3 {
        let uv = Vec2::new(pos.x, pos.z) / self.length_scale_m;
        self.grid.sample_bilinear(uv)
    }

    /// Water height at `pos`.
    ///
    /// The grid is indexed by undisplaced position, so the displacement at
    /// `pos` belongs to a different surface point. Iterating
    /// `d = D(pos - d)` from zero walks back to the point that lands on `pos`.
    pub fn height(&self, pos: Vec3) -> f32 {
        let mut d = Vec3::ZERO;
        for _ in 0..HEIGHT_ITERATIONS {
            d = self.displacement(pos - d);
        }
        d.y
    }
}

/// Shared slot holding the latest complete snapshot.
#[derive(Debug)]
pub struct PhysicsReadback {
    current: RwLock<Arc<DisplacementSnapshot>>,
}

impl PhysicsReadback {
    pub fn new(initial: DisplacementSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// Current snapshot; the lock is held only for the pointer clone
    pub fn load(&self) -> Arc<DisplacementSnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn store(&self, snapshot: DisplacementSnapshot) {
        *self.current.write() = Arc::new(snapshot);
    }

    /// Swap in a successful copy. Failures are logged and the stale
    /// snapshot stays. Returns whether the snapshot changed.
    pub fn apply(&self, result: Result<DisplacementSnapshot, ReadbackError>) -> bool {
        match result {
            Ok(snapshot) => {
                self.store(snapshot);
                true
            }
            Err(ReadbackError::Abandoned) => {
                log::debug!("Readback abandoned; keeping previous snapshot");
                false
            }
            Err(e) => {
                log::error!("Readback failed: {e}; keeping previous snapshot");
                false
            }
        }
    }
}

/// Cloneable, thread-safe handle for water queries.
#[derive(Debug, Clone)]
pub struct WaterSampler {
    readback: Arc<PhysicsReadback>,
}

impl WaterSampler {
    pub fn new(readback: Arc<PhysicsReadback>) -> Self {
        Self { readback }
    }

    pub fn snapshot(&self) -> Arc<DisplacementSnapshot> {
        self.readback.load()
    }

    pub fn displacement(&self, pos: Vec3) -> Vec3 {
        self.readback.load().displacement(pos)
    }

    /// Both iterations read the same snapshot even if a swap lands mid-query
    pub fn height(&self, pos: Vec3) -> f32 {
        self.readback.load().height(pos)
    }
}

/// Validate and copy a displacement grid
pub fn copy_displacement(
    source: &Grid<Vec3>,
    expected_size: usize,
    length_scale_m: f32,
) -> Result<DisplacementSnapshot, ReadbackError> {
    if source.size() != expected_size {
        return Err(ReadbackError::SizeMismatch {
            expected: expected_size * expected_size,
            actual: source.len(),
        });
    }
    if !source.iter().all(|v| v.is_finite()) {
        return Err(ReadbackError::NonFinite);
    }
    Ok(DisplacementSnapshot::new(source.clone(), length_scale_m))
}

type CopyResult = Result<DisplacementSnapshot, ReadbackError>;

struct CopyJob {
    source: Arc<Grid<Vec3>>,
    expected_size: usize,
    length_scale_m: f32,
    cancelled: Arc<AtomicBool>,
    reply: Sender<CopyResult>,
}

/// Handle to one in-flight copy.
#[derive(Debug)]
pub struct ReadbackRequest {
    receiver: Receiver<CopyResult>,
    cancelled: Arc<AtomicBool>,
}

impl ReadbackRequest {
    /// Non-blocking check. `None` while the copy is still running.
    ///
    /// A cancelled request always reports [`ReadbackError::Abandoned`], even
    /// if the worker finished the copy first.
    pub fn poll(&self) -> Option<CopyResult> {
        if self.is_cancelled() {
            return Some(Err(ReadbackError::Abandoned));
        }
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(self.dropped())),
        }
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Option<CopyResult> {
        if self.is_cancelled() {
            return Some(Err(ReadbackError::Abandoned));
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(self.dropped())),
        }
    }

    /// Ask the worker to skip or discard this copy
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn dropped(&self) -> ReadbackError {
        if self.is_cancelled() {
            ReadbackError::Abandoned
        } else {
            ReadbackError::Disconnected
        }
    }
}

/// Background thread performing displacement copies.
pub struct ReadbackWorker {
    sender: Option<Sender<CopyJob>>,
    handle: Option<JoinHandle<()>>,
}

impl ReadbackWorker {
    pub fn spawn() -> io::Result<Self> {
        let (sender, receiver) = unbounded::<CopyJob>();
        let handle = std::thread::Builder::new()
            .name("ocean-readback".into())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    if job.cancelled.load(Ordering::Relaxed) {
                        continue;
                    }
                    let result = copy_displacement(&job.source, job.expected_size, job.length_scale_m);
                    // Dropping the source releases the frame for copy-on-write
                    drop(job.source);
                    if !job.cancelled.load(Ordering::Relaxed) {
                        let _ = job.reply.send(result);
                    }
                }
                log::debug!("Readback worker stopped");
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue a copy of `source`, expected to be `expected_size`² texels
    pub fn request(
        &self,
        source: Arc<Grid<Vec3>>,
        expected_size: usize,
        length_scale_m: f32,
    ) -> Result<ReadbackRequest, ReadbackError> {
        let sender = self.sender.as_ref().ok_or(ReadbackError::Disconnected)?;
        let (reply, receiver) = bounded(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let job = CopyJob {
            source,
            expected_size,
            length_scale_m,
            cancelled: Arc::clone(&cancelled),
            reply,
        };
        sender
            .send(job)
            .map_err(|_| ReadbackError::Disconnected)?;
        Ok(ReadbackRequest {
            receiver,
            cancelled,
        })
    }

    pub fn is_running(&self) -> bool {
        self.sender.is_some()
    }

    /// Stop accepting jobs, finish queued ones and join the thread
    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Readback worker panicked");
            }
        }
    }
}

impl Drop for ReadbackWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
