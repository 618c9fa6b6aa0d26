//! Ocean aggregator: owns the cascades, drives them per frame and serves
//! water queries from the latest readback.

use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use parking_lot::Mutex;

use super::SceneParameters;
use crate::cascade::Cascade;
use crate::error::{OceanError, Result};
use crate::executor::{KernelExecutor, RayonExecutor};
use crate::fft::Fft2d;
use crate::noise::{DirectoryCache, GaussianNoise};
use crate::params::{OceanConfig, WavesSettings};
use crate::readback::{DisplacementSnapshot, PhysicsReadback, ReadbackRequest, ReadbackWorker, WaterSampler};
use crate::spectrum::{bands_from_boundaries, cascade_bands, WaveBand};

/// Cascaded FFT ocean
pub struct Ocean<E: KernelExecutor = RayonExecutor> {
    config: OceanConfig,
    exec: E,
    bands: Vec<WaveBand>,
    cascades: Vec<Cascade>,
    readback: Arc<PhysicsReadback>,
    worker: ReadbackWorker,
    /// At most one copy in flight
    pending: Option<ReadbackRequest>,
    disposed: bool,
}

impl Ocean<RayonExecutor> {
    /// Build an ocean running on the rayon thread pool
    pub fn new(config: OceanConfig) -> Result<Self> {
        Self::with_executor(config, RayonExecutor)
    }
}

impl<E: KernelExecutor> Ocean<E> {
    /// Validate `config`, load or generate the noise field and compute the
    /// initial spectra.
    pub fn with_executor(config: OceanConfig, exec: E) -> Result<Self> {
        config.validate()?;
        let size = config.grid_size;
        let noise = match &config.noise_cache_dir {
            Some(dir) => GaussianNoise::load_or_generate(&DirectoryCache::new(dir), size, config.noise_seed),
            None => GaussianNoise::generate(size, config.noise_seed),
        };
        Self::with_noise(config, exec, noise)
    }

    /// Like [`Ocean::with_executor`] with a caller-supplied noise field
    pub fn with_noise(config: OceanConfig, exec: E, noise: GaussianNoise) -> Result<Self> {
        config.validate()?;
        let size = config.grid_size;
        let fft = Arc::new(Fft2d::new(size)?);
        let noise = Arc::new(noise);
        let cascades = config
            .length_scales_m
            .iter()
            .map(|_| Cascade::new(Arc::clone(&fft), Arc::clone(&noise)))
            .collect::<Result<Vec<_>>>()?;

        let bands = match &config.band_boundaries {
            Some(boundaries) => bands_from_boundaries(boundaries),
            None => cascade_bands(&config.length_scales_m, config.band_boundary_factor),
        };

        let readback = Arc::new(PhysicsReadback::new(DisplacementSnapshot::zeroed(
            size,
            config.length_scales_m[0],
        )));
        let worker = ReadbackWorker::spawn().map_err(OceanError::ReadbackWorker)?;

        let mut ocean = Self {
            config,
            exec,
            bands,
            cascades,
            readback,
            worker,
            pending: None,
            disposed: false,
        };
        ocean.initialise_cascades()?;

        log::info!(
            "Ocean ready: {}x{} grid, {} cascades, length scales {:?} m",
            size,
            size,
            ocean.cascades.len(),
            ocean.config.length_scales_m
        );
        for (i, band) in ocean.bands.iter().enumerate() {
            log::debug!("Cascade {i}: k in [{}, {}) rad/m", band.low, band.high);
        }
        Ok(ocean)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.disposed {
            Err(OceanError::OceanDisposed)
        } else {
            Ok(())
        }
    }

    /// Run `op` on every cascade through the executor; the first error wins
    fn for_each_cascade<F>(&mut self, op: F) -> Result<()>
    where
        F: Fn(&E, usize, &mut Cascade) -> Result<()> + Send + Sync,
    {
        let failure = Mutex::new(None);
        let exec = &self.exec;
        exec.dispatch_each(&mut self.cascades, |i, cascade| {
            if let Err(e) = op(exec, i, cascade) {
                failure.lock().get_or_insert(e);
            }
        });
        match failure.into_inner() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// (Re)compute every cascade's initial spectrum from the current settings
    pub fn initialise_cascades(&mut self) -> Result<()> {
        self.ensure_active()?;
        let waves = self.config.waves;
        let scales = self.config.length_scales_m.clone();
        let bands = self.bands.clone();
        self.for_each_cascade(|exec, i, cascade| {
            cascade.calculate_initials(exec, &waves, scales[i], bands[i])
        })
    }

    /// Replace the wave settings and rebuild the initial spectra
    pub fn set_waves(&mut self, waves: WavesSettings) -> Result<()> {
        self.ensure_active()?;
        waves.validate()?;
        self.config.waves = waves;
        self.initialise_cascades()
    }

    /// Advance the simulation to `time` seconds.
    ///
    /// A copy finished since the last frame is swapped in first, so queries
    /// lag the simulation by at least one frame.
    pub fn update(&mut self, time: f32) -> Result<()> {
        self.ensure_active()?;
        self.poll_readback();

        if self.config.always_recalculate_initials {
            self.initialise_cascades()?;
        }
        self.for_each_cascade(|exec, _, cascade| cascade.calculate_waves_at_time(exec, time))?;

        if self.pending.is_none() {
            self.request_readback()?;
        }
        log::debug!("Ocean frame t={time:.3}s");
        Ok(())
    }

    fn poll_readback(&mut self) {
        let Some(request) = &self.pending else {
            return;
        };
        if let Some(result) = request.poll() {
            self.pending = None;
            self.readback.apply(result);
        }
    }

    fn request_readback(&mut self) -> Result<()> {
        let source = self.cascades[0].displacement_handle()?;
        match self
            .worker
            .request(source, self.config.grid_size, self.config.length_scales_m[0])
        {
            Ok(request) => self.pending = Some(request),
            Err(e) => log::error!("Could not queue displacement readback: {e}"),
        }
        Ok(())
    }

    /// Block until the in-flight copy lands (or `timeout` passes) and swap
    /// it in. Returns whether the snapshot changed.
    pub fn sync_readback(&mut self, timeout: Duration) -> bool {
        let Some(request) = self.pending.take() else {
            return false;
        };
        match request.wait_timeout(timeout) {
            Some(result) => self.readback.apply(result),
            None => {
                self.pending = Some(request);
                false
            }
        }
    }

    /// Displacement sampled under `pos`, tiled by cascade 0's length scale
    pub fn water_displacement(&self, pos: Vec3) -> Vec3 {
        self.readback.load().displacement(pos)
    }

    /// Height of the displaced surface at `pos` (y ignored)
    pub fn water_height(&self, pos: Vec3) -> f32 {
        self.readback.load().height(pos)
    }

    /// Query handle usable from other threads
    pub fn sampler(&self) -> WaterSampler {
        WaterSampler::new(Arc::clone(&self.readback))
    }

    pub fn scene_parameters(&self) -> SceneParameters {
        SceneParameters {
            length_scales_m: self.config.length_scales_m.clone(),
            lambda: self.config.waves.lambda,
        }
    }

    pub fn cascades(&self) -> &[Cascade] {
        &self.cascades
    }

    pub fn bands(&self) -> &[WaveBand] {
        &self.bands
    }

    pub fn config(&self) -> &OceanConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.exec
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Abandon the in-flight copy, stop the worker and release every cascade
    pub fn dispose(&mut self) {
        if self.disposed {
            log::warn!("Ocean disposed twice");
            return;
        }
        if let Some(request) = self.pending.take() {
            request.cancel();
        }
        self.worker.shutdown();
        for cascade in &mut self.cascades {
            cascade.dispose();
        }
        self.disposed = true;
        log::info!("Ocean disposed");
    }
}

impl<E: KernelExecutor> Drop for Ocean<E> {
    fn drop(&mut self) {
        if !self.disposed {
            self.dispose();
        }
    }
}
