//! One spatial scale of the ocean: spectrum → evolution → inverse FFT → merge.

use std::sync::Arc;

use glam::{Vec3, Vec4};

use crate::error::{OceanError, Result};
use crate::evolution::{evolve, EvolvedSpectrum};
use crate::executor::KernelExecutor;
use crate::fft::{Fft2d, InverseOptions};
use crate::grid::{Complex32, Grid};
use crate::noise::GaussianNoise;
use crate::params::WavesSettings;
use crate::spectrum::{generate_initial_spectrum, InitialSpectrum, WaveBand};

/// Surface area distortion; below 1 the surface folds (whitecaps)
#[inline]
pub fn jacobian(lambda: f32, dxx: f32, dzz: f32, dxz: f32) -> f32 {
    (1.0 + lambda * dxx) * (1.0 + lambda * dzz) - lambda * lambda * dxz * dxz
}

/// Time-integrated foam: grows every step and is capped by the current
/// Jacobian, so it drops as soon as the surface folds and recovers slowly.
#[inline]
pub fn accumulate_foam(previous: f32, jacobian: f32, dt: f32) -> f32 {
    let grown = previous + dt * 0.5 / jacobian.max(0.5);
    grown.min(jacobian)
}

/// Where a cascade sits in the spectrum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeParams {
    pub length_scale_m: f32,
    pub band: WaveBand,
    pub lambda: f32,
}

struct CascadeResources {
    initial: Option<InitialSpectrum>,
    params: Option<CascadeParams>,
    evolved: EvolvedSpectrum,
    scratch: Grid<Complex32>,
    displacement: Arc<Grid<Vec3>>,
    derivatives: Grid<Vec4>,
    turbulence: Grid<f32>,
    last_time: Option<f32>,
}

/// Spectrum, evolution buffers and output grids for one length scale
pub struct Cascade {
    size: usize,
    fft: Arc<Fft2d>,
    noise: Arc<GaussianNoise>,
    /// `None` once disposed
    resources: Option<Box<CascadeResources>>,
}

impl Cascade {
    /// Allocate a cascade sharing the FFT plan and noise field with its siblings
    pub fn new(fft: Arc<Fft2d>, noise: Arc<GaussianNoise>) -> Result<Self> {
        let size = fft.size();
        if noise.size() != size {
            return Err(OceanError::NoiseSizeMismatch {
                expected: size,
                actual: noise.size(),
            });
        }

        let resources = CascadeResources {
            initial: None,
            params: None,
            evolved: EvolvedSpectrum::new(size),
            scratch: Grid::new(size),
            displacement: Arc::new(Grid::new(size)),
            derivatives: Grid::new(size),
            turbulence: Grid::new(size),
            last_time: None,
        };
        Ok(Self {
            size,
            fft,
            noise,
            resources: Some(Box::new(resources)),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_disposed(&self) -> bool {
        self.resources.is_none()
    }

    fn resources(&self) -> Result<&CascadeResources> {
        self.resources.as_deref().ok_or(OceanError::CascadeDisposed)
    }

    fn resources_mut(&mut self) -> Result<&mut CascadeResources> {
        self.resources
            .as_deref_mut()
            .ok_or(OceanError::CascadeDisposed)
    }

    /// Compute and cache the initial spectrum.
    ///
    /// Deterministic for a given noise field, so calling it again with the
    /// same arguments reproduces the same spectrum.
    pub fn calculate_initials<E: KernelExecutor>(
        &mut self,
        exec: &E,
        settings: &WavesSettings,
        length_scale_m: f32,
        band: WaveBand,
    ) -> Result<()> {
        let noise = Arc::clone(&self.noise);
        let res = self.resources_mut()?;
        res.initial = Some(generate_initial_spectrum(
            exec,
            settings,
            length_scale_m,
            band,
            &noise,
        ));
        res.params = Some(CascadeParams {
            length_scale_m,
            band,
            lambda: settings.lambda,
        });
        log::debug!(
            "Cascade initials: L={length_scale_m}m band=[{}, {})",
            band.low,
            band.high
        );
        Ok(())
    }

    /// Evolve to `time` (seconds), transform, and refresh the output grids.
    ///
    /// Foam integrates over the time elapsed since the previous call.
    pub fn calculate_waves_at_time<E: KernelExecutor>(&mut self, exec: &E, time: f32) -> Result<()> {
        let fft = Arc::clone(&self.fft);
        let size = self.size;
        let CascadeResources {
            initial,
            params,
            evolved,
            scratch,
            displacement,
            derivatives,
            turbulence,
            last_time,
        } = self.resources_mut()?;
        let (Some(initial), Some(params)) = (initial.as_ref(), params.as_ref()) else {
            return Err(OceanError::InitialsMissing);
        };

        let dt = last_time.map_or(0.0, |previous| (time - previous).max(0.0));
        *last_time = Some(time);

        evolve(exec, initial, time, evolved)?;
        let options = InverseOptions {
            scale: false,
            permute: true,
        };
        for grid in evolved.grids_mut() {
            fft.inverse(exec, grid, scratch, options)?;
        }

        let lambda = params.lambda;
        let EvolvedSpectrum {
            dx_dz,
            dy_dxz,
            dyx_dyz,
            dxx_dzz,
        } = &*evolved;

        // Copy-on-write: an in-flight readback keeps the previous frame intact
        exec.dispatch_rows(Arc::make_mut(displacement).as_mut_slice(), size, |y, row| {
            for ((out, a), b) in row.iter_mut().zip(dx_dz.row(y)).zip(dy_dxz.row(y)) {
                *out = Vec3::new(lambda * a.re, b.re, lambda * a.im);
            }
        });

        exec.dispatch_rows(derivatives.as_mut_slice(), size, |y, row| {
            for ((out, slope), second) in row.iter_mut().zip(dyx_dyz.row(y)).zip(dxx_dzz.row(y)) {
                *out = Vec4::new(slope.re, slope.im, lambda * second.re, lambda * second.im);
            }
        });

        exec.dispatch_rows(turbulence.as_mut_slice(), size, |y, row| {
            for ((foam, dy), second) in row.iter_mut().zip(dy_dxz.row(y)).zip(dxx_dzz.row(y)) {
                let j = jacobian(lambda, second.re, second.im, dy.im);
                *foam = accumulate_foam(*foam, j, dt);
            }
        });

        Ok(())
    }

    /// Release every buffer. Later calls fail with [`OceanError::CascadeDisposed`].
    pub fn dispose(&mut self) {
        if self.resources.take().is_none() {
            log::warn!("Cascade disposed twice");
        }
    }

    pub fn params(&self) -> Result<Option<CascadeParams>> {
        Ok(self.resources()?.params)
    }

    /// Length scale of the current initial spectrum, in meters
    pub fn length_scale(&self) -> Result<Option<f32>> {
        Ok(self.params()?.map(|p| p.length_scale_m))
    }

    pub fn band(&self) -> Result<Option<WaveBand>> {
        Ok(self.params()?.map(|p| p.band))
    }

    pub fn initial_spectrum(&self) -> Result<Option<&InitialSpectrum>> {
        Ok(self.resources()?.initial.as_ref())
    }

    /// (λ·Dx, Dy, λ·Dz) per texel
    pub fn displacement(&self) -> Result<&Grid<Vec3>> {
        Ok(&self.resources()?.displacement)
    }

    /// Shared handle to the displacement grid, for asynchronous copies
    pub fn displacement_handle(&self) -> Result<Arc<Grid<Vec3>>> {
        Ok(Arc::clone(&self.resources()?.displacement))
    }

    /// (slope x, slope z, λ·Dxx, λ·Dzz) per texel
    pub fn derivatives(&self) -> Result<&Grid<Vec4>> {
        Ok(&self.resources()?.derivatives)
    }

    pub fn turbulence(&self) -> Result<&Grid<f32>> {
        Ok(&self.resources()?.turbulence)
    }
}
