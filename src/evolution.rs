//! Time evolution of the initial spectrum.
//!
//! Every displacement and derivative channel the surface needs is a real
//! field, so two of them share one complex grid (`A + iB`) and one inverse
//! FFT recovers both: the real part is `A`, the imaginary part is `B`.

use crate::error::{OceanError, Result};
use crate::executor::KernelExecutor;
use crate::grid::{Complex32, Grid};
use crate::spectrum::{InitialSpectrum, SpectrumTexel, WaveData};

/// Frequency-domain components of one texel at time t
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvolvedTexel {
    /// Vertical displacement h(k, t)
    pub dy: Complex32,
    pub dx: Complex32,
    pub dz: Complex32,
    pub dx_dx: Complex32,
    pub dy_dx: Complex32,
    pub dz_dx: Complex32,
    pub dy_dz: Complex32,
    pub dz_dz: Complex32,
}

impl EvolvedTexel {
    /// Rotate the packed initial amplitudes to time `t` and derive all channels.
    ///
    /// Outside the band `inv_k` is 1 and both amplitudes are zero, so the
    /// zero wavevector yields zero everywhere.
    #[inline]
    pub fn at_time(texel: &SpectrumTexel, wave: &WaveData, time: f32) -> Self {
        let exponent = Complex32::from_polar(1.0, wave.omega * time);
        let h = texel.h0 * exponent + texel.h0_minus_k_conj * exponent.conj();
        let ih = Complex32::new(-h.im, h.re);

        Self {
            dy: h,
            dx: ih * wave.k_x * wave.inv_k,
            dz: ih * wave.k_z * wave.inv_k,
            dx_dx: -h * wave.k_x * wave.k_x * wave.inv_k,
            dy_dx: ih * wave.k_x,
            dz_dx: -h * wave.k_x * wave.k_z * wave.inv_k,
            dy_dz: ih * wave.k_z,
            dz_dz: -h * wave.k_z * wave.k_z * wave.inv_k,
        }
    }
}

/// `a + i·b` for two spectra of real fields
#[inline]
fn pack(a: Complex32, b: Complex32) -> Complex32 {
    Complex32::new(a.re - b.im, a.im + b.re)
}

/// Packed spectra for one frame
#[derive(Debug, Clone)]
pub struct EvolvedSpectrum {
    /// Dx + i·Dz
    pub dx_dz: Grid<Complex32>,
    /// Dy + i·Dxz
    pub dy_dxz: Grid<Complex32>,
    /// Dyx + i·Dyz (surface slopes)
    pub dyx_dyz: Grid<Complex32>,
    /// Dxx + i·Dzz
    pub dxx_dzz: Grid<Complex32>,
}

impl EvolvedSpectrum {
    pub fn new(size: usize) -> Self {
        Self {
            dx_dz: Grid::new(size),
            dy_dxz: Grid::new(size),
            dyx_dyz: Grid::new(size),
            dxx_dzz: Grid::new(size),
        }
    }

    pub fn size(&self) -> usize {
        self.dx_dz.size()
    }

    pub fn grids_mut(&mut self) -> [&mut Grid<Complex32>; 4] {
        [
            &mut self.dx_dz,
            &mut self.dy_dxz,
            &mut self.dyx_dyz,
            &mut self.dxx_dzz,
        ]
    }
}

/// Fill `out` with the spectrum at `time`; `out` must match the spectrum size
pub fn evolve<E: KernelExecutor>(
    exec: &E,
    initial: &InitialSpectrum,
    time: f32,
    out: &mut EvolvedSpectrum,
) -> Result<()> {
    let size = initial.size();
    if out.size() != size {
        return Err(OceanError::GridSizeMismatch {
            expected: size,
            actual: out.size(),
        });
    }

    // One dispatch per packed grid; each recomputes the cheap rotation
    // rather than staging all eight channels.
    let channels: [fn(&EvolvedTexel) -> Complex32; 4] = [
        |e| pack(e.dx, e.dz),
        |e| pack(e.dy, e.dz_dx),
        |e| pack(e.dy_dx, e.dy_dz),
        |e| pack(e.dx_dx, e.dz_dz),
    ];
    for (grid, channel) in out.grids_mut().into_iter().zip(channels) {
        exec.dispatch_rows(grid.as_mut_slice(), size, |y, row| {
            let spectrum = initial.spectrum.row(y);
            let waves = initial.waves.row(y);
            for ((value, texel), wave) in row.iter_mut().zip(spectrum).zip(waves) {
                *value = channel(&EvolvedTexel::at_time(texel, wave, time));
            }
        });
    }
    Ok(())
}
