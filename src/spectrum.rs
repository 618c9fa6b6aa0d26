//! Initial (time-zero) wave spectrum.
//!
//! The one-dimensional JONSWAP spectrum (with the TMA finite-depth
//! correction) is combined with a directional spreading function and scaled
//! by a complex Gaussian sample per wavevector. Grid texel `(x, y)` holds the
//! wavevector `((x - N/2)·Δk, (y - N/2)·Δk)`, `Δk = 2π / L`; grid `y` is
//! world `z`.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::executor::KernelExecutor;
use crate::grid::{Complex32, Grid};
use crate::noise::GaussianNoise;
use crate::params::{SpectrumSettings, WavesSettings};

/// Wavevectors shorter than this are treated as the zero (DC) wavevector
const MIN_WAVENUMBER: f32 = 1e-6;

/// Per-wavevector data consumed by the evolution stage
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct WaveData {
    pub k_x: f32,
    /// 1/|k|, or 1 where the texel carries no energy
    pub inv_k: f32,
    pub k_z: f32,
    /// Angular frequency ω(|k|) in rad/s, 0 outside the band
    pub omega: f32,
}

/// `h0(k)` packed with `conj(h0(-k))`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpectrumTexel {
    pub h0: Complex32,
    pub h0_minus_k_conj: Complex32,
}

/// Initial spectrum of one cascade
#[derive(Debug, Clone, PartialEq)]
pub struct InitialSpectrum {
    pub spectrum: Grid<SpectrumTexel>,
    pub waves: Grid<WaveData>,
}

impl InitialSpectrum {
    pub fn size(&self) -> usize {
        self.spectrum.size()
    }
}

/// Half-open wavenumber interval `[low, high)` in rad/m
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveBand {
    pub low: f32,
    pub high: f32,
}

impl WaveBand {
    /// Every wavenumber
    pub const ALL: WaveBand = WaveBand {
        low: 0.0,
        high: f32::INFINITY,
    };

    pub fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    #[inline]
    pub fn contains(&self, k: f32) -> bool {
        k >= self.low && k < self.high
    }
}

/// Bands for cascades with the given length scales (largest first).
///
/// The boundary below cascade `i` is `2π / L_i × factor`. The first band
/// starts at 0 and the last one is unbounded, so together they cover every
/// wavenumber exactly once.
pub fn cascade_bands(length_scales_m: &[f32], factor: f32) -> Vec<WaveBand> {
    let boundaries: Vec<f32> = length_scales_m
        .iter()
        .skip(1)
        .map(|l| 2.0 * PI / l * factor)
        .collect();
    bands_from_boundaries(&boundaries)
}

/// Split `[0, ∞)` at the given increasing boundaries
pub fn bands_from_boundaries(boundaries: &[f32]) -> Vec<WaveBand> {
    let mut edges = Vec::with_capacity(boundaries.len() + 2);
    edges.push(0.0);
    edges.extend_from_slice(boundaries);
    edges.push(f32::INFINITY);
    edges.windows(2).map(|w| WaveBand::new(w[0], w[1])).collect()
}

/// Spectrum settings resolved into JONSWAP model constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JonswapParameters {
    pub scale: f32,
    /// Mean wave direction (radians)
    pub angle: f32,
    pub spread_blend: f32,
    pub swell: f32,
    /// Phillips constant α
    pub alpha: f32,
    /// Peak angular frequency ω_p (rad/s)
    pub peak_omega: f32,
    /// Peak enhancement γ
    pub gamma: f32,
    pub short_waves_fade: f32,
}

impl JonswapParameters {
    pub fn new(settings: &SpectrumSettings, gravity: f32) -> Self {
        let u = settings.wind_speed_m_per_s;
        let fetch = settings.fetch_m;
        Self {
            scale: settings.scale,
            angle: settings.wind_direction_deg.to_radians(),
            spread_blend: settings.spread_blend,
            swell: settings.swell.clamp(0.01, 1.0),
            alpha: 0.076 * (gravity * fetch / (u * u)).powf(-0.22),
            peak_omega: 22.0 * (u * fetch / (gravity * gravity)).powf(-0.33),
            gamma: settings.peak_enhancement,
            short_waves_fade: settings.short_waves_fade,
        }
    }
}

/// Dispersion relation with finite depth: ω = sqrt(g·k·tanh(k·h))
pub fn frequency(k: f32, gravity: f32, depth: f32) -> f32 {
    (gravity * k * (k * depth).min(20.0).tanh()).sqrt()
}

/// dω/dk of [`frequency`]
pub fn frequency_derivative(k: f32, gravity: f32, depth: f32) -> f32 {
    let th = (k * depth).min(20.0).tanh();
    let ch = (k * depth).cosh();
    gravity * (depth * k / ch / ch + th) / frequency(k, gravity, depth) / 2.0
}

/// TMA shallow-water attenuation of the deep-water spectrum
pub fn tma_correction(omega: f32, gravity: f32, depth: f32) -> f32 {
    let omega_h = omega * (depth / gravity).sqrt();
    if omega_h <= 1.0 {
        0.5 * omega_h * omega_h
    } else if omega_h < 2.0 {
        1.0 - 0.5 * (2.0 - omega_h) * (2.0 - omega_h)
    } else {
        1.0
    }
}

/// JONSWAP energy density S(ω)
pub fn jonswap(omega: f32, gravity: f32, depth: f32, p: &JonswapParameters) -> f32 {
    let sigma = if omega <= p.peak_omega { 0.07 } else { 0.09 };
    let d = omega - p.peak_omega;
    let r = (-d * d / 2.0 / (sigma * sigma) / (p.peak_omega * p.peak_omega)).exp();

    let one_over_omega = 1.0 / omega;
    let peak_over_omega = p.peak_omega / omega;
    p.scale
        * tma_correction(omega, gravity, depth)
        * p.alpha
        * gravity
        * gravity
        * one_over_omega.powi(5)
        * (-1.25 * peak_over_omega.powi(4)).exp()
        * p.gamma.abs().powf(r)
}

/// Normalisation of the cosine-2s spreading function (quartic fit)
pub fn normalisation_factor(s: f32) -> f32 {
    let s2 = s * s;
    let s3 = s2 * s;
    let s4 = s3 * s;
    if s < 5.0 {
        -0.000564 * s4 + 0.00776 * s3 - 0.044 * s2 + 0.192 * s + 0.163
    } else {
        -4.80e-08 * s4 + 1.07e-05 * s3 - 9.53e-04 * s2 + 5.90e-02 * s + 3.93e-01
    }
}

pub fn cosine_2s(theta: f32, s: f32) -> f32 {
    normalisation_factor(s) * (0.5 * theta).cos().abs().powf(2.0 * s)
}

/// Frequency-dependent spreading exponent (Mitsuyasu)
pub fn spread_power(omega: f32, peak_omega: f32) -> f32 {
    if omega > peak_omega {
        9.77 * (omega / peak_omega).abs().powf(-2.5)
    } else {
        6.97 * (omega / peak_omega).abs().powf(5.0)
    }
}

/// Directional spreading D(θ, ω)
pub fn direction_spectrum(theta: f32, omega: f32, p: &JonswapParameters) -> f32 {
    let s = spread_power(omega, p.peak_omega)
        + 16.0 * (omega / p.peak_omega).min(20.0).tanh() * p.swell * p.swell;
    let isotropic = 2.0 / PI * theta.cos() * theta.cos();
    isotropic + (cosine_2s(theta - p.angle, s) - isotropic) * p.spread_blend
}

pub fn short_waves_fade(k: f32, p: &JonswapParameters) -> f32 {
    (-p.short_waves_fade * p.short_waves_fade * k * k).exp()
}

/// Wavevector of texel (x, y)
#[inline]
pub fn wavevector(x: usize, y: usize, size: usize, delta_k: f32) -> Vec2 {
    let half = (size / 2) as f32;
    Vec2::new(x as f32 - half, y as f32 - half) * delta_k
}

/// Builds the initial spectrum of one cascade.
pub fn generate_initial_spectrum<E: KernelExecutor>(
    exec: &E,
    settings: &WavesSettings,
    length_scale_m: f32,
    band: WaveBand,
    noise: &GaussianNoise,
) -> InitialSpectrum {
    let size = noise.size();
    let delta_k = 2.0 * PI / length_scale_m;
    let g = settings.gravity_m_per_s2;
    let depth = settings.depth_m;

    // Disabled spectra may carry zero wind or fetch; they contribute nothing
    let spectra: Vec<JonswapParameters> = [&settings.local, &settings.swell]
        .into_iter()
        .filter(|s| s.is_enabled())
        .map(|s| JonswapParameters::new(s, g))
        .collect();

    // Wave data: wavevector, 1/|k| and ω for in-band texels
    let mut waves = Grid::<WaveData>::new(size);
    exec.dispatch_rows(waves.as_mut_slice(), size, |y, row| {
        for (x, wave) in row.iter_mut().enumerate() {
            let k = wavevector(x, y, size, delta_k);
            let k_len = k.length();
            *wave = if k_len >= MIN_WAVENUMBER && band.contains(k_len) {
                WaveData {
                    k_x: k.x,
                    inv_k: 1.0 / k_len,
                    k_z: k.y,
                    omega: frequency(k_len, g, depth),
                }
            } else {
                WaveData {
                    k_x: k.x,
                    inv_k: 1.0,
                    k_z: k.y,
                    omega: 0.0,
                }
            };
        }
    });

    // h0(k) = ξ · sqrt(2·S(ω)·D(θ,ω)·|dω/dk| / k · Δk²)
    let mut h0k = Grid::<Complex32>::new(size);
    exec.dispatch_rows(h0k.as_mut_slice(), size, |y, row| {
        for (x, h) in row.iter_mut().enumerate() {
            let wave = waves.get(x, y);
            if wave.omega == 0.0 {
                *h = Complex32::new(0.0, 0.0);
                continue;
            }
            let k_len = 1.0 / wave.inv_k;
            let theta = wave.k_z.atan2(wave.k_x);
            let omega = wave.omega;
            let density: f32 = spectra
                .iter()
                .map(|p| {
                    jonswap(omega, g, depth, p)
                        * direction_spectrum(theta, omega, p)
                        * short_waves_fade(k_len, p)
                })
                .sum();
            let d_omega_dk = frequency_derivative(k_len, g, depth);
            let amplitude =
                (2.0 * density * d_omega_dk.abs() / k_len * delta_k * delta_k).sqrt();
            let [re, im] = noise.get(x, y);
            *h = Complex32::new(re, im) * amplitude;
        }
    });

    // Pack h0(k) with conj(h0(-k)) so the evolved field stays Hermitian
    let mut spectrum = Grid::<SpectrumTexel>::new(size);
    exec.dispatch_rows(spectrum.as_mut_slice(), size, |y, row| {
        for (x, texel) in row.iter_mut().enumerate() {
            let minus_k = h0k.get((size - x) % size, (size - y) % size);
            *texel = SpectrumTexel {
                h0: *h0k.get(x, y),
                h0_minus_k_conj: minus_k.conj(),
            };
        }
    });

    InitialSpectrum { spectrum, waves }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{RayonExecutor, SerialExecutor};

    fn test_settings(wind_speed: f32) -> WavesSettings {
        let mut settings = WavesSettings::default();
        settings.local.wind_speed_m_per_s = wind_speed;
        settings
    }

    #[test]
    fn test_dc_is_zero_for_all_settings() {
        let noise = GaussianNoise::generate(32, 9);
        for wind in [2.0, 10.0, 30.0] {
            for band in [WaveBand::ALL, WaveBand::new(0.0, 1.0)] {
                let initial = generate_initial_spectrum(
                    &SerialExecutor,
                    &test_settings(wind),
                    100.0,
                    band,
                    &noise,
                );
                let dc = initial.spectrum.get(16, 16);
                assert_eq!(dc.h0, Complex32::new(0.0, 0.0));
                assert_eq!(dc.h0_minus_k_conj, Complex32::new(0.0, 0.0));
                assert_eq!(initial.waves.get(16, 16).omega, 0.0);
            }
        }
    }

    #[test]
    fn test_band_limits_energy() {
        let noise = GaussianNoise::generate(32, 9);
        let band = WaveBand::new(0.2, 0.6);
        let initial =
            generate_initial_spectrum(&RayonExecutor, &test_settings(10.0), 100.0, band, &noise);
        let delta_k = 2.0 * PI / 100.0;

        let mut nonzero = 0;
        for y in 0..32 {
            for x in 0..32 {
                let k = wavevector(x, y, 32, delta_k).length();
                let h0 = initial.spectrum.get(x, y).h0;
                if !band.contains(k) {
                    assert_eq!(h0, Complex32::new(0.0, 0.0), "texel ({x}, {y}) k={k}");
                } else if h0.norm() > 0.0 {
                    nonzero += 1;
                }
            }
        }
        assert!(nonzero > 0);
    }

    #[test]
    fn test_conjugate_packing() {
        let noise = GaussianNoise::generate(16, 4);
        let initial = generate_initial_spectrum(
            &SerialExecutor,
            &WavesSettings::default(),
            50.0,
            WaveBand::ALL,
            &noise,
        );
        for (x, y) in [(3, 5), (0, 7), (15, 0), (8, 9)] {
            let texel = initial.spectrum.get(x, y);
            let mirror = initial.spectrum.get((16 - x) % 16, (16 - y) % 16);
            assert_eq!(texel.h0_minus_k_conj, mirror.h0.conj());
        }
    }

    #[test]
    fn test_generation_is_deterministic_and_finite() {
        let noise = GaussianNoise::generate(32, 2);
        let settings = WavesSettings::default();
        let a = generate_initial_spectrum(&SerialExecutor, &settings, 250.0, WaveBand::ALL, &noise);
        let b = generate_initial_spectrum(&RayonExecutor, &settings, 250.0, WaveBand::ALL, &noise);
        assert_eq!(a, b);
        assert!(a
            .spectrum
            .iter()
            .all(|t| t.h0.re.is_finite() && t.h0.im.is_finite()));
    }

    #[test]
    fn test_disabled_local_sea_with_zero_wind_stays_finite() {
        let noise = GaussianNoise::generate(32, 4);
        let mut settings = WavesSettings::default();
        settings.local = SpectrumSettings {
            scale: 0.0,
            wind_speed_m_per_s: 0.0,
            ..SpectrumSettings::wind_sea()
        };
        assert!(settings.validate().is_ok());

        let swell_only = generate_initial_spectrum(&SerialExecutor, &settings, 100.0, WaveBand::ALL, &noise);
        let h0 = |t: &SpectrumTexel| [t.h0.re, t.h0.im, t.h0_minus_k_conj.re, t.h0_minus_k_conj.im];
        assert!(swell_only.spectrum.iter().flat_map(h0).all(f32::is_finite));
        assert!(swell_only.spectrum.iter().any(|t| t.h0.norm() > 0.0));

        settings.swell = SpectrumSettings::disabled();
        let calm = generate_initial_spectrum(&SerialExecutor, &settings, 100.0, WaveBand::ALL, &noise);
        assert!(calm.spectrum.iter().all(|t| *t == SpectrumTexel::default()));
    }

    #[test]
    fn test_cascade_bands_partition_wavenumbers() {
        let bands = cascade_bands(&[250.0, 17.0, 5.0], 6.0);
        assert_eq!(bands.len(), 3);
        assert_eq!(bands[0].low, 0.0);
        assert!((bands[0].high - 2.0 * PI / 17.0 * 6.0).abs() < 1e-5);
        assert_eq!(bands[1].high, bands[2].low);
        assert!(bands[2].high.is_infinite());

        let mut k = 0.0f32;
        while k < 100.0 {
            let hits = bands.iter().filter(|b| b.contains(k)).count();
            assert_eq!(hits, 1, "k = {k}");
            k += 0.013;
        }
        for b in &bands[1..] {
            let hits = bands.iter().filter(|band| band.contains(b.low)).count();
            assert_eq!(hits, 1, "boundary {}", b.low);
        }
    }

    #[test]
    fn test_single_cascade_band_is_everything() {
        assert_eq!(cascade_bands(&[100.0], 6.0), vec![WaveBand::ALL]);
    }

    #[test]
    fn test_dispersion_deep_and_shallow() {
        let k = 0.5;
        let deep = frequency(k, 9.81, 1000.0);
        assert!((deep - (9.81f32 * k).sqrt()).abs() < 1e-5);

        let shallow = frequency(k, 9.81, 1.0);
        assert!(shallow < deep);

        // Numerical derivative agrees with the closed form
        let h = 1e-3;
        let numeric = (frequency(k + h, 9.81, 3.0) - frequency(k - h, 9.81, 3.0)) / (2.0 * h);
        assert!((numeric - frequency_derivative(k, 9.81, 3.0)).abs() < 1e-3);
    }

    #[test]
    fn test_tma_correction_ranges() {
        assert_eq!(tma_correction(100.0, 9.81, 500.0), 1.0);
        assert!(tma_correction(0.01, 9.81, 1.0) < 0.01);
    }

    #[test]
    fn test_jonswap_peaks_near_peak_frequency() {
        let params = JonswapParameters::new(&SpectrumSettings::wind_sea(), 9.81);
        let at_peak = jonswap(params.peak_omega, 9.81, 500.0, &params);
        assert!(at_peak > jonswap(params.peak_omega * 0.5, 9.81, 500.0, &params));
        assert!(at_peak > jonswap(params.peak_omega * 2.0, 9.81, 500.0, &params));
    }
}
