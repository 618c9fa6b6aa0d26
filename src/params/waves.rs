//! Statistical wave model parameters.

use crate::error::{OceanError, Result};

/// One JONSWAP spectrum contribution (local wind sea or distant swell)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumSettings {
    /// Energy multiplier (dimensionless); 0 disables this spectrum
    pub scale: f32,

    /// Wind speed 10 m above the surface (m/s)
    pub wind_speed_m_per_s: f32,

    /// Direction the waves travel towards (degrees, 0 = +X, 90 = +Z)
    pub wind_direction_deg: f32,

    /// Distance the wind has blown over open water (meters)
    /// Longer fetch = lower peak frequency = longer waves
    pub fetch_m: f32,

    /// Blend between plain cos² spreading (0) and frequency-dependent
    /// cosine-2s spreading (1)
    pub spread_blend: f32,

    /// Extra directional focusing, clamped to 0.01..1
    pub swell: f32,

    /// JONSWAP peak enhancement γ (3.3 for a developing sea)
    pub peak_enhancement: f32,

    /// Damping length for short waves (meters)
    pub short_waves_fade: f32,
}

impl SpectrumSettings {
    /// Local wind sea: 10 m/s wind over 100 km of fetch
    pub fn wind_sea() -> Self {
        Self {
            scale: 1.0,
            wind_speed_m_per_s: 10.0,
            wind_direction_deg: 0.0,
            fetch_m: 100_000.0,
            spread_blend: 0.9,
            swell: 0.2,
            peak_enhancement: 3.3,
            short_waves_fade: 0.01,
        }
    }

    /// Long-period swell arriving from a distant storm
    pub fn distant_swell() -> Self {
        Self {
            scale: 0.5,
            wind_speed_m_per_s: 6.0,
            wind_direction_deg: 30.0,
            fetch_m: 300_000.0,
            spread_blend: 1.0,
            swell: 1.0,
            peak_enhancement: 3.3,
            short_waves_fade: 0.01,
        }
    }

    /// Same settings with `scale = 0`
    pub fn disabled() -> Self {
        Self {
            scale: 0.0,
            ..Self::distant_swell()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.scale > 0.0
    }

    fn validate(&self, name: &str) -> Result<()> {
        let fields = [
            self.scale,
            self.wind_speed_m_per_s,
            self.wind_direction_deg,
            self.fetch_m,
            self.spread_blend,
            self.swell,
            self.peak_enhancement,
            self.short_waves_fade,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(OceanError::InvalidWaveSettings(format!(
                "{name} spectrum has non-finite values"
            )));
        }
        if self.scale < 0.0 {
            return Err(OceanError::InvalidWaveSettings(format!(
                "{name} spectrum scale must be >= 0, got {}",
                self.scale
            )));
        }
        if self.is_enabled() && (self.wind_speed_m_per_s <= 0.0 || self.fetch_m <= 0.0) {
            return Err(OceanError::InvalidWaveSettings(format!(
                "{name} spectrum needs positive wind speed and fetch, got {} m/s over {} m",
                self.wind_speed_m_per_s, self.fetch_m
            )));
        }
        Ok(())
    }
}

/// Wave model shared read-only by every cascade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavesSettings {
    /// Gravitational acceleration (m/s²)
    pub gravity_m_per_s2: f32,

    /// Water depth (meters). Shallow depth slows and flattens waves.
    pub depth_m: f32,

    /// Choppiness λ: horizontal displacement multiplier (dimensionless)
    /// 0 = rolling sine-like swell, ~1 = sharp crests
    pub lambda: f32,

    /// Wind-driven sea
    pub local: SpectrumSettings,

    /// Second spectrum summed on top of the local sea
    pub swell: SpectrumSettings,
}

impl Default for WavesSettings {
    fn default() -> Self {
        Self {
            gravity_m_per_s2: 9.81,
            depth_m: 500.0,
            lambda: 1.0,
            local: SpectrumSettings::wind_sea(),
            swell: SpectrumSettings::distant_swell(),
        }
    }
}

impl WavesSettings {
    /// Reject settings that would produce NaN spectra
    pub fn validate(&self) -> Result<()> {
        if !(self.gravity_m_per_s2.is_finite() && self.gravity_m_per_s2 > 0.0) {
            return Err(OceanError::InvalidWaveSettings(format!(
                "gravity must be positive, got {}",
                self.gravity_m_per_s2
            )));
        }
        if !(self.depth_m.is_finite() && self.depth_m > 0.0) {
            return Err(OceanError::InvalidWaveSettings(format!(
                "depth must be positive, got {}",
                self.depth_m
            )));
        }
        if !self.lambda.is_finite() {
            return Err(OceanError::InvalidWaveSettings(
                "choppiness must be finite".to_string(),
            ));
        }
        self.local.validate("local")?;
        self.swell.validate("swell")
    }
}
