//! Ocean simulation configuration: grid, cascades, noise and wave model.

use std::path::PathBuf;

use super::waves::WavesSettings;
use crate::error::{OceanError, Result};

/// Top-level simulation configuration
#[derive(Debug, Clone)]
pub struct OceanConfig {
    /// Texels per side of every cascade grid (power of two)
    pub grid_size: usize,

    /// Meters spanned by each cascade's grid, largest first
    pub length_scales_m: Vec<f32>,

    /// Band boundary between cascade i-1 and i is `2π / L_i × factor`
    pub band_boundary_factor: f32,

    /// Explicit wavenumber boundaries (rad/m, one per adjacent cascade pair).
    /// Overrides the factor rule when set.
    pub band_boundaries: Option<Vec<f32>>,

    /// Spectrum model shared by all cascades
    pub waves: WavesSettings,

    /// Rebuild initial spectra every frame (for live settings changes)
    pub always_recalculate_initials: bool,

    /// Seed for the Gaussian noise field when it has to be generated
    pub noise_seed: u64,

    /// Directory used to persist the noise field between runs
    pub noise_cache_dir: Option<PathBuf>,
}

impl Default for OceanConfig {
    fn default() -> Self {
        Self {
            grid_size: 512,
            length_scales_m: vec![250.0, 17.0, 5.0],
            band_boundary_factor: 6.0,
            band_boundaries: None,
            waves: WavesSettings::default(),
            always_recalculate_initials: false,
            noise_seed: 0,
            noise_cache_dir: None,
        }
    }
}

impl OceanConfig {
    pub fn cascade_count(&self) -> usize {
        self.length_scales_m.len()
    }

    /// Fail fast on anything the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.grid_size < 2 || !self.grid_size.is_power_of_two() {
            return Err(OceanError::GridSizeNotPowerOfTwo(self.grid_size));
        }
        if self.length_scales_m.is_empty() {
            return Err(OceanError::NoLengthScales);
        }
        for (index, &value) in self.length_scales_m.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(OceanError::InvalidLengthScale { index, value });
            }
        }

        match &self.band_boundaries {
            Some(boundaries) => {
                let expected = self.cascade_count() - 1;
                if boundaries.len() != expected {
                    return Err(OceanError::CascadeCountMismatch {
                        expected,
                        actual: boundaries.len(),
                    });
                }
                let increasing = boundaries.iter().all(|b| b.is_finite() && *b > 0.0)
                    && boundaries.windows(2).all(|w| w[0] < w[1]);
                if !increasing {
                    return Err(OceanError::InvalidBandBoundaries(format!(
                        "boundaries must be positive and strictly increasing, got {boundaries:?}"
                    )));
                }
            }
            None => {
                if !(self.band_boundary_factor.is_finite() && self.band_boundary_factor > 0.0) {
                    return Err(OceanError::InvalidBandBoundaries(format!(
                        "band boundary factor must be positive, got {}",
                        self.band_boundary_factor
                    )));
                }
                // Derived boundaries only partition the spectrum when scales shrink
                if let Some(index) = self
                    .length_scales_m
                    .windows(2)
                    .position(|w| w[1] >= w[0])
                {
                    return Err(OceanError::InvalidBandBoundaries(format!(
                        "length scales must be strictly decreasing, scale #{} is {} after {}",
                        index + 1,
                        self.length_scales_m[index + 1],
                        self.length_scales_m[index]
                    )));
                }
            }
        }

        self.waves.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = OceanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cascade_count(), 3);
    }

    #[test]
    fn test_rejects_non_power_of_two_grid() {
        let config = OceanConfig {
            grid_size: 100,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OceanError::GridSizeNotPowerOfTwo(100))
        ));
    }

    #[test]
    fn test_rejects_empty_and_invalid_scales() {
        let config = OceanConfig {
            length_scales_m: vec![],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(OceanError::NoLengthScales)));

        let config = OceanConfig {
            length_scales_m: vec![250.0, -1.0],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OceanError::InvalidLengthScale { index: 1, .. })
        ));

        let config = OceanConfig {
            length_scales_m: vec![17.0, 250.0],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OceanError::InvalidBandBoundaries(_))
        ));
    }

    #[test]
    fn test_rejects_boundary_count_mismatch() {
        let config = OceanConfig {
            band_boundaries: Some(vec![2.0]),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OceanError::CascadeCountMismatch {
                expected: 2,
                actual: 1
            })
        ));

        let config = OceanConfig {
            band_boundaries: Some(vec![2.0, 8.0]),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
