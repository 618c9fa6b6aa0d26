//! Cascaded ocean: aggregation of cascades and CPU water queries.

mod system;

// Re-export public types
pub use system::Ocean;

/// Values a renderer needs to composite the cascades
#[derive(Debug, Clone, PartialEq)]
pub struct SceneParameters {
    /// Length scale of each cascade (meters), cascade 0 first
    pub length_scales_m: Vec<f32>,
    /// Choppiness λ
    pub lambda: f32,
}

#[cfg(test)]
mod tests {
    use std::f32::consts::TAU;
    use std::time::Duration;

    use glam::Vec3;

    use super::*;
    use crate::error::OceanError;
    use crate::executor::SerialExecutor;
    use crate::noise::GaussianNoise;
    use crate::params::{OceanConfig, SpectrumSettings};

    const WAIT: Duration = Duration::from_secs(10);

    fn small_config() -> OceanConfig {
        OceanConfig {
            grid_size: 64,
            length_scales_m: vec![100.0],
            ..Default::default()
        }
    }

    #[test]
    fn test_queries_read_zeroed_placeholder_before_first_readback() {
        let mut ocean = Ocean::new(small_config()).unwrap();
        assert_eq!(ocean.config().waves.local.wind_speed_m_per_s, 10.0);

        // The t=0 copy is queued but not swapped in yet; the t=0 field itself
        // is not flat at the origin
        ocean.update(0.0).unwrap();
        let d = ocean.water_displacement(Vec3::ZERO);
        assert!(d.length() < 1e-4);
        assert!(ocean.water_height(Vec3::new(10.0, 0.0, 20.0)).abs() < 1e-4);
    }

    #[test]
    fn test_snapshot_follows_cascade_zero() {
        let mut ocean = Ocean::new(small_config()).unwrap();
        ocean.update(0.0).unwrap();
        assert!(ocean.sync_readback(WAIT));

        let snapshot = ocean.sampler().snapshot();
        let displacement = ocean.cascades()[0].displacement().unwrap();
        assert_eq!(snapshot.grid(), displacement);

        // Origin sits between texels; compare against the same bilinear sample
        let expected = displacement.sample_bilinear(glam::Vec2::ZERO);
        assert!((ocean.water_displacement(Vec3::ZERO) - expected).length() < 1e-5);
        assert!(snapshot.grid().iter().any(|v| v.y.abs() > 1e-3));
    }

    #[test]
    fn test_queries_lag_one_readback_behind() {
        let mut ocean = Ocean::with_executor(small_config(), SerialExecutor).unwrap();
        ocean.update(0.0).unwrap();
        assert!(ocean.sync_readback(WAIT));
        let frame0 = ocean.sampler().snapshot();

        // New frame computed and a copy queued, but not yet swapped in
        ocean.update(0.5).unwrap();
        assert_eq!(*ocean.sampler().snapshot(), *frame0);
        assert_ne!(ocean.cascades()[0].displacement().unwrap(), frame0.grid());

        assert!(ocean.sync_readback(WAIT));
        assert_eq!(
            ocean.sampler().snapshot().grid(),
            ocean.cascades()[0].displacement().unwrap()
        );
    }

    #[test]
    fn test_height_query_from_other_thread() {
        let mut ocean = Ocean::new(small_config()).unwrap();
        ocean.update(1.0).unwrap();
        ocean.sync_readback(WAIT);
        let sampler = ocean.sampler();
        let p = Vec3::new(12.5, 0.0, -33.0);
        let local = ocean.water_height(p);
        let remote = std::thread::spawn(move || sampler.height(p)).join().unwrap();
        assert_eq!(local, remote);
        assert!(local.is_finite());
    }

    #[test]
    fn test_default_bands_use_factor_six() {
        let config = OceanConfig {
            grid_size: 16,
            ..Default::default()
        };
        let ocean = Ocean::with_executor(config, SerialExecutor).unwrap();
        let bands = ocean.bands();
        assert_eq!(bands.len(), 3);
        assert_eq!(bands[0].low, 0.0);
        assert!((bands[1].low - TAU / 17.0 * 6.0).abs() < 1e-5);
        assert!((bands[2].low - TAU / 5.0 * 6.0).abs() < 1e-5);
        assert_eq!(bands[0].high, bands[1].low);
        assert!(bands[2].high.is_infinite());
        for (cascade, band) in ocean.cascades().iter().zip(bands) {
            assert_eq!(cascade.band().unwrap(), Some(*band));
        }
    }

    #[test]
    fn test_explicit_boundaries_override_factor() {
        let config = OceanConfig {
            grid_size: 16,
            length_scales_m: vec![100.0, 10.0],
            band_boundaries: Some(vec![0.5]),
            ..Default::default()
        };
        let ocean = Ocean::with_executor(config, SerialExecutor).unwrap();
        assert_eq!(ocean.bands()[0].high, 0.5);
        assert_eq!(ocean.bands()[1].low, 0.5);
    }

    #[test]
    fn test_config_errors_fail_fast() {
        let bad_size = OceanConfig {
            grid_size: 100,
            ..Default::default()
        };
        assert!(matches!(
            Ocean::new(bad_size),
            Err(OceanError::GridSizeNotPowerOfTwo(100))
        ));

        let mismatch = OceanConfig {
            grid_size: 16,
            band_boundaries: Some(vec![1.0]),
            ..Default::default()
        };
        assert!(matches!(
            Ocean::new(mismatch),
            Err(OceanError::CascadeCountMismatch {
                expected: 2,
                actual: 1
            })
        ));

        let wrong_noise = GaussianNoise::generate(32, 0);
        assert!(matches!(
            Ocean::with_noise(small_config(), SerialExecutor, wrong_noise),
            Err(OceanError::NoiseSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_disposed_ocean_rejects_updates() {
        let mut ocean = Ocean::with_executor(small_config(), SerialExecutor).unwrap();
        ocean.update(0.0).unwrap();
        ocean.dispose();
        assert!(ocean.is_disposed());
        assert!(ocean.cascades().iter().all(|c| c.is_disposed()));
        assert!(matches!(ocean.update(0.1), Err(OceanError::OceanDisposed)));
        // Queries keep answering from the last snapshot
        assert!(ocean.water_height(Vec3::ZERO).is_finite());
        ocean.dispose();
    }

    #[test]
    fn test_dispose_abandons_copy_in_flight() {
        let mut ocean = Ocean::with_executor(small_config(), SerialExecutor).unwrap();
        let before = ocean.sampler().snapshot();
        ocean.update(0.0).unwrap();
        ocean.dispose();

        assert!(!ocean.sync_readback(WAIT));
        assert_eq!(*ocean.sampler().snapshot(), *before);
        assert!(ocean.sampler().snapshot().grid().iter().all(|v| *v == Vec3::ZERO));
    }

    #[test]
    fn test_disabled_local_sea_keeps_readback_alive() {
        let mut config = OceanConfig {
            grid_size: 32,
            ..small_config()
        };
        config.waves.local = SpectrumSettings {
            scale: 0.0,
            wind_speed_m_per_s: 0.0,
            ..SpectrumSettings::wind_sea()
        };
        let mut ocean = Ocean::with_executor(config, SerialExecutor).unwrap();
        ocean.update(0.0).unwrap();

        let displacement = ocean.cascades()[0].displacement().unwrap();
        assert!(displacement.iter().all(|v| v.is_finite()));
        assert!(ocean.sync_readback(WAIT));
        assert!(ocean.water_height(Vec3::new(3.0, 0.0, 7.0)).is_finite());
    }

    #[test]
    fn test_noise_is_cached_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config = OceanConfig {
            grid_size: 16,
            length_scales_m: vec![50.0],
            noise_cache_dir: Some(dir.path().to_path_buf()),
            noise_seed: 9,
            ..Default::default()
        };
        let first = Ocean::with_executor(config.clone(), SerialExecutor).unwrap();
        assert!(dir.path().join("GaussianNoiseTexture16x16.bin").exists());

        // A different seed is ignored once the field is cached
        let second = Ocean::with_executor(
            OceanConfig {
                noise_seed: 10,
                ..config
            },
            SerialExecutor,
        )
        .unwrap();
        assert_eq!(
            first.cascades()[0].initial_spectrum().unwrap(),
            second.cascades()[0].initial_spectrum().unwrap()
        );
    }

    #[test]
    fn test_recalculated_initials_follow_new_settings() {
        let mut ocean = Ocean::with_executor(
            OceanConfig {
                always_recalculate_initials: true,
                ..small_config()
            },
            SerialExecutor,
        )
        .unwrap();
        ocean.update(0.0).unwrap();
        let before = ocean.cascades()[0].initial_spectrum().unwrap().cloned();

        let mut waves = ocean.config().waves;
        waves.local.wind_speed_m_per_s = 20.0;
        ocean.set_waves(waves).unwrap();
        ocean.update(0.1).unwrap();
        let after = ocean.cascades()[0].initial_spectrum().unwrap().cloned();
        assert_ne!(before, after);

        let scene = ocean.scene_parameters();
        assert_eq!(scene.length_scales_m, vec![100.0]);
        assert_eq!(scene.lambda, 1.0);
    }
}
