//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use tidewave::params::{OceanConfig, WavesSettings};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "tidewave")]
#[command(about = "Cascaded FFT ocean simulation", long_about = None)]
pub struct Args {
    /// Texels per side of each cascade (power of two)
    #[arg(long, value_name = "N", default_value_t = 256)]
    pub size: usize,

    /// Cascade length scales in meters, largest first
    #[arg(long, value_name = "METERS", value_delimiter = ',', default_values_t = [250.0, 17.0, 5.0])]
    pub length_scales: Vec<f32>,

    /// Wind speed 10 m above the surface (m/s)
    #[arg(long, value_name = "M/S", default_value_t = 10.0)]
    pub wind_speed: f32,

    /// Wind direction (degrees)
    #[arg(long, value_name = "DEGREES", default_value_t = 0.0)]
    pub wind_direction: f32,

    /// Distance over which the wind has blown (meters)
    #[arg(long, value_name = "METERS", default_value_t = 100_000.0)]
    pub fetch: f32,

    /// Horizontal displacement multiplier λ
    #[arg(long, default_value_t = 1.0)]
    pub choppiness: f32,

    /// Water depth (meters)
    #[arg(long, value_name = "METERS", default_value_t = 500.0)]
    pub depth: f32,

    /// Noise field seed
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Frames to simulate
    #[arg(long, default_value_t = 120)]
    pub frames: u32,

    /// Seconds between frames
    #[arg(long, value_name = "SECONDS", default_value_t = 1.0 / 60.0)]
    pub dt: f32,

    /// World x of the height probe (meters)
    #[arg(long, value_name = "METERS", default_value_t = 0.0)]
    pub probe_x: f32,

    /// World z of the height probe (meters)
    #[arg(long, value_name = "METERS", default_value_t = 0.0)]
    pub probe_z: f32,

    /// Directory for the cached noise field
    #[arg(long, value_name = "DIR")]
    pub noise_cache: Option<PathBuf>,

    /// Write height and foam PNGs of every cascade after the last frame
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,

    /// Rebuild initial spectra every frame
    #[arg(long)]
    pub always_recalculate: bool,

    /// Wait for each readback so probe heights track the current frame
    #[arg(long)]
    pub sync: bool,
}

impl Args {
    /// Build the simulation config; anything not exposed keeps its default
    pub fn to_config(&self) -> OceanConfig {
        let mut waves = WavesSettings {
            depth_m: self.depth,
            lambda: self.choppiness,
            ..Default::default()
        };
        waves.local.wind_speed_m_per_s = self.wind_speed;
        waves.local.wind_direction_deg = self.wind_direction;
        waves.local.fetch_m = self.fetch;

        OceanConfig {
            grid_size: self.size,
            length_scales_m: self.length_scales.clone(),
            waves,
            always_recalculate_initials: self.always_recalculate,
            noise_seed: self.seed,
            noise_cache_dir: self.noise_cache.clone(),
            ..Default::default()
        }
    }
}
