//! Tidewave library - cascaded FFT ocean simulation

pub mod cascade;
pub mod error;
pub mod evolution;
pub mod executor;
pub mod export;
pub mod fft;
pub mod grid;
pub mod noise;
pub mod ocean;
pub mod params;
pub mod readback;
pub mod spectrum;

pub use cascade::Cascade;
pub use error::{OceanError, ReadbackError, Result};
pub use executor::{KernelExecutor, RayonExecutor, SerialExecutor};
pub use ocean::{Ocean, SceneParameters};
pub use params::{OceanConfig, SpectrumSettings, WavesSettings};
pub use readback::WaterSampler;
