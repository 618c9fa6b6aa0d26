//! Error taxonomy for the ocean simulation.
//!
//! Configuration and lifecycle problems are fatal and surface as
//! [`OceanError`]. Readback failures are non-fatal: they are logged by the
//! aggregator and the previous snapshot stays in place.

use thiserror::Error;

/// Fatal errors: bad configuration or misuse of a released resource.
#[derive(Debug, Error)]
pub enum OceanError {
    #[error("grid size must be a power of two >= 2, got {0}")]
    GridSizeNotPowerOfTwo(usize),

    #[error("at least one cascade length scale is required")]
    NoLengthScales,

    #[error("length scale #{index} must be finite and positive, got {value}")]
    InvalidLengthScale { index: usize, value: f32 },

    #[error("expected {expected} band boundaries for the configured cascades, got {actual}")]
    CascadeCountMismatch { expected: usize, actual: usize },

    #[error("invalid cascade bands: {0}")]
    InvalidBandBoundaries(String),

    #[error("grid is {actual}x{actual} but the transform expects {expected}x{expected}")]
    GridSizeMismatch { expected: usize, actual: usize },

    #[error("noise field is {actual}x{actual} but the simulation grid is {expected}x{expected}")]
    NoiseSizeMismatch { expected: usize, actual: usize },

    #[error("invalid wave settings: {0}")]
    InvalidWaveSettings(String),

    #[error("cascade initial spectrum has not been calculated")]
    InitialsMissing,

    #[error("cascade used after dispose")]
    CascadeDisposed,

    #[error("ocean used after dispose")]
    OceanDisposed,

    #[error("failed to start readback worker: {0}")]
    ReadbackWorker(#[source] std::io::Error),
}

/// Non-fatal failures of an asynchronous displacement copy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadbackError {
    #[error("displacement copy contained non-finite values")]
    NonFinite,

    #[error("displacement copy has {actual} texels, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("readback request was abandoned")]
    Abandoned,

    #[error("readback worker disconnected")]
    Disconnected,
}

/// Failures of the keyed blob cache used for the noise field.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures writing inspection images.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Ocean(#[from] OceanError),

    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T, E = OceanError> = std::result::Result<T, E>;
