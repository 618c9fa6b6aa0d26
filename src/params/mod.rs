//! Parameter definitions with physical units and documented semantics.
//!
//! All tunables live here with:
//! - Physical units (meters, seconds, rad/m, etc.)
//! - Documented ranges and meanings
//! - Validation that fails fast instead of clamping

mod ocean;
mod waves;

// Re-export all types
pub use ocean::OceanConfig;
pub use waves::{SpectrumSettings, WavesSettings};
