//! Grayscale PNG dumps of cascade outputs for inspection.

use std::path::Path;

use glam::Vec3;
use image::{GrayImage, Luma};

use crate::cascade::Cascade;
use crate::error::ExportError;
use crate::grid::Grid;

/// Map vertical displacement to gray, mid-gray at rest.
///
/// Scaled by the largest |Dy| so every frame uses the full range.
pub fn height_image(displacement: &Grid<Vec3>) -> GrayImage {
    let peak = displacement
        .iter()
        .map(|d| d.y.abs())
        .fold(0.0f32, f32::max)
        .max(f32::EPSILON);
    let size = displacement.size() as u32;
    GrayImage::from_fn(size, size, |x, y| {
        let h = displacement.get(x as usize, y as usize).y / peak;
        Luma([((h + 1.0) * 127.5).clamp(0.0, 255.0) as u8])
    })
}

/// Foam accumulator clamped to [0, 1]; folded (foamy) regions come out dark
pub fn turbulence_image(turbulence: &Grid<f32>) -> GrayImage {
    let size = turbulence.size() as u32;
    GrayImage::from_fn(size, size, |x, y| {
        let foam = *turbulence.get(x as usize, y as usize);
        Luma([(foam.clamp(0.0, 1.0) * 255.0) as u8])
    })
}

pub fn export_height_png(cascade: &Cascade, path: impl AsRef<Path>) -> Result<(), ExportError> {
    height_image(cascade.displacement()?).save(path)?;
    Ok(())
}

pub fn export_turbulence_png(cascade: &Cascade, path: impl AsRef<Path>) -> Result<(), ExportError> {
    turbulence_image(cascade.turbulence()?).save(path)?;
    Ok(())
}
