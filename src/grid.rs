//! Square numeric grids standing in for GPU textures.
//!
//! Texels are stored row-major: `data[y * size + x]`.

use glam::{Vec2, Vec3};

/// Complex texel type used by every frequency-domain grid.
pub use rustfft::num_complex::Complex32;

/// N×N container of texels.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    size: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Create a grid filled with `value`
    pub fn filled(size: usize, value: T) -> Self {
        Self {
            size,
            data: vec![value; size * size],
        }
    }
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(size: usize) -> Self {
        Self::filled(size, T::default())
    }
}

impl<T> Grid<T> {
    /// Wrap an existing row-major buffer. Returns `None` when the length is not `size²`.
    pub fn from_vec(size: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == size * size).then_some(Self { size, data })
    }

    /// Build a grid by evaluating `f(x, y)` for every texel
    pub fn from_fn(size: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                data.push(f(x, y));
            }
        }
        Self { size, data }
    }

    /// Texels per side
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.size && y < self.size);
        y * self.size + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let i = self.index(x, y);
        &mut self.data[i]
    }

    /// Texel at signed coordinates with toroidal wrapping
    #[inline]
    pub fn get_wrapped(&self, x: i64, y: i64) -> &T {
        let n = self.size as i64;
        self.get(x.rem_euclid(n) as usize, y.rem_euclid(n) as usize)
    }

    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.size..(y + 1) * self.size]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

/// Values that can be blended by bilinear filtering.
pub trait Lerp: Copy {
    fn lerp(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(self, other: Self, t: f32) -> Self {
        Vec2::lerp(self, other, t)
    }
}

impl Lerp for Vec3 {
    fn lerp(self, other: Self, t: f32) -> Self {
        Vec3::lerp(self, other, t)
    }
}

impl<T: Lerp> Grid<T> {
    /// Bilinear sample at normalized coordinates with repeat addressing.
    ///
    /// Texel centres sit at `(i + 0.5) / size`, matching GPU sampling of a
    /// wrapped texture.
    pub fn sample_bilinear(&self, uv: Vec2) -> T {
        let n = self.size as f32;
        let px = uv.x * n - 0.5;
        let py = uv.y * n - 0.5;
        let x0 = px.floor();
        let y0 = py.floor();
        let tx = px - x0;
        let ty = py - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.get_wrapped(x0, y0).lerp(*self.get_wrapped(x0 + 1, y0), tx);
        let bottom = self
            .get_wrapped(x0, y0 + 1)
            .lerp(*self.get_wrapped(x0 + 1, y0 + 1), tx);
        top.lerp(bottom, ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_is_row_major() {
        let grid = Grid::from_fn(4, |x, y| (x + 10 * y) as f32);
        assert_eq!(*grid.get(3, 0), 3.0);
        assert_eq!(*grid.get(0, 2), 20.0);
        assert_eq!(grid.row(1), &[10.0, 11.0, 12.0, 13.0]);
    }

    #[test]
    fn test_wrapped_addressing() {
        let grid = Grid::from_fn(4, |x, y| (x + 10 * y) as f32);
        assert_eq!(*grid.get_wrapped(-1, 0), 3.0);
        assert_eq!(*grid.get_wrapped(4, 5), 10.0);
    }

    #[test]
    fn test_bilinear_hits_texel_centres() {
        let grid = Grid::from_fn(4, |x, y| (x + 10 * y) as f32);
        let v = grid.sample_bilinear(Vec2::new(2.5 / 4.0, 1.5 / 4.0));
        assert!((v - 12.0).abs() < 1e-5);

        // Halfway between texels (1,1) and (2,1)
        let v = grid.sample_bilinear(Vec2::new(2.0 / 4.0, 1.5 / 4.0));
        assert!((v - 11.5).abs() < 1e-5);
    }

    #[test]
    fn test_bilinear_wraps_across_edge() {
        let grid = Grid::from_fn(4, |x, _| if x == 0 { 1.0 } else if x == 3 { 3.0 } else { 0.0 });
        // u = 0 lies halfway between texel 3 (wrapped) and texel 0
        let v = grid.sample_bilinear(Vec2::new(0.0, 0.125));
        assert!((v - 2.0).abs() < 1e-5);
        // Tiled: one full period away gives the same value
        let w = grid.sample_bilinear(Vec2::new(-3.0, 0.125));
        assert!((v - w).abs() < 1e-5);
    }

    #[test]
    fn test_from_vec_rejects_bad_length() {
        assert!(Grid::from_vec(3, vec![0.0f32; 8]).is_none());
        assert!(Grid::from_vec(3, vec![0.0f32; 9]).is_some());
    }
}
