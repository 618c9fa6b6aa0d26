//! 2D FFT on square complex grids using precomputed butterfly tables.
//!
//! Each of the log2(N) stages is a Stockham radix-2 step: output `j` reads
//! two inputs `(i, i + b)` and combines them with one twiddle factor, so the
//! data comes out in natural order and no bit-reversal pass is needed.
//! Stages ping-pong between the caller's grid and a scratch grid; the row
//! stages run first, then the column stages.

use std::f32::consts::PI;

use crate::error::{OceanError, Result};
use crate::executor::KernelExecutor;
use crate::grid::{Complex32, Grid};

/// One precomputed butterfly: `out = in[inputs[0]] + twiddle * in[inputs[1]]`
#[derive(Debug, Clone, Copy)]
struct Butterfly {
    twiddle: Complex32,
    inputs: [usize; 2],
}

/// Post-processing applied after an inverse transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InverseOptions {
    /// Multiply by 1/N² so the transform is the exact inverse of [`Fft2d::forward`]
    pub scale: bool,
    /// Multiply texel (x, y) by (-1)^(x+y); undoes a spectrum stored with
    /// the zero frequency at the grid centre.
    pub permute: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Inverse,
}

/// Reusable 2D FFT plan for one grid size.
#[derive(Debug, Clone)]
pub struct Fft2d {
    size: usize,
    log_size: usize,
    /// `log_size` rows of `size` butterflies
    butterflies: Vec<Butterfly>,
}

impl Fft2d {
    /// Precompute twiddle factors and input indices for an N×N transform
    pub fn new(size: usize) -> Result<Self> {
        if size < 2 || !size.is_power_of_two() {
            return Err(OceanError::GridSizeNotPowerOfTwo(size));
        }
        let log_size = size.trailing_zeros() as usize;
        let half = size / 2;
        let mut butterflies = vec![
            Butterfly {
                twiddle: Complex32::new(1.0, 0.0),
                inputs: [0, 0],
            };
            log_size * size
        ];

        for stage in 0..log_size {
            let b = size >> (stage + 1);
            for j in 0..half {
                let i = (2 * b * (j / b) + j % b) % size;
                let angle = -2.0 * PI * ((j / b) * b) as f32 / size as f32;
                let twiddle = Complex32::from_polar(1.0, angle);
                let row = stage * size;
                butterflies[row + j] = Butterfly {
                    twiddle,
                    inputs: [i, i + b],
                };
                butterflies[row + j + half] = Butterfly {
                    twiddle: -twiddle,
                    inputs: [i, i + b],
                };
            }
        }

        Ok(Self {
            size,
            log_size,
            butterflies,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of butterfly stages per axis
    pub fn log_size(&self) -> usize {
        self.log_size
    }

    /// Unscaled forward DFT: `X[k] = Σ x[n]·e^{-2πi·kn/N}` along both axes.
    ///
    /// Fails with [`OceanError::GridSizeMismatch`] if either grid is not N×N.
    pub fn forward<E: KernelExecutor>(
        &self,
        exec: &E,
        grid: &mut Grid<Complex32>,
        scratch: &mut Grid<Complex32>,
    ) -> Result<()> {
        self.transform(exec, grid, scratch, Direction::Forward)
    }

    /// Inverse DFT, in place. `scratch` is clobbered.
    pub fn inverse<E: KernelExecutor>(
        &self,
        exec: &E,
        grid: &mut Grid<Complex32>,
        scratch: &mut Grid<Complex32>,
        options: InverseOptions,
    ) -> Result<()> {
        self.transform(exec, grid, scratch, Direction::Inverse)?;
        if !options.scale && !options.permute {
            return Ok(());
        }

        let n = self.size;
        let scale = if options.scale {
            1.0 / (n * n) as f32
        } else {
            1.0
        };
        let permute = options.permute;
        exec.dispatch_rows(grid.as_mut_slice(), n, |y, row| {
            for (x, v) in row.iter_mut().enumerate() {
                let sign = if permute && (x + y) % 2 == 1 { -1.0 } else { 1.0 };
                *v *= scale * sign;
            }
        });
        Ok(())
    }

    fn transform<E: KernelExecutor>(
        &self,
        exec: &E,
        grid: &mut Grid<Complex32>,
        scratch: &mut Grid<Complex32>,
        direction: Direction,
    ) -> Result<()> {
        for actual in [grid.size(), scratch.size()] {
            if actual != self.size {
                return Err(OceanError::GridSizeMismatch {
                    expected: self.size,
                    actual,
                });
            }
        }

        let mut src = grid;
        let mut dst = scratch;
        for stage in 0..self.log_size {
            self.horizontal_pass(exec, stage, src, dst, direction);
            std::mem::swap(&mut src, &mut dst);
        }
        for stage in 0..self.log_size {
            self.vertical_pass(exec, stage, src, dst, direction);
            std::mem::swap(&mut src, &mut dst);
        }
        // 2·log2(N) swaps: the result is back in the caller's grid
        Ok(())
    }

    fn stage(&self, stage: usize) -> &[Butterfly] {
        &self.butterflies[stage * self.size..(stage + 1) * self.size]
    }

    fn horizontal_pass<E: KernelExecutor>(
        &self,
        exec: &E,
        stage: usize,
        src: &Grid<Complex32>,
        dst: &mut Grid<Complex32>,
        direction: Direction,
    ) {
        let butterflies = self.stage(stage);
        exec.dispatch_rows(dst.as_mut_slice(), self.size, |y, out| {
            let input = src.row(y);
            for (x, value) in out.iter_mut().enumerate() {
                let b = butterflies[x];
                let w = twiddle(b, direction);
                *value = input[b.inputs[0]] + w * input[b.inputs[1]];
            }
        });
    }

    fn vertical_pass<E: KernelExecutor>(
        &self,
        exec: &E,
        stage: usize,
        src: &Grid<Complex32>,
        dst: &mut Grid<Complex32>,
        direction: Direction,
    ) {
        let butterflies = self.stage(stage);
        exec.dispatch_rows(dst.as_mut_slice(), self.size, |y, out| {
            let b = butterflies[y];
            let w = twiddle(b, direction);
            let first = src.row(b.inputs[0]);
            let second = src.row(b.inputs[1]);
            for ((value, a), c) in out.iter_mut().zip(first).zip(second) {
                *value = a + w * c;
            }
        });
    }
}

#[inline]
fn twiddle(b: Butterfly, direction: Direction) -> Complex32 {
    match direction {
        Direction::Forward => b.twiddle,
        Direction::Inverse => b.twiddle.conj(),
    }
}
