//! Parallel kernel executors.
//!
//! Every simulation stage (spectrum generation, evolution, each FFT pass and
//! the merge) is expressed as a kernel over grid rows and handed to a
//! [`KernelExecutor`]. Swapping the executor changes how the work is
//! scheduled without touching the math.

use rayon::prelude::*;

/// Dispatches data-parallel kernels.
pub trait KernelExecutor: Send + Sync {
    /// Run `kernel(row_index, row)` for every `row_len`-sized chunk of `data`.
    ///
    /// Rows may execute in any order and concurrently; a kernel must only
    /// write to the row it is given.
    fn dispatch_rows<T, F>(&self, data: &mut [T], row_len: usize, kernel: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Send + Sync;

    /// Run `kernel(index, item)` for every item. Used for independent units
    /// of work such as whole cascades.
    fn dispatch_each<T, F>(&self, items: &mut [T], kernel: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Send + Sync;
}

/// Runs every kernel on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialExecutor;

impl KernelExecutor for SerialExecutor {
    fn dispatch_rows<T, F>(&self, data: &mut [T], row_len: usize, kernel: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Send + Sync,
    {
        data.chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| kernel(y, row));
    }

    fn dispatch_each<T, F>(&self, items: &mut [T], kernel: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Send + Sync,
    {
        items
            .iter_mut()
            .enumerate()
            .for_each(|(i, item)| kernel(i, item));
    }
}

/// Spreads rows and items across the rayon global thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct RayonExecutor;

impl KernelExecutor for RayonExecutor {
    fn dispatch_rows<T, F>(&self, data: &mut [T], row_len: usize, kernel: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Send + Sync,
    {
        data.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| kernel(y, row));
    }

    fn dispatch_each<T, F>(&self, items: &mut [T], kernel: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Send + Sync,
    {
        items
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, item)| kernel(i, item));
    }
}
