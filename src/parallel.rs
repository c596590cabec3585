//! Data-parallel per-region scans
//!
//! Each pass that computes one value per region from a read-only snapshot goes
//! through [`scan_regions`]: the output slice is split into contiguous chunks
//! and every rayon task writes only its own chunk.

use rayon::prelude::*;

use crate::graph::RegionId;

/// Regions per task below which splitting further is not worth it.
const MIN_CHUNK: usize = 1024;

/// Fill `out[r] = f(r)` for every region, in parallel.
pub fn scan_regions<T, F>(out: &mut [T], f: F)
where
    T: Send,
    F: Fn(RegionId) -> T + Sync,
{
    let chunk = chunk_size(out.len());
    out.par_chunks_mut(chunk).enumerate().for_each(|(i, slots)| {
        let start = i * chunk;
        for (j, slot) in slots.iter_mut().enumerate() {
            *slot = f(start + j);
        }
    });
}

/// Collect `f(r)` for `0..num_regions` into a new vector, in parallel.
pub fn map_regions<T, F>(num_regions: usize, f: F) -> Vec<T>
where
    T: Send + Default + Clone,
    F: Fn(RegionId) -> T + Sync,
{
    let mut out = vec![T::default(); num_regions];
    scan_regions(&mut out, f);
    out
}

fn chunk_size(len: usize) -> usize {
    let tasks = rayon::current_num_threads().max(1) * 4;
    (len / tasks).max(MIN_CHUNK)
}
