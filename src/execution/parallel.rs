//! Parallel Execution Framework for sequin
//!
//! Rolling scans use a morsel-driven approach:
//! - The output index range is split into "morsels" that are processed independently
//! - Uses Rayon for the work-stealing thread pool
//! - Every morsel owns a disjoint output slot, so the only coordination is the final join

use crate::common::constants::MAX_THREADS;
use crate::common::error::{SequinError, SequinResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Parallel execution context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelContext {
    /// Number of worker threads
    pub num_threads: usize,
    /// Enable parallel execution
    pub parallel_enabled: bool,
}

impl ParallelContext {
    pub fn new(num_threads: usize) -> Self {
        let num_threads = num_threads.clamp(1, MAX_THREADS);
        Self {
            num_threads,
            parallel_enabled: num_threads > 1,
        }
    }

    pub fn from_system() -> Self {
        Self::new(num_cpus::get())
    }

    /// Single-threaded context
    pub fn sequential() -> Self {
        Self::new(1)
    }
}

impl Default for ParallelContext {
    fn default() -> Self {
        Self::from_system()
    }
}

/// Morsel - a contiguous range of output positions processed independently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Morsel {
    /// Starting offset in the data source
    pub offset: usize,
    /// Number of rows in this morsel
    pub count: usize,
    /// Morsel ID, also the index of its output segment
    pub id: usize,
}

impl Morsel {
    pub fn new(offset: usize, count: usize, id: usize) -> Self {
        Self { offset, count, id }
    }

    /// Range of positions covered by this morsel
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.count
    }
}

/// Morsel generator - splits a row range into parallel work units
pub struct MorselGenerator {
    /// Total number of rows
    total_rows: usize,
    /// Size of each morsel
    morsel_size: usize,
}

impl MorselGenerator {
    pub fn new(total_rows: usize, morsel_size: usize) -> Self {
        Self {
            total_rows,
            morsel_size: morsel_size.max(1),
        }
    }

    /// Get all morsels as a vector (for parallel iteration)
    ///
    /// An empty input still yields one empty morsel so callers always have
    /// at least one output segment.
    pub fn get_all_morsels(&self) -> Vec<Morsel> {
        if self.total_rows == 0 {
            return vec![Morsel::new(0, 0, 0)];
        }
        (0..self.num_morsels())
            .map(|i| {
                let offset = i * self.morsel_size;
                let count = std::cmp::min(self.morsel_size, self.total_rows - offset);
                Morsel::new(offset, count, i)
            })
            .collect()
    }

    /// Get total number of morsels
    pub fn num_morsels(&self) -> usize {
        self.total_rows.div_ceil(self.morsel_size).max(1)
    }
}

/// Run `process_morsel` over every morsel, in parallel when worthwhile
///
/// Runs on a pool of `num_threads` workers, or on the calling thread when
/// parallelism is disabled or there is only one morsel. Returns the first error in morsel order.
pub fn for_each_morsel<F>(
    morsels: &[Morsel],
    parallel_ctx: &ParallelContext,
    process_morsel: F,
) -> SequinResult<()>
where
    F: Fn(&Morsel) -> SequinResult<()> + Send + Sync,
{
    if !parallel_ctx.parallel_enabled || morsels.len() <= 1 {
        return morsels.iter().try_for_each(process_morsel);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallel_ctx.num_threads)
        .build()
        .map_err(|e| SequinError::state(format!("failed to start worker pool: {}", e)))?;
    let results: Vec<SequinResult<()>> =
        pool.install(|| morsels.par_iter().map(&process_morsel).collect());
    results.into_iter().collect()
}
