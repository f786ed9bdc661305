//! Constants used throughout sequin

/// Largest rolling window accepted by default (cells, inclusive of both ends)
pub const DEFAULT_MAX_WINDOW_SIZE: u64 = u32::MAX as u64;

/// Rows handed to one worker when a rolling scan runs in parallel
pub const DEFAULT_MORSEL_SIZE: usize = 16384;

/// Default number of append segments for a builder
pub const DEFAULT_NUM_SEGMENTS: usize = 1;

/// Default capacity of the builder history buffer
pub const DEFAULT_HISTORY_SIZE: usize = 10;

/// Maximum threads for parallel execution
pub const MAX_THREADS: usize = 64;

/// Prefix used to generate frame column names (`X1`, `X2`, ...)
pub const DEFAULT_COLUMN_PREFIX: &str = "X";
