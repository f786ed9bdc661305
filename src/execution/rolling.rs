//! Rolling (moving-window) aggregation
//!
//! For every position `i` of the input, the window `[i + start, i + end]` is
//! clipped to the sequence bounds and reduced by one registered aggregate.
//! Positions are independent, so the output range is split into morsels that
//! each fill their own writer segment.

use crate::common::constants::{DEFAULT_MAX_WINDOW_SIZE, DEFAULT_MORSEL_SIZE};
use crate::common::error::{SequinError, SequinResult};
use crate::execution::parallel::{for_each_morsel, MorselGenerator, ParallelContext};
use crate::expression::aggregate::AggregateFunction;
use crate::storage::{Sequence, SequenceWriter};
use crate::types::{LogicalType, Value};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::debug;

/// Configuration for rolling scans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollingConfig {
    /// Largest accepted window, in cells
    pub max_window_size: u64,
    /// Positions evaluated per morsel
    pub morsel_size: usize,
    /// Thread settings
    pub parallel: ParallelContext,
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            max_window_size: DEFAULT_MAX_WINDOW_SIZE,
            morsel_size: DEFAULT_MORSEL_SIZE,
            parallel: ParallelContext::default(),
        }
    }
}

/// Window offsets relative to the current position, both inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub start: i64,
    pub end: i64,
}

impl WindowBounds {
    pub fn new(start: i64, end: i64) -> SequinResult<Self> {
        if end < start {
            return Err(SequinError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Number of cells an unclipped window covers
    pub fn size(&self) -> u128 {
        (self.end as i128 - self.start as i128 + 1) as u128
    }

    /// Absolute index range of the window at `position`, clipped to `[0, len)`
    ///
    /// A window lying wholly outside the sequence clips to an empty range.
    pub fn clip(&self, position: usize, len: usize) -> Range<usize> {
        if len == 0 {
            return 0..0;
        }
        let lo = (position as i128 + self.start as i128).max(0);
        let hi = (position as i128 + self.end as i128).min(len as i128 - 1);
        if lo > hi {
            return 0..0;
        }
        lo as usize..hi as usize + 1
    }
}

/// Minimum-observations gate
///
/// With `min_observations == 0` every scanned cell must be non-null;
/// otherwise at least `min_observations` cells must be.
pub fn has_min_observations(scanned: &[Value], min_observations: usize) -> bool {
    let present = scanned.iter().filter(|v| !v.is_null()).count();
    if min_observations == 0 {
        present == scanned.len()
    } else {
        present >= min_observations
    }
}

/// Rolling aggregate operator
#[derive(Debug, Clone, Default)]
pub struct RollingApply {
    config: RollingConfig,
}

impl RollingApply {
    pub fn new(config: RollingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RollingConfig {
        &self.config
    }

    /// Apply `fn_name` over the moving window `[window_start, window_end]`
    ///
    /// Validation happens before any output is produced. The result has the
    /// same length as `input`.
    pub fn apply(
        &self,
        input: &Sequence,
        fn_name: &str,
        window_start: i64,
        window_end: i64,
        min_observations: usize,
    ) -> SequinResult<Sequence> {
        let window = WindowBounds::new(window_start, window_end)?;
        if window.size() > self.config.max_window_size as u128 {
            return Err(SequinError::WindowTooLarge {
                size: window.size(),
                max: self.config.max_window_size,
            });
        }
        let function = AggregateFunction::lookup(fn_name)?;
        let input_type = input.get_type();
        let output_type = function.output_type(input_type)?;

        let morsels = MorselGenerator::new(input.len(), self.config.morsel_size).get_all_morsels();
        debug!(
            function = %function,
            window_start,
            window_end,
            min_observations,
            rows = input.len(),
            morsels = morsels.len(),
            "rolling apply"
        );

        let cells = input.values();
        let writer = SequenceWriter::open_for_write(morsels.len())?;
        for_each_morsel(&morsels, &self.config.parallel, |morsel| {
            let mut cursor = writer.get_output_cursor(morsel.id)?;
            cursor.reserve(morsel.count);
            for position in morsel.range() {
                let scanned = &cells[window.clip(position, cells.len())];
                let value = if function.never_null()
                    || has_min_observations(scanned, min_observations)
                {
                    function.reduce(scanned, input_type)?
                } else {
                    Value::Null
                };
                cursor.write(value);
            }
            Ok(())
        })?;

        writer.close_inferred(output_type)
    }
}

/// Apply a registered aggregate over a moving window with default configuration
pub fn rolling_apply(
    input: &Sequence,
    fn_name: &str,
    window_start: i64,
    window_end: i64,
    min_observations: usize,
) -> SequinResult<Sequence> {
    RollingApply::default().apply(input, fn_name, window_start, window_end, min_observations)
}

/// Output element type a rolling aggregate would produce, without running it
pub fn rolling_output_type(input: &Sequence, fn_name: &str) -> SequinResult<LogicalType> {
    AggregateFunction::lookup(fn_name)?.output_type(input.get_type())
}
