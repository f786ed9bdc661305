//! Segmented sequence writer
//!
//! A writer owns N forward-only output cursors. Each cursor sits behind its
//! own lock so that different segments can be filled from different threads
//! without contending. Closing the writer concatenates the segments by index
//! into one immutable [`Sequence`].

use crate::common::error::{SequinError, SequinResult};
use crate::storage::column::Sequence;
use crate::types::utils::infer_element_type;
use crate::types::{LogicalType, Value};
use parking_lot::{Mutex, MutexGuard};

/// Forward-only append cursor for one segment
#[derive(Debug, Default)]
pub struct OutputCursor {
    segment: usize,
    values: Vec<Value>,
}

impl OutputCursor {
    fn new(segment: usize) -> Self {
        Self {
            segment,
            values: Vec::new(),
        }
    }

    /// Write one cell
    pub fn write(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Write several cells in order
    pub fn write_all<I: IntoIterator<Item = Value>>(&mut self, values: I) {
        self.values.extend(values);
    }

    /// Reserve room for additional cells
    pub fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
    }

    /// Segment this cursor writes to
    pub fn segment(&self) -> usize {
        self.segment
    }

    /// Number of cells written so far
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if nothing was written
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Write handle over N independent segments
#[derive(Debug)]
pub struct SequenceWriter {
    cursors: Vec<Mutex<OutputCursor>>,
}

impl SequenceWriter {
    /// Open a writer with `num_segments` empty segments
    pub fn open_for_write(num_segments: usize) -> SequinResult<Self> {
        if num_segments == 0 {
            return Err(SequinError::InvalidArgument(
                "A writer needs at least one segment".to_string(),
            ));
        }
        Ok(Self {
            cursors: (0..num_segments)
                .map(|segment| Mutex::new(OutputCursor::new(segment)))
                .collect(),
        })
    }

    /// Number of segments
    pub fn num_segments(&self) -> usize {
        self.cursors.len()
    }

    /// Borrow the cursor of one segment exclusively
    pub fn get_output_cursor(&self, segment: usize) -> SequinResult<MutexGuard<'_, OutputCursor>> {
        self.cursors
            .get(segment)
            .map(|cursor| cursor.lock())
            .ok_or(SequinError::InvalidSegment {
                segment,
                num_segments: self.cursors.len(),
            })
    }

    /// Total number of cells written across all segments
    pub fn len(&self) -> usize {
        self.cursors.iter().map(|c| c.lock().len()).sum()
    }

    /// Check if no segment holds any cell
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn into_values(self) -> Vec<Value> {
        let mut values = Vec::with_capacity(self.len());
        for cursor in self.cursors {
            values.extend(cursor.into_inner().values);
        }
        values
    }

    /// Finalize all segments into one sequence of `element_type`
    ///
    /// Segments are concatenated by index, each keeping its append order.
    pub fn close(self, element_type: LogicalType) -> SequinResult<Sequence> {
        Sequence::with_type(element_type, self.into_values())
    }

    /// Finalize all segments, taking the element type from the written cells
    ///
    /// Fails if the non-null cells are not all of one kind; `fallback` is used
    /// when every cell is null.
    pub fn close_inferred(self, fallback: LogicalType) -> SequinResult<Sequence> {
        let values = self.into_values();
        let element_type = infer_element_type(&values)?.unwrap_or(fallback);
        Sequence::with_type(element_type, values)
    }
}
