//! Immutable column storage for sequin
//!
//! A `Sequence` is the finalized, read-only form of a column:
//! - one element type shared by every non-null cell
//! - explicit null cells
//! - random access, slicing and sequential iteration
//! - cheap clones (cells are shared, never copied)

use crate::common::error::{SequinError, SequinResult};
use crate::types::utils::infer_element_type;
use crate::types::{LogicalType, Value};
use std::ops::Range;
use std::sync::Arc;

/// Finalized, immutable column of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    /// Element type of all non-null cells (`Null` when there are none)
    element_type: LogicalType,
    /// Shared cell storage
    values: Arc<[Value]>,
}

impl Sequence {
    /// Build a sequence, inferring its element type from the values
    pub fn from_values(values: Vec<Value>) -> SequinResult<Self> {
        let element_type = infer_element_type(&values)?.unwrap_or(LogicalType::Null);
        Ok(Self {
            element_type,
            values: values.into(),
        })
    }

    /// Build a sequence with an explicit element type
    ///
    /// Every non-null value must already be of `element_type`.
    pub fn with_type(element_type: LogicalType, values: Vec<Value>) -> SequinResult<Self> {
        if let Some(bad) = values
            .iter()
            .find(|v| !v.is_null() && v.get_type() != element_type)
        {
            return Err(SequinError::type_mismatch(format!(
                "Cannot store {} value {} in a {} sequence",
                bad.get_type(),
                bad,
                element_type
            )));
        }
        Ok(Self {
            element_type,
            values: values.into(),
        })
    }

    /// Create an empty sequence of the given type
    pub fn empty(element_type: LogicalType) -> Self {
        Self {
            element_type,
            values: Arc::from(Vec::new()),
        }
    }

    /// Get the element type
    pub fn get_type(&self) -> LogicalType {
        self.element_type
    }

    /// Get the number of cells
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the sequence has no cells
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a cell by index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a cell by index, failing when out of bounds
    pub fn get_value(&self, index: usize) -> SequinResult<&Value> {
        self.values.get(index).ok_or_else(|| {
            SequinError::InvalidArgument(format!(
                "Index {} out of bounds for sequence with {} values",
                index,
                self.values.len()
            ))
        })
    }

    /// Borrow a contiguous range of cells
    pub fn slice(&self, range: Range<usize>) -> SequinResult<&[Value]> {
        if range.start > range.end || range.end > self.values.len() {
            return Err(SequinError::InvalidArgument(format!(
                "Range {}..{} out of bounds for sequence with {} values",
                range.start,
                range.end,
                self.values.len()
            )));
        }
        Ok(&self.values[range])
    }

    /// Borrow all cells
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Iterate over cells in order
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Count null cells
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Copy the cells out
    pub fn to_vec(&self) -> Vec<Value> {
        self.values.to_vec()
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
