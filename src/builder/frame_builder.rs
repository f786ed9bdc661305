//! Multi-column row builder
//!
//! Rows are appended one at a time (or in all-or-nothing batches) to one of
//! N segments. Each column has a declared type every cell is coerced to.
//! Closing produces a [`Frame`] of equally long sequences.

use crate::builder::history::HistoryBuffer;
use crate::common::constants::DEFAULT_COLUMN_PREFIX;
use crate::common::error::{SequinError, SequinResult};
use crate::storage::{Sequence, SequenceWriter};
use crate::types::{LogicalType, Value};
use parking_lot::RwLock;
use tracing::debug;

/// Named, equally long columns produced by a [`FrameBuilder`]
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Sequence>,
}

impl Frame {
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Sequence::len)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> &[Sequence] {
        &self.columns
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Sequence> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    /// Materialize one row
    pub fn row(&self, index: usize) -> Option<Vec<Value>> {
        self.columns
            .iter()
            .map(|c| c.get(index).cloned())
            .collect()
    }
}

enum FrameState {
    Ready {
        writers: Vec<SequenceWriter>,
        history: HistoryBuffer<Vec<Value>>,
    },
    Closed {
        history: HistoryBuffer<Vec<Value>>,
    },
}

/// Builder for a [`Frame`] with declared column types
pub struct FrameBuilder {
    names: Vec<String>,
    types: Vec<LogicalType>,
    num_segments: usize,
    state: RwLock<FrameState>,
}

impl FrameBuilder {
    /// Create a ready builder
    ///
    /// Column names default to `X1`, `X2`, ...; when given there must be one
    /// per type. Every column needs a concrete (non-null) type.
    pub fn new(
        column_types: Vec<LogicalType>,
        column_names: Option<Vec<String>>,
        num_segments: usize,
        history_size: usize,
    ) -> SequinResult<Self> {
        if column_types.is_empty() {
            return Err(SequinError::InvalidArgument(
                "Column types must be defined".to_string(),
            ));
        }
        if let Some(position) = column_types.iter().position(LogicalType::is_null) {
            return Err(SequinError::InvalidArgument(format!(
                "Column {} has no concrete type",
                position + 1
            )));
        }
        let names = match column_names {
            Some(names) if names.len() != column_types.len() => {
                return Err(SequinError::InvalidArgument(format!(
                    "Got {} column names for {} column types",
                    names.len(),
                    column_types.len()
                )))
            }
            Some(names) => names,
            None => (1..=column_types.len())
                .map(|i| format!("{}{}", DEFAULT_COLUMN_PREFIX, i))
                .collect(),
        };

        let writers = column_types
            .iter()
            .map(|_| SequenceWriter::open_for_write(num_segments))
            .collect::<SequinResult<Vec<_>>>()?;
        debug!(columns = column_types.len(), num_segments, history_size, "frame builder initialized");

        Ok(Self {
            names,
            types: column_types,
            num_segments,
            state: RwLock::new(FrameState::Ready {
                writers,
                history: HistoryBuffer::new(history_size),
            }),
        })
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Declared column types
    pub fn column_types(&self) -> &[LogicalType] {
        &self.types
    }

    pub fn num_segments(&self) -> usize {
        self.num_segments
    }

    fn coerce_row(&self, row: Vec<Value>) -> SequinResult<Vec<Value>> {
        if row.len() != self.types.len() {
            return Err(SequinError::InvalidArgument(format!(
                "Row has {} values, frame has {} columns",
                row.len(),
                self.types.len()
            )));
        }
        row.iter()
            .zip(&self.types)
            .map(|(cell, column_type)| cell.cast_to(column_type))
            .collect()
    }

    fn check_segment(&self, segment: usize) -> SequinResult<()> {
        if segment >= self.num_segments {
            return Err(SequinError::InvalidSegment {
                segment,
                num_segments: self.num_segments,
            });
        }
        Ok(())
    }

    /// Append one row to `segment`; the whole row is rejected on any bad cell
    pub fn append(&self, row: Vec<Value>, segment: usize) -> SequinResult<()> {
        self.append_multiple(vec![row], segment).map(|_| ())
    }

    /// Append rows to `segment`, all or nothing
    pub fn append_multiple<I>(&self, rows: I, segment: usize) -> SequinResult<usize>
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        let state = self.state.read();
        let FrameState::Ready { writers, history } = &*state else {
            return Err(SequinError::state("frame builder is closed"));
        };
        self.check_segment(segment)?;

        let rows = rows
            .into_iter()
            .map(|row| self.coerce_row(row))
            .collect::<SequinResult<Vec<_>>>()
            .inspect_err(|err| debug!(segment, error = %err, "rows rejected"))?;

        // Column cursors are locked in column order.
        let mut cursors = writers
            .iter()
            .map(|w| w.get_output_cursor(segment))
            .collect::<SequinResult<Vec<_>>>()?;
        for row in &rows {
            for (cursor, cell) in cursors.iter_mut().zip(row) {
                cursor.write(cell.clone());
            }
        }
        history.extend(&rows);
        Ok(rows.len())
    }

    /// Up to `n` most recent rows, oldest first; `None` returns everything
    pub fn read_history(&self, n: Option<usize>) -> Vec<Vec<Value>> {
        match &*self.state.read() {
            FrameState::Ready { history, .. } | FrameState::Closed { history } => {
                history.snapshot(n)
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(&*self.state.read(), FrameState::Closed { .. })
    }

    /// Finalize every column
    pub fn close(&self) -> SequinResult<Frame> {
        let mut state = self.state.write();
        let previous = std::mem::replace(
            &mut *state,
            FrameState::Closed {
                history: HistoryBuffer::new(0),
            },
        );
        let (writers, history) = match previous {
            FrameState::Ready { writers, history } => (writers, history),
            closed @ FrameState::Closed { .. } => {
                *state = closed;
                return Err(SequinError::state("frame builder is already closed"));
            }
        };
        *state = FrameState::Closed { history };

        let columns = writers
            .into_iter()
            .zip(&self.types)
            .map(|(writer, column_type)| writer.close(*column_type))
            .collect::<SequinResult<Vec<_>>>()?;
        debug!(
            rows = columns.first().map_or(0, Sequence::len),
            columns = columns.len(),
            "frame builder closed"
        );
        Ok(Frame {
            names: self.names.clone(),
            columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(i: i64) -> Vec<Value> {
        vec![Value::from(i), Value::from(i)]
    }

    fn stored_row(i: i64) -> Vec<Value> {
        vec![Value::Integer(i), Value::Float(i as f64)]
    }

    #[test]
    fn test_frame_builder_basic() {
        let builder =
            FrameBuilder::new(vec![LogicalType::Integer, LogicalType::Float], None, 1, 10).unwrap();
        assert_eq!(builder.column_names(), &["X1".to_string(), "X2".to_string()]);

        builder.append_multiple((0..3).map(row), 0).unwrap();
        let frame = builder.close().unwrap();
        assert_eq!(frame.num_rows(), 3);
        assert_eq!(frame.num_columns(), 2);
        assert_eq!(frame.column("X2").unwrap().get_type(), LogicalType::Float);
        assert_eq!(frame.row(1), Some(vec![Value::Integer(1), Value::Float(1.0)]));
        assert_eq!(frame.row(3), None);
    }

    #[test]
    fn test_frame_builder_argument_checks() {
        assert!(FrameBuilder::new(vec![], None, 1, 10).is_err());
        assert!(FrameBuilder::new(
            vec![LogicalType::Integer],
            Some(vec!["a".to_string(), "b".to_string()]),
            1,
            10
        )
        .is_err());
        assert!(FrameBuilder::new(vec![LogicalType::Null], None, 1, 10).is_err());
        assert!(FrameBuilder::new(vec![LogicalType::Integer], None, 0, 10).is_err());
    }

    #[test]
    fn test_frame_builder_rejects_bad_rows() {
        let builder = FrameBuilder::new(
            vec![LogicalType::Integer, LogicalType::String],
            Some(vec!["id".to_string(), "name".to_string()]),
            2,
            10,
        )
        .unwrap();
        assert!(matches!(
            builder.append(vec![Value::from(1)], 0),
            Err(SequinError::InvalidArgument(_))
        ));
        assert!(matches!(
            builder.append(vec![Value::from(1), Value::from(2)], 0),
            Err(SequinError::TypeMismatch(_))
        ));
        assert!(matches!(
            builder.append(vec![Value::from(1), Value::from("a")], 2),
            Err(SequinError::InvalidSegment { .. })
        ));
        assert!(builder
            .append_multiple(
                vec![
                    vec![Value::from(1), Value::from("a")],
                    vec![Value::from("b"), Value::from("b")],
                ],
                1
            )
            .is_err());
        assert!(builder.read_history(None).is_empty());

        builder.append(vec![Value::from(2), Value::Null], 1).unwrap();
        builder.append(vec![Value::from(1), Value::from("a")], 0).unwrap();
        let frame = builder.close().unwrap();
        assert_eq!(
            frame.column("id").unwrap().to_vec(),
            vec![Value::Integer(1), Value::Integer(2)]
        );
        assert_eq!(
            frame.column("name").unwrap().to_vec(),
            vec![Value::from("a"), Value::Null]
        );
    }

    #[test]
    fn test_frame_builder_history_and_close() {
        let builder =
            FrameBuilder::new(vec![LogicalType::Integer, LogicalType::Float], None, 1, 10).unwrap();
        builder.append_multiple((0..8).map(row), 0).unwrap();
        assert_eq!(
            builder.read_history(Some(3)),
            (5..8).map(stored_row).collect::<Vec<_>>()
        );

        builder.append_multiple((0..5).map(row), 0).unwrap();
        let expected: Vec<Vec<Value>> = [3, 4, 5, 6, 7, 0, 1, 2, 3, 4]
            .into_iter()
            .map(stored_row)
            .collect();
        assert_eq!(builder.read_history(Some(10)), expected);

        builder.close().unwrap();
        assert!(builder.is_closed());
        assert_eq!(builder.read_history(Some(10)), expected);
        assert!(matches!(builder.close(), Err(SequinError::State(_))));
        assert!(matches!(
            builder.append(row(1), 0),
            Err(SequinError::State(_))
        ));
    }
}
