//! Incremental sequence builder
//!
//! A builder goes through three states:
//! - `Uninitialized`: only `init` is legal
//! - `Ready`: values may be appended to any of its segments
//! - `Closed`: terminal; type and history stay readable
//!
//! All methods take `&self`. Appends hold the read side of the lifecycle
//! lock and `init`/`close` the write side, so `close` observes every append
//! that started before it. Each segment has its own cursor lock, the type
//! resolver and the history buffer are each guarded by one mutex. Locks are
//! always taken in the order cursor, resolver, history.

use crate::builder::history::HistoryBuffer;
use crate::builder::type_resolver::TypeResolver;
use crate::common::constants::{DEFAULT_HISTORY_SIZE, DEFAULT_NUM_SEGMENTS};
use crate::common::error::{SequinError, SequinResult};
use crate::storage::{Sequence, SequenceWriter};
use crate::types::{LogicalType, Value};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Parameters accepted by [`SequenceBuilder::init_with`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderOptions {
    /// Number of independent append segments
    pub num_segments: usize,
    /// Capacity of the history buffer (0 disables it)
    pub history_size: usize,
    /// Element type every value is coerced to; `None` infers it
    pub declared_type: Option<LogicalType>,
}

impl BuilderOptions {
    pub fn new(num_segments: usize, history_size: usize, declared_type: Option<LogicalType>) -> Self {
        Self {
            num_segments,
            history_size,
            declared_type,
        }
    }
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            num_segments: DEFAULT_NUM_SEGMENTS,
            history_size: DEFAULT_HISTORY_SIZE,
            declared_type: None,
        }
    }
}

struct ReadyState {
    writer: SequenceWriter,
    resolver: Mutex<TypeResolver>,
    history: HistoryBuffer<Value>,
}

struct ClosedState {
    resolver: TypeResolver,
    history: HistoryBuffer<Value>,
}

enum BuilderState {
    Uninitialized,
    Ready(ReadyState),
    Closed(ClosedState),
}

impl BuilderState {
    fn ready(&self) -> SequinResult<&ReadyState> {
        match self {
            BuilderState::Ready(ready) => Ok(ready),
            BuilderState::Uninitialized => Err(SequinError::state("builder is not initialized")),
            BuilderState::Closed(_) => Err(SequinError::state("builder is closed")),
        }
    }
}

/// Stateful accumulator producing one immutable [`Sequence`]
pub struct SequenceBuilder {
    state: RwLock<BuilderState>,
}

impl SequenceBuilder {
    /// Create an uninitialized builder
    pub fn new() -> Self {
        Self {
            state: RwLock::new(BuilderState::Uninitialized),
        }
    }

    /// Create and initialize a builder in one step
    pub fn with_options(options: &BuilderOptions) -> SequinResult<Self> {
        let builder = Self::new();
        builder.init_with(options)?;
        Ok(builder)
    }

    /// Allocate segments and history; legal only once
    pub fn init(
        &self,
        num_segments: usize,
        history_size: usize,
        declared_type: Option<LogicalType>,
    ) -> SequinResult<()> {
        let mut state = self.state.write();
        match &*state {
            BuilderState::Uninitialized => {}
            BuilderState::Ready(_) => {
                return Err(SequinError::state("builder is already initialized"))
            }
            BuilderState::Closed(_) => return Err(SequinError::state("builder is closed")),
        }

        let writer = SequenceWriter::open_for_write(num_segments)?;
        debug!(num_segments, history_size, declared_type = ?declared_type, "builder initialized");
        *state = BuilderState::Ready(ReadyState {
            writer,
            resolver: Mutex::new(TypeResolver::new(declared_type)),
            history: HistoryBuffer::new(history_size),
        });
        Ok(())
    }

    /// [`init`](Self::init) from an options struct
    pub fn init_with(&self, options: &BuilderOptions) -> SequinResult<()> {
        self.init(options.num_segments, options.history_size, options.declared_type)
    }

    /// Append one value to `segment`
    ///
    /// A rejected value leaves the builder untouched.
    pub fn append(&self, value: impl Into<Value>, segment: usize) -> SequinResult<()> {
        let state = self.state.read();
        let ready = state.ready()?;

        let mut cursor = ready.writer.get_output_cursor(segment)?;
        let stored = ready
            .resolver
            .lock()
            .admit(value.into())
            .inspect_err(|err| debug!(segment, error = %err, "append rejected"))?;
        cursor.write(stored.clone());
        ready.history.push(stored);
        Ok(())
    }

    /// Append a batch to `segment`, all or nothing
    ///
    /// Every value is validated before any is written. On the first invalid
    /// value the batch is rejected with that value's error and nothing is
    /// written, resolved or recorded in history. Returns the number of values
    /// appended.
    pub fn append_multiple<I>(&self, values: I, segment: usize) -> SequinResult<usize>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let state = self.state.read();
        let ready = state.ready()?;

        let mut cursor = ready.writer.get_output_cursor(segment)?;
        let batch_len = values.len();
        let stored = ready
            .resolver
            .lock()
            .admit_all(values)
            .inspect_err(|err| debug!(segment, batch_len, error = %err, "batch rejected"))?;
        cursor.reserve(stored.len());
        cursor.write_all(stored.iter().cloned());
        ready.history.extend(&stored);
        Ok(stored.len())
    }

    /// Resolved element type; `None` before any non-null value (or before init)
    pub fn get_type(&self) -> Option<LogicalType> {
        match &*self.state.read() {
            BuilderState::Uninitialized => None,
            BuilderState::Ready(ready) => ready.resolver.lock().resolved_type(),
            BuilderState::Closed(closed) => closed.resolver.resolved_type(),
        }
    }

    /// Distinct non-null input kinds accepted so far
    pub fn observed_types(&self) -> BTreeSet<LogicalType> {
        match &*self.state.read() {
            BuilderState::Uninitialized => BTreeSet::new(),
            BuilderState::Ready(ready) => ready.resolver.lock().observed_types().clone(),
            BuilderState::Closed(closed) => closed.resolver.observed_types().clone(),
        }
    }

    /// Up to `n` most recently appended values, oldest first
    ///
    /// `None` returns everything retained. Never returns more than
    /// `min(n, history_size, appends so far)` values.
    pub fn read_history(&self, n: Option<usize>) -> SequinResult<Vec<Value>> {
        match &*self.state.read() {
            BuilderState::Uninitialized => Err(SequinError::state("builder is not initialized")),
            BuilderState::Ready(ready) => Ok(ready.history.snapshot(n)),
            BuilderState::Closed(closed) => Ok(closed.history.snapshot(n)),
        }
    }

    /// Number of segments, once initialized
    pub fn num_segments(&self) -> SequinResult<usize> {
        let state = self.state.read();
        Ok(state.ready()?.writer.num_segments())
    }

    /// Number of values appended so far
    pub fn len(&self) -> SequinResult<usize> {
        let state = self.state.read();
        Ok(state.ready()?.writer.len())
    }

    pub fn is_closed(&self) -> bool {
        matches!(&*self.state.read(), BuilderState::Closed(_))
    }

    /// Finalize all segments into one immutable sequence
    ///
    /// Segments are concatenated by index. The element type is the resolved
    /// type, or `Null` when no non-null value was appended.
    pub fn close(&self) -> SequinResult<Sequence> {
        let mut state = self.state.write();
        state.ready()?;

        let BuilderState::Ready(ready) = std::mem::replace(&mut *state, BuilderState::Uninitialized)
        else {
            return Err(SequinError::state("builder is not ready"));
        };
        let resolver = ready.resolver.into_inner();
        let element_type = resolver.resolved_type().unwrap_or(LogicalType::Null);
        let result = ready.writer.close(element_type);
        *state = BuilderState::Closed(ClosedState {
            resolver,
            history: ready.history,
        });

        if let Ok(sequence) = &result {
            debug!(rows = sequence.len(), element_type = %element_type, "builder closed");
        }
        result
    }
}

impl Default for SequenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_builder() -> SequenceBuilder {
        SequenceBuilder::with_options(&BuilderOptions::default()).unwrap()
    }

    #[test]
    fn test_lifecycle_errors() {
        let builder = SequenceBuilder::new();
        assert!(matches!(builder.append(1, 0), Err(SequinError::State(_))));
        assert!(matches!(builder.close(), Err(SequinError::State(_))));
        assert!(matches!(builder.read_history(None), Err(SequinError::State(_))));
        assert_eq!(builder.get_type(), None);

        builder.init(1, 10, None).unwrap();
        assert!(matches!(builder.init(1, 10, None), Err(SequinError::State(_))));

        builder.append(1, 0).unwrap();
        let seq = builder.close().unwrap();
        assert_eq!(seq.len(), 1);

        assert!(matches!(builder.close(), Err(SequinError::State(_))));
        assert!(matches!(builder.append(2, 0), Err(SequinError::State(_))));
        assert!(matches!(
            builder.append_multiple(vec![2, 3], 0),
            Err(SequinError::State(_))
        ));
        assert!(matches!(builder.init(1, 10, None), Err(SequinError::State(_))));
        assert!(builder.is_closed());
    }

    #[test]
    fn test_init_rejects_zero_segments() {
        let builder = SequenceBuilder::new();
        assert!(matches!(
            builder.init(0, 10, None),
            Err(SequinError::InvalidArgument(_))
        ));
        builder.init(2, 10, None).unwrap();
        assert_eq!(builder.num_segments().unwrap(), 2);
    }

    #[test]
    fn test_invalid_segment_has_no_side_effect() {
        let builder = ready_builder();
        assert!(matches!(
            builder.append("x", 1),
            Err(SequinError::InvalidSegment {
                segment: 1,
                num_segments: 1
            })
        ));
        assert_eq!(builder.get_type(), None);
        assert!(builder.read_history(None).unwrap().is_empty());
        assert_eq!(builder.len().unwrap(), 0);
    }

    #[test]
    fn test_type_conflict() {
        let builder = ready_builder();
        assert_eq!(builder.get_type(), None);
        builder.append(Value::Null, 0).unwrap();
        assert_eq!(builder.get_type(), None);
        builder.append(1, 0).unwrap();
        assert_eq!(builder.get_type(), Some(LogicalType::Integer));

        assert!(matches!(
            builder.append("x", 0),
            Err(SequinError::TypeConflict { .. })
        ));
        assert_eq!(builder.read_history(None).unwrap(), vec![Value::Null, Value::from(1)]);

        let seq = builder.close().unwrap();
        assert_eq!(seq.to_vec(), vec![Value::Null, Value::Integer(1)]);
        assert_eq!(seq.get_type(), LogicalType::Integer);
    }

    #[test]
    fn test_all_null_sequence() {
        let builder = ready_builder();
        builder.append_multiple(vec![Value::Null, Value::Null], 0).unwrap();
        let seq = builder.close().unwrap();
        assert_eq!(seq.get_type(), LogicalType::Null);
        assert_eq!(seq.len(), 2);
        assert_eq!(builder.get_type(), None);
    }

    #[test]
    fn test_declared_type() {
        let builder = SequenceBuilder::new();
        builder.init(1, 10, Some(LogicalType::Float)).unwrap();
        assert_eq!(builder.get_type(), Some(LogicalType::Float));

        builder.append(1, 0).unwrap();
        builder.append(2.5, 0).unwrap();
        assert!(matches!(
            builder.append("x", 0),
            Err(SequinError::TypeMismatch(_))
        ));

        let seq = builder.close().unwrap();
        assert_eq!(seq.get_type(), LogicalType::Float);
        assert_eq!(seq.to_vec(), vec![Value::Float(1.0), Value::Float(2.5)]);
        assert_eq!(
            builder.observed_types().into_iter().collect::<Vec<_>>(),
            vec![LogicalType::Integer, LogicalType::Float]
        );
    }

    #[test]
    fn test_append_multiple_all_or_nothing() {
        let builder = ready_builder();
        builder.append(1, 0).unwrap();

        let result = builder.append_multiple(
            vec![Value::from(2), Value::from(3), Value::from("bad"), Value::from(4)],
            0,
        );
        assert!(matches!(result, Err(SequinError::TypeConflict { .. })));
        assert_eq!(builder.len().unwrap(), 1);
        assert_eq!(builder.read_history(None).unwrap(), vec![Value::from(1)]);

        assert_eq!(builder.append_multiple(vec![2, 3], 0).unwrap(), 2);
        assert_eq!(
            builder.close().unwrap().to_vec(),
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]
        );
    }

    #[test]
    fn test_batch_rejection_does_not_resolve_type() {
        let builder = ready_builder();
        assert!(builder
            .append_multiple(vec![Value::from("a"), Value::from(1)], 0)
            .is_err());
        assert_eq!(builder.get_type(), None);
        builder.append(7, 0).unwrap();
        assert_eq!(builder.get_type(), Some(LogicalType::Integer));
    }

    #[test]
    fn test_history_spans_segments() {
        let builder = SequenceBuilder::new();
        builder.init(2, 3, None).unwrap();
        builder.append(1, 1).unwrap();
        builder.append(2, 0).unwrap();
        builder.append(3, 1).unwrap();
        builder.append(4, 0).unwrap();

        assert_eq!(
            builder.read_history(None).unwrap(),
            vec![Value::from(2), Value::from(3), Value::from(4)]
        );
        assert_eq!(builder.read_history(Some(1)).unwrap(), vec![Value::from(4)]);

        let seq = builder.close().unwrap();
        assert_eq!(
            seq.to_vec(),
            vec![
                Value::Integer(2),
                Value::Integer(4),
                Value::Integer(1),
                Value::Integer(3)
            ]
        );
        assert_eq!(builder.read_history(Some(2)).unwrap().len(), 2);
    }

    #[test]
    fn test_history_disabled() {
        let builder = SequenceBuilder::new();
        builder.init(1, 0, None).unwrap();
        builder.append_multiple(vec![1, 2, 3], 0).unwrap();
        assert!(builder.read_history(None).unwrap().is_empty());
        assert_eq!(builder.close().unwrap().len(), 3);
    }
}
