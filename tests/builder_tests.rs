//! Integration tests for the incremental builders
//!
//! These tests cover segment ordering, type resolution, history bounds and
//! the builder lifecycle, including appends from several threads.

use pretty_assertions::assert_eq;
use sequin::{
    BuilderOptions, ErrorCategory, FrameBuilder, LogicalType, SequenceBuilder, SequinError,
    SequinResult, Value,
};
use std::sync::Arc;
use std::thread;

fn builder(num_segments: usize, history_size: usize) -> SequinResult<SequenceBuilder> {
    SequenceBuilder::with_options(&BuilderOptions::new(num_segments, history_size, None))
}

#[test]
fn test_segments_concatenate_by_index() -> SequinResult<()> {
    let builder = builder(4, 10)?;

    // Fill the segments out of order; the result is ordered by segment.
    for segment in [2, 0, 3, 1] {
        let base = segment as i64 * 100;
        builder.append_multiple(base..base + 5, segment)?;
    }
    builder.append(4, 0)?;

    let sequence = builder.close()?;
    let mut expected: Vec<Value> = (0..5).map(Value::from).collect();
    expected.push(Value::from(4));
    for segment in 1..4i64 {
        expected.extend((segment * 100..segment * 100 + 5).map(Value::from));
    }
    assert_eq!(sequence.len(), 21);
    assert_eq!(sequence.to_vec(), expected);
    assert_eq!(sequence.get_type(), LogicalType::Integer);
    Ok(())
}

#[test]
fn test_concurrent_appends_per_segment() -> SequinResult<()> {
    let num_threads = 8;
    let per_thread = 500i64;
    let builder = Arc::new(builder(num_threads, 16)?);

    let handles: Vec<_> = (0..num_threads)
        .map(|segment| {
            let builder = Arc::clone(&builder);
            thread::spawn(move || -> SequinResult<()> {
                let base = segment as i64 * per_thread;
                for value in base..base + per_thread {
                    builder.append(value, segment)?;
                }
                Ok(())
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("append thread panicked")?;
    }

    assert_eq!(builder.read_history(None)?.len(), 16);
    let sequence = builder.close()?;
    let expected: Vec<Value> = (0..num_threads as i64 * per_thread).map(Value::from).collect();
    assert_eq!(sequence.to_vec(), expected);
    Ok(())
}

#[test]
fn test_close_waits_for_racing_appends() -> SequinResult<()> {
    let builder = Arc::new(builder(2, 0)?);
    let writer = {
        let builder = Arc::clone(&builder);
        thread::spawn(move || {
            let mut accepted = 0usize;
            for value in 0..10_000i64 {
                match builder.append(value, 1) {
                    Ok(()) => accepted += 1,
                    Err(err) => {
                        assert_eq!(err.category(), ErrorCategory::State);
                        break;
                    }
                }
            }
            accepted
        })
    };

    builder.append(-1, 0)?;
    let sequence = builder.close()?;
    let accepted = writer.join().expect("append thread panicked");

    // Every accepted append is in the result and nothing lands after close.
    assert_eq!(sequence.len(), accepted + 1);
    assert_eq!(sequence.get(0), Some(&Value::Integer(-1)));
    Ok(())
}

#[test]
fn test_type_conflicts_are_rejected() -> SequinResult<()> {
    let builder = builder(2, 10)?;
    builder.append(Value::Null, 0)?;
    assert_eq!(builder.get_type(), None);

    builder.append(1.5, 1)?;
    assert_eq!(builder.get_type(), Some(LogicalType::Float));

    let err = builder.append(2, 0).unwrap_err();
    assert!(matches!(
        err,
        SequinError::TypeConflict {
            resolved: LogicalType::Float,
            found: LogicalType::Integer
        }
    ));

    // A rejected batch leaves no trace.
    assert!(builder
        .append_multiple(vec![Value::from(2.5), Value::from("x")], 0)
        .is_err());
    assert_eq!(builder.len()?, 2);
    assert_eq!(builder.read_history(None)?, vec![Value::Null, Value::Float(1.5)]);

    let sequence = builder.close()?;
    assert_eq!(sequence.get_type(), LogicalType::Float);
    assert_eq!(sequence.to_vec(), vec![Value::Null, Value::Float(1.5)]);
    Ok(())
}

#[test]
fn test_declared_type_coerces_inputs() -> SequinResult<()> {
    let builder = SequenceBuilder::new();
    builder.init(1, 10, Some(LogicalType::Float))?;
    assert_eq!(builder.get_type(), Some(LogicalType::Float));

    builder.append_multiple(vec![Value::from(1), Value::from(2.5), Value::Null], 0)?;
    assert!(matches!(
        builder.append("three", 0),
        Err(SequinError::TypeMismatch(_))
    ));

    let sequence = builder.close()?;
    assert_eq!(
        sequence.to_vec(),
        vec![Value::Float(1.0), Value::Float(2.5), Value::Null]
    );
    assert_eq!(
        builder.observed_types().into_iter().collect::<Vec<_>>(),
        vec![LogicalType::Integer, LogicalType::Float]
    );
    Ok(())
}

#[test]
fn test_history_is_bounded() -> SequinResult<()> {
    let builder = builder(2, 10)?;
    builder.append_multiple(0..8i64, 0)?;

    let recent = builder.read_history(Some(3))?;
    assert_eq!(recent, vec![Value::from(5), Value::from(6), Value::from(7)]);
    assert_eq!(builder.read_history(Some(100))?.len(), 8);

    builder.append_multiple(0..5i64, 1)?;
    let expected: Vec<Value> = [3, 4, 5, 6, 7, 0, 1, 2, 3, 4]
        .into_iter()
        .map(Value::from)
        .collect();
    assert_eq!(builder.read_history(Some(10))?, expected);
    assert_eq!(builder.read_history(None)?, expected);
    assert!(builder.read_history(Some(0))?.is_empty());

    // History survives close.
    builder.close()?;
    assert_eq!(builder.read_history(Some(10))?, expected);
    Ok(())
}

#[test]
fn test_lifecycle() -> SequinResult<()> {
    let builder = SequenceBuilder::new();
    assert!(matches!(builder.append(1, 0), Err(SequinError::State(_))));

    builder.init(1, 10, None)?;
    assert!(matches!(
        builder.append(1, 1),
        Err(SequinError::InvalidSegment { segment: 1, num_segments: 1 })
    ));

    let sequence = builder.close()?;
    assert!(sequence.is_empty());
    assert_eq!(sequence.get_type(), LogicalType::Null);
    assert_eq!(builder.get_type(), None);

    assert!(matches!(builder.close(), Err(SequinError::State(_))));
    assert!(matches!(builder.append(1, 0), Err(SequinError::State(_))));
    Ok(())
}

#[test]
fn test_frame_builder_rows() -> SequinResult<()> {
    let builder = FrameBuilder::new(
        vec![LogicalType::Integer, LogicalType::String],
        None,
        2,
        2,
    )?;
    builder.append(vec![Value::from(2), Value::from("b")], 1)?;
    builder.append(vec![Value::from(1.0), Value::from("a")], 0)?;
    builder.append(vec![Value::from(3), Value::Null], 1)?;

    assert_eq!(
        builder.read_history(None),
        vec![
            vec![Value::Integer(1), Value::from("a")],
            vec![Value::Integer(3), Value::Null],
        ]
    );

    let frame = builder.close()?;
    assert_eq!(frame.column_names(), &["X1".to_string(), "X2".to_string()]);
    assert_eq!(frame.num_rows(), 3);
    assert_eq!(
        frame.row(0),
        Some(vec![Value::Integer(1), Value::from("a")])
    );
    assert_eq!(
        frame.column("X1").map(|c| c.to_vec()),
        Some(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
    );
    Ok(())
}
