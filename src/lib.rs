//! Sequin - rolling aggregates and incremental builders over columnar sequences
//!
//! Sequin works on immutable, null-aware, single-typed sequences of cells.
//! It provides two things:
//! - a rolling-window scanner that reduces a moving window with one of a
//!   fixed set of aggregates, producing a sequence of the same length
//! - incremental builders that accept values (or rows) into several
//!   segments, possibly from different threads, resolve the element type
//!   and remember the most recent appends
pub mod builder;
pub mod common;
pub mod config;
pub mod execution;
pub mod expression;
pub mod storage;
pub mod types;

// Re-export common types for convenience
pub use common::{ErrorCategory, SequinError, SequinResult};

// Re-export type system for convenience
pub use types::{LogicalType, Value};

// Re-export storage system for convenience
pub use storage::{OutputCursor, Sequence, SequenceWriter};

// Re-export the aggregate registry and rolling scanner
pub use execution::{rolling_apply, rolling_output_type, ParallelContext, RollingApply, RollingConfig};
pub use expression::AggregateFunction;

// Re-export builders for convenience
pub use builder::{BuilderOptions, Frame, FrameBuilder, SequenceBuilder};

pub use config::SequinConfig;
