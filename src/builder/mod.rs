//! Incremental builders for sequin
//!
//! This module provides the stateful accumulators that produce immutable
//! sequences and frames:
//! - SequenceBuilder: one column, with type resolution and append history
//! - FrameBuilder: several columns with declared types, appended by row
//! - HistoryBuffer: bounded record of the most recent appends
//! - TypeResolver: decides and enforces the element type of a builder

pub mod frame_builder;
pub mod history;
pub mod sequence_builder;
pub mod type_resolver;

pub use frame_builder::{Frame, FrameBuilder};
pub use history::HistoryBuffer;
pub use sequence_builder::{BuilderOptions, SequenceBuilder};
pub use type_resolver::TypeResolver;
