//! Storage module for sequin
//!
//! This module provides the columnar storage collaborator:
//! - Immutable sequences with random access and iteration
//! - Segmented writers with one append cursor per segment

pub mod column;
pub mod writer;

pub use column::*;
pub use writer::*;
