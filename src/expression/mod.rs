//! Expression system for sequin
//!
//! This module provides the fixed registry of aggregate functions that
//! rolling windows reduce with.

pub mod aggregate;

pub use aggregate::*;
