//! Execution Engine for sequin
//!
//! This module provides the operators that read a materialized sequence and
//! produce a new one, together with the morsel-driven parallel framework they
//! run on.

pub mod parallel;
pub mod rolling;

pub use parallel::*;
pub use rolling::*;
