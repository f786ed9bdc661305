//! Error handling for sequin

use crate::types::LogicalType;
use thiserror::Error;

/// Main error type for sequin operations
#[derive(Error, Debug)]
pub enum SequinError {
    #[error("Invalid window: window_end ({end}) must be >= window_start ({start})")]
    InvalidWindow { start: i64, end: i64 },

    #[error("Window too large: {size} cells exceeds the maximum of {max}")]
    WindowTooLarge { size: u128, max: u64 },

    #[error("Invalid segment {segment}: builder has {num_segments} segment(s)")]
    InvalidSegment { segment: usize, num_segments: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown aggregate function: {0}")]
    UnknownFunction(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Type conflict: sequence resolved to {resolved}, cannot append {found}")]
    TypeConflict {
        resolved: LogicalType,
        found: LogicalType,
    },

    #[error("State error: {0}")]
    State(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse error taxonomy used by callers that only care about the class of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad window bounds, oversize windows, invalid segments and arguments
    Validation,
    /// Unknown function names
    Lookup,
    /// Incompatible or heterogeneous kinds
    Type,
    /// Calls made in the wrong lifecycle state
    State,
    /// I/O and (de)serialization failures
    Io,
}

impl SequinError {
    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            SequinError::InvalidWindow { .. }
            | SequinError::WindowTooLarge { .. }
            | SequinError::InvalidSegment { .. }
            | SequinError::InvalidArgument(_)
            | SequinError::InvalidValue(_) => ErrorCategory::Validation,
            SequinError::UnknownFunction(_) => ErrorCategory::Lookup,
            SequinError::TypeMismatch(_) | SequinError::TypeConflict { .. } => ErrorCategory::Type,
            SequinError::State(_) => ErrorCategory::State,
            SequinError::Io(_) | SequinError::Serialization(_) => ErrorCategory::Io,
        }
    }

    /// Convenience constructor for lifecycle violations
    pub fn state(msg: impl Into<String>) -> Self {
        SequinError::State(msg.into())
    }

    /// Convenience constructor for type mismatches
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        SequinError::TypeMismatch(msg.into())
    }
}

/// Result type alias for sequin operations
pub type SequinResult<T> = std::result::Result<T, SequinError>;
