//! Type system module for sequin
//!
//! This module contains the core type system components:
//! - LogicalType: the element-kind tag set, including the null tag
//! - Value: single dynamically-typed cells with explicit arithmetic

pub mod logical_type;
pub mod value;

// Re-export main types for convenience
pub use logical_type::LogicalType;
pub use value::Value;

/// Type system utilities
pub mod utils {
    use super::*;

    /// Infer the single element type shared by all non-null values
    ///
    /// Returns `Ok(None)` when every value is null and an error naming both
    /// kinds when two different non-null kinds are present.
    pub fn infer_element_type(values: &[Value]) -> crate::common::SequinResult<Option<LogicalType>> {
        let mut resolved: Option<LogicalType> = None;
        for value in values.iter().filter(|v| !v.is_null()) {
            let kind = value.get_type();
            match resolved {
                None => resolved = Some(kind),
                Some(existing) if existing != kind => {
                    return Err(crate::common::SequinError::type_mismatch(format!(
                        "Sequence mixes {} and {} values",
                        existing, kind
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(resolved)
    }
}
