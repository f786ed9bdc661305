//! Output type resolution for builders
//!
//! Without a declared type the first non-null kind fixes the sequence type
//! and any later kind is a conflict; kinds are never promoted. With a
//! declared type every non-null value is coerced to it.

use crate::common::error::{SequinError, SequinResult};
use crate::types::{LogicalType, Value};
use std::collections::BTreeSet;

/// Tracks the resolved element type and the input kinds seen so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeResolver {
    declared: Option<LogicalType>,
    resolved: Option<LogicalType>,
    observed: BTreeSet<LogicalType>,
}

impl TypeResolver {
    /// Create a resolver; a declared `Null` type means "infer"
    pub fn new(declared: Option<LogicalType>) -> Self {
        let declared = declared.filter(|t| !t.is_null());
        Self {
            declared,
            resolved: declared,
            observed: BTreeSet::new(),
        }
    }

    /// Declared type, if one was given
    pub fn declared_type(&self) -> Option<LogicalType> {
        self.declared
    }

    /// Current element type; `None` until a non-null value arrives
    pub fn resolved_type(&self) -> Option<LogicalType> {
        self.resolved
    }

    /// Distinct non-null kinds accepted so far
    pub fn observed_types(&self) -> &BTreeSet<LogicalType> {
        &self.observed
    }

    /// Validate `value`, commit its kind and return the cell to store
    ///
    /// State is only updated when the value is accepted.
    pub fn admit(&mut self, value: Value) -> SequinResult<Value> {
        if value.is_null() {
            return Ok(value);
        }
        let kind = value.get_type();

        let stored = match (self.declared, self.resolved) {
            (Some(declared), _) => value.cast_to(&declared).map_err(|_| {
                SequinError::type_mismatch(format!(
                    "Cannot append {} value {} to a sequence declared as {}",
                    kind, value, declared
                ))
            })?,
            (None, Some(resolved)) if resolved != kind => {
                return Err(SequinError::TypeConflict {
                    resolved,
                    found: kind,
                })
            }
            (None, _) => {
                self.resolved = Some(kind);
                value
            }
        };
        self.observed.insert(kind);
        Ok(stored)
    }

    /// Admit a whole batch or nothing
    pub fn admit_all(&mut self, values: Vec<Value>) -> SequinResult<Vec<Value>> {
        let mut scratch = self.clone();
        let admitted = values
            .into_iter()
            .map(|v| scratch.admit(v))
            .collect::<SequinResult<Vec<_>>>()?;
        *self = scratch;
        Ok(admitted)
    }
}
