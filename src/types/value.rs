use crate::common::error::{SequinError, SequinResult};
use crate::types::logical_type::LogicalType;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::fmt;

/// A single dynamically-typed cell of a sequence
///
/// Arithmetic and comparison are explicit methods rather than operator
/// overloads so that every cross-kind combination is spelled out:
/// - `Integer + Integer` stays `Integer` (checked; overflow is an error)
/// - `Integer + Float` and `Float + Float` give `Float`
/// - numbers compare with numbers, strings with strings, nothing else
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null/undefined marker
    Null,
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Dense numeric vector
    Vector(Vec<f64>),
    /// List of arbitrary cells
    List(Vec<Value>),
    /// Key/value pairs, insertion ordered
    Dict(Vec<(Value, Value)>),
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the logical type of this value
    pub fn get_type(&self) -> LogicalType {
        match self {
            Value::Null => LogicalType::Null,
            Value::Integer(_) => LogicalType::Integer,
            Value::Float(_) => LogicalType::Float,
            Value::String(_) => LogicalType::String,
            Value::Vector(_) => LogicalType::Vector,
            Value::List(_) => LogicalType::List,
            Value::Dict(_) => LogicalType::Dict,
        }
    }

    /// Try to extract an i64 value
    pub fn try_as_i64(&self) -> SequinResult<i64> {
        match self {
            Value::Integer(value) => Ok(*value),
            Value::Null => Err(SequinError::InvalidValue(
                "Cannot extract i64 from NULL".to_string(),
            )),
            _ => Err(SequinError::type_mismatch(format!(
                "Cannot extract i64 from {}",
                self.get_type()
            ))),
        }
    }

    /// Try to extract an f64 value, widening integers
    pub fn try_as_f64(&self) -> SequinResult<f64> {
        match self {
            Value::Float(value) => Ok(*value),
            Value::Integer(value) => Ok(*value as f64),
            Value::Null => Err(SequinError::InvalidValue(
                "Cannot extract f64 from NULL".to_string(),
            )),
            _ => Err(SequinError::type_mismatch(format!(
                "Cannot extract f64 from {}",
                self.get_type()
            ))),
        }
    }

    /// Try to borrow a string value
    pub fn try_as_str(&self) -> SequinResult<&str> {
        match self {
            Value::String(value) => Ok(value),
            Value::Null => Err(SequinError::InvalidValue(
                "Cannot extract string from NULL".to_string(),
            )),
            _ => Err(SequinError::type_mismatch(format!(
                "Cannot extract string from {}",
                self.get_type()
            ))),
        }
    }

    /// Add two numeric values
    pub fn add(&self, other: &Value) -> SequinResult<Value> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a
                .checked_add(*b)
                .map(Value::Integer)
                .ok_or_else(|| SequinError::InvalidValue(format!("Integer overflow in {} + {}", a, b))),
            (Value::Integer(a), Value::Float(b)) => Ok(Value::Float(*a as f64 + b)),
            (Value::Float(a), Value::Integer(b)) => Ok(Value::Float(a + *b as f64)),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
            _ => Err(SequinError::type_mismatch(format!(
                "Cannot add {} and {}",
                self.get_type(),
                other.get_type()
            ))),
        }
    }

    /// Compare two non-null values of compatible kinds
    ///
    /// Floats use a total order (NaN sorts above every other number).
    pub fn compare(&self, other: &Value) -> SequinResult<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Ok(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Ok(OrderedFloat(*a).cmp(&OrderedFloat(*b))),
            (Value::Integer(a), Value::Float(b)) => {
                Ok(OrderedFloat(*a as f64).cmp(&OrderedFloat(*b)))
            }
            (Value::Float(a), Value::Integer(b)) => {
                Ok(OrderedFloat(*a).cmp(&OrderedFloat(*b as f64)))
            }
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            _ => Err(SequinError::type_mismatch(format!(
                "Cannot compare {} and {}",
                self.get_type(),
                other.get_type()
            ))),
        }
    }

    /// Coerce this value to a target type
    ///
    /// Null coerces to anything. Besides identity the accepted conversions
    /// are INTEGER -> FLOAT, integral FLOAT -> INTEGER, VECTOR -> LIST and a
    /// LIST of numbers -> VECTOR.
    pub fn cast_to(&self, target_type: &LogicalType) -> SequinResult<Value> {
        if self.is_null() || &self.get_type() == target_type {
            return Ok(self.clone());
        }

        match (self, target_type) {
            (Value::Integer(v), LogicalType::Float) => Ok(Value::Float(*v as f64)),
            (Value::Float(v), LogicalType::Integer)
                if v.is_finite()
                    && v.fract() == 0.0
                    && *v >= i64::MIN as f64
                    && *v < i64::MAX as f64 =>
            {
                Ok(Value::Integer(*v as i64))
            }
            (Value::Vector(values), LogicalType::List) => Ok(Value::List(
                values.iter().map(|v| Value::Float(*v)).collect(),
            )),
            (Value::List(values), LogicalType::Vector) => values
                .iter()
                .map(|v| v.try_as_f64())
                .collect::<SequinResult<Vec<f64>>>()
                .map(Value::Vector)
                .map_err(|_| {
                    SequinError::type_mismatch(format!("Cannot cast {} to VECTOR", self))
                }),
            _ => Err(SequinError::type_mismatch(format!(
                "Cannot cast {} of type {} to {}",
                self,
                self.get_type(),
                target_type
            ))),
        }
    }

    /// Convert a JSON document into a cell
    ///
    /// Integral JSON numbers become INTEGER, other numbers FLOAT, arrays LIST
    /// and objects DICT with STRING keys. Booleans have no cell kind and are
    /// rejected.
    pub fn from_json(json: &serde_json::Value) -> SequinResult<Value> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => {
                return Err(SequinError::InvalidValue(format!(
                    "JSON boolean {} has no cell representation",
                    b
                )))
            }
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::List(
                items
                    .iter()
                    .map(Value::from_json)
                    .collect::<SequinResult<_>>()?,
            ),
            serde_json::Value::Object(map) => Value::Dict(
                map.iter()
                    .map(|(k, v)| Ok((Value::String(k.clone()), Value::from_json(v)?)))
                    .collect::<SequinResult<_>>()?,
            ),
        })
    }

    /// Convert this cell into a JSON document
    ///
    /// Non-finite floats become JSON null and dict keys are rendered with
    /// `Display` unless they are already strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Vector(values) => serde_json::Value::Array(
                values.iter().map(|v| Value::Float(*v).to_json()).collect(),
            ),
            Value::List(values) => {
                serde_json::Value::Array(values.iter().map(Value::to_json).collect())
            }
            Value::Dict(pairs) => serde_json::Value::Object(
                pairs
                    .iter()
                    .map(|(k, v)| {
                        let key = match k {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (key, v.to_json())
                    })
                    .collect(),
            ),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<f64>> for Value {
    fn from(values: Vec<f64>) -> Self {
        Value::Vector(values)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", value),
            Value::String(value) => write!(f, "'{}'", value),
            Value::Vector(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
            Value::List(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
            Value::Dict(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
