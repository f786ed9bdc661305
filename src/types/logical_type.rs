use crate::common::error::{SequinError, SequinResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Element kinds a sequence cell can carry
/// `Null` doubles as the type of a sequence that holds no non-null cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    /// Null/undefined marker
    Null,
    /// 64-bit signed integer
    Integer,
    /// 64-bit floating point
    Float,
    /// UTF-8 string
    String,
    /// Dense numeric vector
    Vector,
    /// Heterogeneous list of cells
    List,
    /// Key/value pairs of cells
    Dict,
}

impl LogicalType {
    /// Check if this type is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self, LogicalType::Integer | LogicalType::Float)
    }

    /// Check if cells of this type have a total order usable by min/max
    pub fn is_orderable(&self) -> bool {
        matches!(
            self,
            LogicalType::Integer | LogicalType::Float | LogicalType::String
        )
    }

    /// Check if this type is a nested type (contains other cells)
    pub fn is_nested(&self) -> bool {
        matches!(
            self,
            LogicalType::Vector | LogicalType::List | LogicalType::Dict
        )
    }

    /// Check if this is the null tag
    pub fn is_null(&self) -> bool {
        matches!(self, LogicalType::Null)
    }

    /// Upper-case display name
    pub fn name(&self) -> &'static str {
        match self {
            LogicalType::Null => "NULL",
            LogicalType::Integer => "INTEGER",
            LogicalType::Float => "FLOAT",
            LogicalType::String => "STRING",
            LogicalType::Vector => "VECTOR",
            LogicalType::List => "LIST",
            LogicalType::Dict => "DICT",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogicalType {
    type Err = SequinError;

    fn from_str(s: &str) -> SequinResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "null" | "none" | "undefined" => Ok(LogicalType::Null),
            "int" | "integer" | "bigint" => Ok(LogicalType::Integer),
            "float" | "double" => Ok(LogicalType::Float),
            "str" | "string" | "varchar" => Ok(LogicalType::String),
            "vector" | "array" => Ok(LogicalType::Vector),
            "list" => Ok(LogicalType::List),
            "dict" | "map" => Ok(LogicalType::Dict),
            other => Err(SequinError::InvalidArgument(format!(
                "Unknown type name '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_properties() {
        assert!(LogicalType::Integer.is_numeric());
        assert!(LogicalType::Float.is_numeric());
        assert!(!LogicalType::String.is_numeric());

        assert!(LogicalType::String.is_orderable());
        assert!(!LogicalType::List.is_orderable());

        assert!(LogicalType::Dict.is_nested());
        assert!(LogicalType::Null.is_null());
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!("int".parse::<LogicalType>().unwrap(), LogicalType::Integer);
        assert_eq!("Double".parse::<LogicalType>().unwrap(), LogicalType::Float);
        assert_eq!("array".parse::<LogicalType>().unwrap(), LogicalType::Vector);
        assert!("decimal".parse::<LogicalType>().is_err());
    }

    #[test]
    fn test_type_display() {
        assert_eq!(LogicalType::Vector.to_string(), "VECTOR");
        assert_eq!(format!("{}", LogicalType::Null), "NULL");
    }
}
