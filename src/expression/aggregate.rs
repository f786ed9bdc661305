//! Aggregate function registry for rolling windows
//!
//! Names are resolved to an [`AggregateFunction`] once, at the boundary.
//! Evaluation then goes through a static table indexed by the enum, so the
//! hot loop never touches strings. Every reducer skips null cells.

use crate::common::error::{SequinError, SequinResult};
use crate::types::{LogicalType, Value};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Window reducer: cells of one window plus the input element type
pub type WindowReducer = fn(&[Value], LogicalType) -> SequinResult<Value>;

/// Aggregates available to rolling windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Mean,
    Sum,
    Min,
    Max,
    Count,
    Median,
}

struct AggregateEntry {
    name: &'static str,
    reduce: WindowReducer,
}

// Indexed by `AggregateFunction as usize`; keep in declaration order.
static AGGREGATE_TABLE: [AggregateEntry; 6] = [
    AggregateEntry {
        name: "mean",
        reduce: mean,
    },
    AggregateEntry {
        name: "sum",
        reduce: sum,
    },
    AggregateEntry {
        name: "min",
        reduce: min,
    },
    AggregateEntry {
        name: "max",
        reduce: max,
    },
    AggregateEntry {
        name: "count",
        reduce: count,
    },
    AggregateEntry {
        name: "median",
        reduce: median,
    },
];

impl AggregateFunction {
    /// Every registered aggregate, in table order
    pub const ALL: [AggregateFunction; 6] = [
        AggregateFunction::Mean,
        AggregateFunction::Sum,
        AggregateFunction::Min,
        AggregateFunction::Max,
        AggregateFunction::Count,
        AggregateFunction::Median,
    ];

    /// Resolve a function by its registered name
    pub fn lookup(name: &str) -> SequinResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == name)
            .ok_or_else(|| SequinError::UnknownFunction(name.to_string()))
    }

    /// Registered name
    pub fn name(&self) -> &'static str {
        AGGREGATE_TABLE[*self as usize].name
    }

    /// Whether every window reduces to a value, even an empty or all-null one
    ///
    /// `sum` and `count` fall back to zero, so the min-observations gate does
    /// not apply to them.
    pub fn never_null(&self) -> bool {
        matches!(self, AggregateFunction::Sum | AggregateFunction::Count)
    }

    /// Type produced for non-null results over an input of `input_type`
    ///
    /// Fails when the function cannot operate on that element type. A
    /// `Null`-typed (all-null) input is accepted by every function.
    pub fn output_type(&self, input_type: LogicalType) -> SequinResult<LogicalType> {
        match self {
            AggregateFunction::Count => Ok(LogicalType::Integer),
            AggregateFunction::Mean | AggregateFunction::Median => {
                if input_type.is_numeric() || input_type.is_null() {
                    Ok(LogicalType::Float)
                } else {
                    Err(self.unsupported(input_type))
                }
            }
            AggregateFunction::Sum => match input_type {
                LogicalType::Integer => Ok(LogicalType::Integer),
                LogicalType::Float | LogicalType::Null => Ok(LogicalType::Float),
                other => Err(self.unsupported(other)),
            },
            AggregateFunction::Min | AggregateFunction::Max => {
                if input_type.is_orderable() || input_type.is_null() {
                    Ok(input_type)
                } else {
                    Err(self.unsupported(input_type))
                }
            }
        }
    }

    /// Reduce one window of cells
    pub fn reduce(&self, window: &[Value], input_type: LogicalType) -> SequinResult<Value> {
        (AGGREGATE_TABLE[*self as usize].reduce)(window, input_type)
    }

    fn unsupported(&self, input_type: LogicalType) -> SequinError {
        SequinError::type_mismatch(format!(
            "Aggregate '{}' cannot operate on {} values",
            self.name(),
            input_type
        ))
    }
}

impl FromStr for AggregateFunction {
    type Err = SequinError;

    fn from_str(s: &str) -> SequinResult<Self> {
        Self::lookup(s)
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn non_null<'a>(window: &'a [Value]) -> impl Iterator<Item = &'a Value> + 'a {
    window.iter().filter(|v| !v.is_null())
}

fn mean(window: &[Value], _input_type: LogicalType) -> SequinResult<Value> {
    let mut total = 0.0;
    let mut observed = 0usize;
    for value in non_null(window) {
        total += value.try_as_f64()?;
        observed += 1;
    }

    if observed == 0 {
        return Ok(Value::Null);
    }
    Ok(Value::Float(total / observed as f64))
}

fn sum(window: &[Value], input_type: LogicalType) -> SequinResult<Value> {
    let zero = match input_type {
        LogicalType::Integer => Value::Integer(0),
        _ => Value::Float(0.0),
    };
    non_null(window).try_fold(zero, |acc, value| acc.add(value))
}

fn extremum(window: &[Value], keep: Ordering) -> SequinResult<Value> {
    let mut best: Option<&Value> = None;
    for value in non_null(window) {
        best = match best {
            Some(current) if value.compare(current)? != keep => Some(current),
            _ => Some(value),
        };
    }
    Ok(best.cloned().unwrap_or(Value::Null))
}

fn min(window: &[Value], _input_type: LogicalType) -> SequinResult<Value> {
    extremum(window, Ordering::Less)
}

fn max(window: &[Value], _input_type: LogicalType) -> SequinResult<Value> {
    extremum(window, Ordering::Greater)
}

fn count(window: &[Value], _input_type: LogicalType) -> SequinResult<Value> {
    Ok(Value::Integer(non_null(window).count() as i64))
}

fn median(window: &[Value], _input_type: LogicalType) -> SequinResult<Value> {
    let mut observed = non_null(window)
        .map(|v| v.try_as_f64().map(OrderedFloat))
        .collect::<SequinResult<Vec<_>>>()?;
    if observed.is_empty() {
        return Ok(Value::Null);
    }

    observed.sort_unstable();
    let mid = observed.len() / 2;
    let median = if observed.len() % 2 == 0 {
        (observed[mid - 1].into_inner() + observed[mid].into_inner()) / 2.0
    } else {
        observed[mid].into_inner()
    };
    Ok(Value::Float(median))
}
