//! Typed values used by predicates and filters.

use crate::ColumnType;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A typed scalar value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    String(String),
    Integer(i64),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Interpret catalog text according to a column type.
    ///
    /// Returns `None` when the text is not a valid literal of that type.
    pub fn parse(text: &str, column_type: ColumnType) -> Option<Value> {
        match column_type {
            ColumnType::Varchar => Some(Value::String(text.to_string())),
            ColumnType::Integer | ColumnType::BigInt => text.parse().ok().map(Value::Integer),
            ColumnType::Date => NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .map(Value::Date),
            ColumnType::Timestamp => NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"))
                .ok()
                .map(Value::Timestamp),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view; strings holding an integer literal also qualify.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Calendar view. Dates are widened to midnight.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => Some(d.and_time(NaiveTime::MIN)),
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Compare two values of compatible kinds.
    ///
    /// Dates and timestamps compare on the calendar; every other mixed pair
    /// is incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            _ => match (self.as_datetime(), other.as_datetime()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Value::Timestamp(ts)
    }
}
