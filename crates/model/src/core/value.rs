use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell read from the source table.
///
/// DECIMAL, TIME and JSON columns are kept as the server's text so no
/// precision or key order is lost on the way to the columnar file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Float(f64),
    Decimal(String),
    String(String),
    Boolean(bool),
    /// Raw JSON document text.
    Json(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Time(String),
    Null,
}

impl Value {
    /// Interprets the value as a non-negative integer key.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(v) => u64::try_from(*v).ok(),
            Value::Uint(v) => Some(*v),
            Value::Decimal(v) | Value::String(v) => v.trim().parse::<u64>().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Uint(v) => i64::try_from(*v).ok(),
            Value::Boolean(v) => Some(i64::from(*v)),
            Value::Decimal(v) | Value::String(v) => v.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Uint(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Decimal(v) | Value::String(v) => v.trim().parse::<f64>().ok(),
            Value::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Int(v) => Some(*v != 0),
            Value::Uint(v) => Some(*v != 0),
            Value::Float(v) => Some(*v != 0.0),
            Value::String(v) => match v.to_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Text rendering used for string columns; `None` for SQL NULL.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::String(v) | Value::Decimal(v) | Value::Time(v) | Value::Json(v) => {
                Some(v.clone())
            }
            Value::Bytes(v) => Some(String::from_utf8_lossy(v).into_owned()),
            other => Some(other.to_string()),
        }
    }

    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Value::Null => None,
            Value::Bytes(v) => Some(v.clone()),
            other => other.as_string().map(String::into_bytes),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Decimal(v) | Value::String(v) | Value::Time(v) | Value::Json(v) => {
                write!(f, "{v}")
            }
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Date(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Null => write!(f, "NULL"),
        }
    }
}

/// A named cell of a row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

impl FieldValue {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        FieldValue {
            name: name.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_u64_rejects_negative_keys() {
        assert_eq!(Value::Int(42).as_u64(), Some(42));
        assert_eq!(Value::Uint(7).as_u64(), Some(7));
        assert_eq!(Value::Int(-1).as_u64(), None);
        assert_eq!(Value::String("19".into()).as_u64(), Some(19));
        assert_eq!(Value::Null.as_u64(), None);
    }

    #[test]
    fn test_as_string_keeps_null_distinct() {
        assert_eq!(Value::Null.as_string(), None);
        assert_eq!(Value::Decimal("10.50".into()).as_string().as_deref(), Some("10.50"));
        assert_eq!(Value::Bytes(b"abc".to_vec()).as_string().as_deref(), Some("abc"));
        assert_eq!(
            Value::Json(r#"{"b":1,"a":2}"#.into()).as_string().as_deref(),
            Some(r#"{"b":1,"a":2}"#)
        );
    }
}
