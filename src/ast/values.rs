use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A parameter value handed to the driver, or a scalar read back from a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value, also the null sentinel for `IS [NOT] NULL` tests
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Json(serde_json::Value),
}

/// Declared SQL type of a field, used as a coercion hint for literal operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlType {
    Boolean,
    Integer,
    Float,
    Decimal,
    Text,
    Blob,
    Date,
    Timestamp,
    Json,
}

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Coerce a literal towards the declared type of the column it is compared with.
    ///
    /// Only lossless conversions happen; anything else is passed through untouched
    /// and left for the database to reject.
    pub fn coerce(self, ty: SqlType) -> Value {
        match (ty, self) {
            (_, Value::Null) => Value::Null,
            (SqlType::Boolean, Value::Int(n)) if n == 0 || n == 1 => Value::Bool(n == 1),
            (SqlType::Integer, Value::Bool(b)) => Value::Int(b as i64),
            (SqlType::Integer, Value::Float(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Value::Int(f as i64)
            }
            (SqlType::Float | SqlType::Decimal, Value::Int(n)) => Value::Float(n as f64),
            (SqlType::Timestamp, Value::String(s)) => TIMESTAMP_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(&s, fmt).ok())
                .map(Value::Timestamp)
                .unwrap_or(Value::String(s)),
            (SqlType::Date, Value::String(s)) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map(Value::Date)
                .unwrap_or(Value::String(s)),
            (SqlType::Json, Value::String(s)) => match serde_json::from_str(&s) {
                Ok(json) => Value::Json(json),
                Err(_) => Value::String(s),
            },
            (_, v) => v,
        }
    }

    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Json(_) => "json",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::Number((*n).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => {
                serde_json::Value::Array(b.iter().map(|byte| (*byte).into()).collect())
            }
            Value::Timestamp(ts) => serde_json::Value::String(ts.to_string()),
            Value::Date(d) => serde_json::Value::String(d.to_string()),
            Value::Json(j) => j.clone(),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Timestamp(ts) => write!(f, "'{}'", ts),
            Value::Date(d) => write!(f, "'{}'", d),
            Value::Json(j) => write!(f, "{}", j),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
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

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<serde_json::Value> for Value {
    fn from(j: serde_json::Value) -> Self {
        Value::Json(j)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
