//! The Value type - data carried by commands and replies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A reply or argument value.
///
/// Mirrors the shapes a key-value protocol can return: bulk strings,
/// integers, simple status lines, nested arrays, and embedded error replies
/// (which only appear inside a transaction result).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent reply (a missing key, an empty pop).
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Simple status reply such as `OK` or `PONG`.
    Status(String),
    /// Error reply embedded in a batch result.
    Error(String),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Key-value map with string keys.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// The `OK` status reply.
    pub fn ok() -> Self {
        Value::Status("OK".to_string())
    }

    /// Create a status reply.
    pub fn status(status: impl Into<String>) -> Self {
        Value::Status(status.into())
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is an embedded error reply.
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Borrow the textual content of a string or status reply.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Status(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer content, if this is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Borrow the elements, if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The runtime type name reported in argument errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Status(_) => "status",
            Value::Error(_) => "error",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
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

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_string_share_as_str() {
        assert_eq!(Value::ok().as_str(), Some("OK"));
        assert_eq!(Value::from("world").as_str(), Some("world"));
        assert_eq!(Value::Integer(3).as_str(), None);
    }

    #[test]
    fn type_names_cover_primitives() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::from(true).type_name(), "boolean");
        assert_eq!(Value::from(1_i64).type_name(), "number");
        assert_eq!(Value::from(1.5).type_name(), "number");
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::from(vec![Value::Null]).type_name(), "array");
    }

    #[test]
    fn option_converts_to_null() {
        let none: Option<&str> = None;
        assert!(Value::from(none).is_null());
        assert_eq!(Value::from(Some("a")), Value::from("a"));
    }

    #[test]
    fn serde_roundtrip_keeps_status_distinct() {
        let json = serde_json::to_string(&Value::ok()).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::ok());
        assert_ne!(back, Value::from("OK"));
    }
}
