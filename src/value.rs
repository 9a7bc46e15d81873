//! The JSON-like value type flowing through record structures.
//!
//! MARC conversion rules traffic in loosely typed data: subfield values are
//! strings or numbers, repeatable subfields are lists, and nested records
//! (linked entry fields, sub-records) are further mappings. [`Value`] models
//! exactly that shape, with nested mappings represented as
//! [`OrderedMultiMap`] instances rather than raw JSON objects so their
//! occurrence order survives the trip.

use crate::error::Result;
use crate::multimap::OrderedMultiMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single value within a record: scalar, list, or nested sub-record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent/empty value. Rule handlers return this for entries the caller
    /// should drop before final assembly.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating-point scalar.
    Float(f64),
    /// String scalar, the common case for subfield data.
    Str(String),
    /// Ordered list of values; one list element per key occurrence when the
    /// list sits directly under a record key.
    List(Vec<Value>),
    /// Nested sub-record with its own occurrence order.
    Map(OrderedMultiMap),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the string payload, if this is a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Borrow the integer payload, if this is an integer scalar.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrow the list payload, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Borrow the nested sub-record, if this is a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&OrderedMultiMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert a plain JSON value into a [`Value`].
    ///
    /// JSON objects become [`OrderedMultiMap`] instances recursively. An
    /// object carrying the reserved order key uses it to reconstruct its
    /// occurrence sequence; an object without it uses its own key insertion
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if a nested object carries an inconsistent order
    /// sequence (see [`OrderedMultiMap::from_json`]).
    pub fn from_json(json: &serde_json::Value) -> Result<Value> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float))
                .unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(Value::from_json(item)?);
                }
                Value::List(out)
            }
            serde_json::Value::Object(_) => Value::Map(OrderedMultiMap::from_json(json)?),
        })
    }

    /// Convert this value into a plain JSON value.
    ///
    /// Nested sub-records serialize through [`OrderedMultiMap::to_json`],
    /// which writes the reserved order key so the occurrence sequence is
    /// reconstructible.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::Number((*n).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => map.to_json(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            compound => write!(f, "{}", compound.to_json()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<OrderedMultiMap> for Value {
    fn from(map: OrderedMultiMap) -> Self {
        Value::Map(map)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Value::from_json(&json).map_err(serde::de::Error::custom)
    }
}

/// Compare two values under the lenient record-equality rule: a scalar is
/// interchangeable with its one-element list, and nested lists/maps compare
/// elementwise under the same rule.
#[must_use]
pub(crate) fn lenient_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::List(items), other) if items.len() == 1 => lenient_eq(&items[0], other),
        (other, Value::List(items)) if items.len() == 1 => lenient_eq(other, &items[0]),
        (Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| lenient_eq(x, y))
        }
        (Value::Map(x), Value::Map(y)) => x == y,
        _ => a == b,
    }
}
