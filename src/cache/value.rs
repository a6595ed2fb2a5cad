//! Value Module
//!
//! A dynamically typed value for callers that cache heterogeneous data.
//! Lists and maps are reference counted, so cloning a `Value` shares its
//! aggregates and the size estimator counts a shared aggregate only once.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cache::size::{EstimateSize, SizeEstimator, BOOLEAN_SIZE, NUMBER_SIZE};

// == Value ==
/// A heterogeneous cacheable value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Raw bytes, costed at exactly their length
    Bytes(Vec<u8>),
    List(Arc<Vec<Value>>),
    Map(Arc<BTreeMap<String, Value>>),
}

impl Value {
    /// Builds a list from anything convertible into values.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Builds a map from key/value pairs.
    pub fn map<I, K, T>(members: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<Value>,
    {
        Value::Map(Arc::new(
            members
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        ))
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(data.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(members) => Some(members),
            _ => None,
        }
    }

    /// Looks up a member of a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|members| members.get(key))
    }

    /// Returns true if both values are the same shared aggregate.
    ///
    /// Scalars are never considered shared, even when equal.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl EstimateSize for Value {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        match self {
            Value::Null => 0,
            Value::Bool(_) => BOOLEAN_SIZE,
            Value::Number(_) => NUMBER_SIZE,
            Value::Text(text) => text.estimate_size(estimator),
            Value::Bytes(data) => data.len(),
            Value::List(items) => items.estimate_size(estimator),
            Value::Map(members) => members.estimate_size(estimator),
        }
    }
}

// == Conversions ==
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::Text(s),
            Json::Array(items) => Value::list(items),
            Json::Object(members) => Value::map(members),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::size::size_of;

    #[test]
    fn test_scalar_sizes() {
        assert_eq!(size_of(&Value::Null), 0);
        assert_eq!(size_of(&Value::from(5)), 8);
        assert_eq!(size_of(&Value::from(true)), 4);
        assert_eq!(size_of(&Value::from("aaa")), 6);
        assert_eq!(size_of(&Value::bytes(vec![0u8; 10])), 10);
    }

    #[test]
    fn test_simple_object() {
        let obj = Value::map([
            ("str", Value::from("a")),
            ("str2", Value::from("aa")),
            ("str3", Value::from("aaa")),
            ("num", Value::from(1)),
            ("bool", Value::from(true)),
        ]);
        assert_eq!(size_of(&obj), 24);
    }

    #[test]
    fn test_complex_object() {
        let obj = Value::map([
            ("str", Value::from("a")),
            ("num", Value::from(1)),
            ("bool", Value::from(true)),
            (
                "arr",
                Value::list([
                    Value::map([("str", "a")]),
                    Value::map([("str", "a")]),
                    Value::map([
                        ("str", Value::from("a")),
                        (
                            "arr",
                            Value::list([Value::map([
                                ("str", Value::from("aa")),
                                ("obj", Value::map([("str", "aaa")])),
                            ])]),
                        ),
                    ]),
                ]),
            ),
        ]);
        assert_eq!(size_of(&obj), 30);
    }

    #[test]
    fn test_shared_references_not_repeated() {
        let obj1 = Value::map([
            ("str", Value::from("a")),
            ("num", Value::from(1)),
            ("bool", Value::from(true)),
        ]);
        let copy = Value::map([
            ("str", Value::from("a")),
            ("num", Value::from(1)),
            ("bool", Value::from(true)),
        ]);
        assert!(!obj1.ptr_eq(&copy));

        let obj2 = Value::map([
            ("str", Value::from("a")),
            ("obj1", obj1.clone()),
            ("obj2", obj1.clone()),
            (
                "arr",
                Value::list([obj1.clone(), obj1.clone(), obj1.clone(), copy]),
            ),
        ]);
        assert_eq!(size_of(&obj2), 2 + 14 + 14);
    }

    #[test]
    fn test_from_json() {
        let value = Value::from(serde_json::json!({
            "name": "cache",
            "tiers": [1, 2],
            "enabled": true,
            "owner": null
        }));

        assert_eq!(value.get("name").and_then(Value::as_str), Some("cache"));
        assert_eq!(value.get("tiers").and_then(Value::as_list).map(<[Value]>::len), Some(2));
        assert_eq!(value.get("enabled").and_then(Value::as_bool), Some(true));
        assert!(value.get("owner").is_some_and(Value::is_null));
        assert_eq!(size_of(&value), 10 + 16 + 4);
    }
}
