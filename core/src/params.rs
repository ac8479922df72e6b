//! Request parameters with an explicit "absent" state.
//!
//! # Design
//! Every entry is stored as `Option<ParamValue>`. `None` means the caller did
//! not supply the field and it must be dropped before sending; `Some(false)`,
//! `Some(0)` and `Some("")` are real values and always go on the wire.
//! Insertion order is preserved so query strings come out in a stable order.

use serde_json::{Map, Value};

use crate::error::ValidationError;

/// A single parameter value. `Float` must be finite to be sent; see
/// `Params::check_finite`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    TextList(Vec<String>),
    IntList(Vec<i64>),
}

impl ParamValue {
    /// Query-string rendering. Lists yield one entry per element so the key
    /// is repeated (`ids[]=a&ids[]=b`).
    pub fn to_query_values(&self) -> Vec<String> {
        match self {
            ParamValue::Bool(b) => vec![b.to_string()],
            ParamValue::Int(i) => vec![i.to_string()],
            ParamValue::Float(f) => vec![format_float(*f)],
            ParamValue::Text(s) => vec![s.clone()],
            ParamValue::TextList(items) => items.clone(),
            ParamValue::IntList(items) => items.iter().map(i64::to_string).collect(),
        }
    }

    /// JSON body rendering.
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Bool(b) => Value::Bool(*b),
            ParamValue::Int(i) => Value::from(*i),
            ParamValue::Float(f) => Value::from(*f),
            ParamValue::Text(s) => Value::String(s.clone()),
            ParamValue::TextList(items) => Value::from(items.clone()),
            ParamValue::IntList(items) => Value::from(items.clone()),
        }
    }
}

/// Whole floats keep their fractional part (`45.0`, not `45`), matching how
/// the service's own clients render coordinates.
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u8> for ParamValue {
    fn from(value: u8) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Text(value.clone())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::TextList(value)
    }
}

impl From<Vec<i64>> for ParamValue {
    fn from(value: Vec<i64>) -> Self {
        ParamValue::IntList(value)
    }
}

/// Ordered parameter mapping. Re-inserting a key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Option<ParamValue>)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a present value.
    pub fn set(self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.set_opt(key, Some(value))
    }

    /// Set a value that may be absent. `None` is recorded and later dropped
    /// by `cleaned`.
    pub fn set_opt<V: Into<ParamValue>>(mut self, key: &str, value: Option<V>) -> Self {
        let value = value.map(Into::into);
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
        self
    }

    /// Set a list only when it has elements; an empty list is absent.
    pub fn set_list<T: Clone>(self, key: &str, items: &[T]) -> Self
    where
        Vec<T>: Into<ParamValue>,
    {
        let value = (!items.is_empty()).then(|| items.to_vec());
        self.set_opt(key, value)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_ref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every absent entry, keep everything else (falsy values included).
    pub fn cleaned(&self) -> Vec<(&str, &ParamValue)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.as_str(), v)))
            .collect()
    }

    /// JSON has no NaN or infinity, so any such present value is rejected
    /// rather than sent as `null`.
    pub fn check_finite(&self) -> Result<(), ValidationError> {
        for (key, value) in self.cleaned() {
            if let ParamValue::Float(f) = value {
                if !f.is_finite() {
                    return Err(ValidationError::NonFiniteParam {
                        key: key.to_string(),
                        value: *f,
                    });
                }
            }
        }
        Ok(())
    }

    /// Cleaned parameters as flat query pairs.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.cleaned()
            .into_iter()
            .flat_map(|(key, value)| {
                value
                    .to_query_values()
                    .into_iter()
                    .map(move |v| (key.to_string(), v))
            })
            .collect()
    }

    /// Cleaned parameters as a JSON object.
    pub fn to_json_object(&self) -> Map<String, Value> {
        self.cleaned()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_json()))
            .collect()
    }
}
