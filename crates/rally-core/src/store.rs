//! Key-value persistence interface
//!
//! Both streaming subsystems read their state from a store at startup and
//! write it back at teardown. The store is passed in explicitly; there is no
//! shared global instance.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A primitive value held under a key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Int(i64),
    Float(f32),
    Text(String),
}

/// Discriminant of a `StoredValue`, used in error reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// A stored value had a different type than the reader expected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("expected {expected} value, found {found}")]
pub struct ValueTypeError {
    pub expected: ValueKind,
    pub found: ValueKind,
}

impl StoredValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            StoredValue::Int(_) => ValueKind::Int,
            StoredValue::Float(_) => ValueKind::Float,
            StoredValue::Text(_) => ValueKind::Text,
        }
    }

    /// Numeric value as a float; integers widen
    pub fn as_float(&self) -> Result<f32, ValueTypeError> {
        match self {
            StoredValue::Float(value) => Ok(*value),
            StoredValue::Int(value) => Ok(*value as f32),
            other => Err(ValueTypeError {
                expected: ValueKind::Float,
                found: other.kind(),
            }),
        }
    }

    pub fn as_int(&self) -> Result<i64, ValueTypeError> {
        match self {
            StoredValue::Int(value) => Ok(*value),
            other => Err(ValueTypeError {
                expected: ValueKind::Int,
                found: other.kind(),
            }),
        }
    }

    pub fn as_text(&self) -> Result<&str, ValueTypeError> {
        match self {
            StoredValue::Text(value) => Ok(value),
            other => Err(ValueTypeError {
                expected: ValueKind::Text,
                found: other.kind(),
            }),
        }
    }
}

/// Get/set-by-key persistence service
///
/// Calls are local and assumed to succeed; durability is the
/// implementation's concern.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<StoredValue>;
    fn set(&mut self, key: &str, value: StoredValue);
    fn remove(&mut self, key: &str);

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Float under `key`, or `default` when absent or not numeric
    fn get_float(&self, key: &str, default: f32) -> f32 {
        self.get(key)
            .and_then(|value| value.as_float().ok())
            .unwrap_or(default)
    }

    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.get(key)
            .and_then(|value| value.as_int().ok())
            .unwrap_or(default)
    }

    fn get_text(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(StoredValue::Text(text)) => text,
            _ => default.to_string(),
        }
    }

    fn set_float(&mut self, key: &str, value: f32) {
        self.set(key, StoredValue::Float(value));
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.set(key, StoredValue::Int(value));
    }

    fn set_text(&mut self, key: &str, value: &str) {
        self.set(key, StoredValue::Text(value.to_string()));
    }
}

/// In-memory store; nothing survives the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: BTreeMap<String, StoredValue>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &BTreeMap<String, StoredValue> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys starting with `prefix`, in order
    pub fn keys_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.values
            .keys()
            .filter(move |key| key.starts_with(prefix))
            .map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: StoredValue) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}
