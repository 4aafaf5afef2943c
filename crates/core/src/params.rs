//! Lenient typed reads from a `serde_json::Value` settings object.
//!
//! Every accessor takes a key and a default. A missing key, a `null`, or a
//! value of the wrong JSON type yields the default; these never fail.

use serde_json::Value;

static NULL: Value = Value::Null;

/// Borrowed view over a JSON settings object.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    value: &'a Value,
}

impl<'a> Params<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.value.get(name)
    }

    /// Reads a number (integers included) as `f64`.
    pub fn f64(&self, name: &str, default: f64) -> f64 {
        self.get(name).and_then(Value::as_f64).unwrap_or(default)
    }

    /// Reads a non-negative integer as `usize`.
    pub fn usize(&self, name: &str, default: usize) -> usize {
        self.get(name)
            .and_then(Value::as_u64)
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(default)
    }

    /// Reads a non-negative integer that fits in `u32`.
    pub fn u32(&self, name: &str, default: u32) -> u32 {
        self.get(name)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(default)
    }

    /// Reads a non-negative integer as `u64`.
    pub fn u64(&self, name: &str, default: u64) -> u64 {
        self.get(name).and_then(Value::as_u64).unwrap_or(default)
    }

    /// Reads a string, borrowing from the underlying value.
    pub fn str(&self, name: &str, default: &'a str) -> &'a str {
        self.get(name).and_then(Value::as_str).unwrap_or(default)
    }

    /// Reads a nested object. Returns `Value::Null` when absent so callers
    /// can hand it straight to another `from_json`.
    pub fn nested(&self, name: &str) -> &'a Value {
        self.get(name).unwrap_or(&NULL)
    }
}
