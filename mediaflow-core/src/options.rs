//! String-keyed option store consumed by stage and filter construction.

use crate::rational::Rational;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A typed option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Rational value.
    Rational(Rational),
    /// String value.
    String(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Rational(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for OptionValue {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<usize> for OptionValue {
    fn from(v: usize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<Rational> for OptionValue {
    fn from(v: Rational) -> Self {
        Self::Rational(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// An ordered key-value option set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Options {
    entries: BTreeMap<String, OptionValue>,
}

impl Options {
    /// Create an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder-style set.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Get a raw option value.
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    /// Check whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Get an integer option. Floats with integral values coerce.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.entries.get(key)? {
            OptionValue::Int(v) => Some(*v),
            OptionValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    /// Get an integer option with a default.
    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    /// Get a float option; integers coerce.
    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.entries.get(key)? {
            OptionValue::Float(v) => Some(*v),
            OptionValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get a boolean option.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.entries.get(key)? {
            OptionValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get a string option.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.entries.get(key)? {
            OptionValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Get a rational option.
    pub fn get_rational(&self, key: &str) -> Option<Rational> {
        match self.entries.get(key)? {
            OptionValue::Rational(v) => Some(*v),
            OptionValue::Int(v) => Some(Rational::from_int(*v)),
            _ => None,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let opts = Options::new()
            .with("sample_rate", 48000u32)
            .with("codec", "pcm_s16")
            .with("gain", 0.5);
        assert_eq!(opts.get_int("sample_rate"), Some(48000));
        assert_eq!(opts.get_str("codec"), Some("pcm_s16"));
        assert_eq!(opts.get_float("gain"), Some(0.5));
        assert!(opts.get("missing").is_none());
    }

    #[test]
    fn test_type_coercion() {
        let opts = Options::new().with("n", 3i64);
        assert_eq!(opts.get_float("n"), Some(3.0));
        assert_eq!(opts.get_rational("n"), Some(Rational::from_int(3)));
        assert_eq!(opts.get_str("n"), None);
    }

    #[test]
    fn test_replace() {
        let mut opts = Options::new();
        opts.set("k", 1i64);
        opts.set("k", 2i64);
        assert_eq!(opts.get_int("k"), Some(2));
        assert_eq!(opts.len(), 1);
    }
}
