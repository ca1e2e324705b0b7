use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A loosely-typed option value: a string or an integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Int(i64),
    Str(String),
}

impl OptionValue {
    /// Parse a command-line value, preferring an integer when it looks like one.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(n) => OptionValue::Int(n),
            Err(_) => OptionValue::Str(raw.to_string()),
        }
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(n) => Some(*n),
            OptionValue::Str(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Int(n) => write!(f, "{}", n),
            OptionValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Str(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Str(s)
    }
}

impl From<i64> for OptionValue {
    fn from(n: i64) -> Self {
        OptionValue::Int(n)
    }
}

impl From<i32> for OptionValue {
    fn from(n: i32) -> Self {
        OptionValue::Int(n as i64)
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Int(b as i64)
    }
}

/// Open-ended option bag handed to the backend factory.
///
/// Keys a backend does not recognize are ignored. Every lookup takes the
/// documented default when a key is absent, blank, or holds a value that
/// cannot be decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionBag {
    values: HashMap<String, OptionValue>,
}

impl OptionBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse a `key=value` pair as given on the command line.
    pub fn parse_pair(pair: &str) -> Result<(String, OptionValue), String> {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("invalid option '{}': expected key=value", pair))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("invalid option '{}': empty key", pair));
        }
        Ok((key.to_string(), OptionValue::parse(value)))
    }

    /// Non-blank string value of `key`, if any. Integers are rendered as text.
    pub fn string(&self, key: &str) -> Option<String> {
        let value = self.values.get(key)?.to_string();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.string(key).unwrap_or_else(|| default.to_string())
    }

    /// Integer value of `key`; non-numeric values fall back to `default`.
    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            None => default,
            Some(value) => match value.as_int() {
                Some(n) => n,
                None => {
                    warn!(option = key, value = %value, fallback = default, "non-integer option, using default");
                    default
                }
            },
        }
    }

    /// Boolean flag encoded as 0/1; any other value falls back to `default`.
    pub fn flag_or(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            None => default,
            Some(value) => match value.as_int() {
                Some(0) => false,
                Some(1) => true,
                _ => {
                    warn!(option = key, value = %value, fallback = default, "flag is not 0 or 1, using default");
                    default
                }
            },
        }
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for OptionBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = OptionBag::new();
        for (k, v) in iter {
            bag.insert(k, v);
        }
        bag
    }
}
