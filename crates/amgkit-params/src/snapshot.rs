//! Owned parameter snapshots consumed at build time.

use amgkit_types::{AmgError, AmgResult};

use crate::value::ParamValue;

/// Deep copy of a parameter store's entries.
///
/// Builders read their configuration from a snapshot, never from the live
/// store, so the store may be mutated or destroyed right after a build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSnapshot {
    entries: Vec<(String, ParamValue)>,
}

impl ParamSnapshot {
    /// Creates an empty snapshot (all defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// Inserts or overwrites an entry, keeping first-insertion order.
    pub fn insert(&mut self, name: &str, value: ParamValue) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// Looks up an entry.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Names that are not in `known`.
    pub fn unknown<'a>(&'a self, known: &[&str]) -> Vec<&'a str> {
        self.entries
            .iter()
            .map(|(n, _)| n.as_str())
            .filter(|n| !known.contains(n))
            .collect()
    }

    /// Non-negative integer parameter.
    pub fn usize_or(&self, name: &str, default: usize) -> AmgResult<usize> {
        match self.get(name) {
            None => Ok(default),
            Some(ParamValue::Int(v)) => usize::try_from(*v)
                .map_err(|_| AmgError::parameter(name, format!("expected a non-negative integer, got {v}"))),
            Some(ParamValue::Str(s)) => s
                .trim()
                .parse::<usize>()
                .map_err(|_| AmgError::parameter(name, format!("expected a non-negative integer, got '{s}'"))),
            Some(other) => Err(type_error(name, "integer", other)),
        }
    }

    /// Floating-point parameter; integers are widened.
    pub fn f64_or(&self, name: &str, default: f64) -> AmgResult<f64> {
        let value = match self.get(name) {
            None => return Ok(default),
            Some(ParamValue::Float(v)) => *v,
            Some(ParamValue::Int(v)) => *v as f64,
            Some(ParamValue::Str(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| AmgError::parameter(name, format!("expected a number, got '{s}'")))?,
            Some(other) => return Err(type_error(name, "float", other)),
        };
        if !value.is_finite() {
            return Err(AmgError::parameter(name, "value must be finite"));
        }
        Ok(value)
    }

    /// Boolean parameter; accepts `true`/`false`, `1`/`0`.
    pub fn bool_or(&self, name: &str, default: bool) -> AmgResult<bool> {
        match self.get(name) {
            None => Ok(default),
            Some(ParamValue::Bool(v)) => Ok(*v),
            Some(ParamValue::Int(0)) => Ok(false),
            Some(ParamValue::Int(1)) => Ok(true),
            Some(ParamValue::Str(s)) => match s.trim() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(AmgError::parameter(name, format!("expected a boolean, got '{s}'"))),
            },
            Some(other) => Err(type_error(name, "bool", other)),
        }
    }

    /// String parameter.
    pub fn str_or<'a>(&'a self, name: &str, default: &'a str) -> AmgResult<&'a str> {
        match self.get(name) {
            None => Ok(default),
            Some(ParamValue::Str(s)) => Ok(s.as_str()),
            Some(other) => Err(type_error(name, "string", other)),
        }
    }

    /// Nested JSON rendering of the dotted names.
    pub fn to_json(&self) -> AmgResult<serde_json::Value> {
        crate::document::nest_json(&self.entries)
    }
}

impl FromIterator<(String, ParamValue)> for ParamSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (name, value) in iter {
            snapshot.insert(&name, value);
        }
        snapshot
    }
}

fn type_error(name: &str, expected: &str, got: &ParamValue) -> AmgError {
    AmgError::parameter(
        name,
        format!("expected {expected}, got {} '{got}'", got.type_name()),
    )
}
