//! Parameter documents: flattening nested JSON/TOML into dotted names.
//!
//! `{"solver": {"type": "cg", "maxiter": 50}}` becomes
//! `solver.type = "cg"`, `solver.maxiter = 50`. Arrays, nulls and dates
//! have no parameter meaning and are rejected.

use amgkit_types::{AmgError, AmgResult};
use serde_json::{Map, Value};

use crate::value::ParamValue;

/// Flattened `(name, value)` pairs, sorted by key within each group.
pub type Entries = Vec<(String, ParamValue)>;

/// Parses a JSON parameter document.
pub fn parse_json(text: &str) -> AmgResult<Entries> {
    let root: Value = serde_json::from_str(text)
        .map_err(|e| AmgError::Serialization(format!("invalid JSON: {e}")))?;
    let Value::Object(map) = root else {
        return Err(AmgError::Serialization(
            "parameter document must be a JSON object".into(),
        ));
    };
    let mut entries = Vec::new();
    flatten_json(&map, "", &mut entries)?;
    Ok(entries)
}

fn flatten_json(map: &Map<String, Value>, prefix: &str, out: &mut Entries) -> AmgResult<()> {
    for (key, value) in map {
        let name = join(prefix, key)?;
        match value {
            Value::Object(inner) => flatten_json(inner, &name, out)?,
            Value::Bool(b) => out.push((name, ParamValue::Bool(*b))),
            Value::Number(num) => {
                let value = match num.as_i64() {
                    Some(i) => ParamValue::Int(i),
                    None => ParamValue::Float(num.as_f64().ok_or_else(|| {
                        AmgError::Serialization(format!("number out of range at '{name}'"))
                    })?),
                };
                out.push((name, value));
            }
            Value::String(s) => out.push((name, ParamValue::Str(s.clone()))),
            Value::Array(_) | Value::Null => {
                return Err(AmgError::Serialization(format!(
                    "unsupported value at '{name}': only objects, numbers, strings and booleans are allowed"
                )));
            }
        }
    }
    Ok(())
}

/// Parses a TOML parameter document.
pub fn parse_toml(text: &str) -> AmgResult<Entries> {
    let root: toml::Table = text
        .parse()
        .map_err(|e| AmgError::Serialization(format!("invalid TOML: {e}")))?;
    let mut entries = Vec::new();
    flatten_toml(&root, "", &mut entries)?;
    Ok(entries)
}

fn flatten_toml(table: &toml::Table, prefix: &str, out: &mut Entries) -> AmgResult<()> {
    for (key, value) in table {
        let name = join(prefix, key)?;
        match value {
            toml::Value::Table(inner) => flatten_toml(inner, &name, out)?,
            toml::Value::Boolean(b) => out.push((name, ParamValue::Bool(*b))),
            toml::Value::Integer(i) => out.push((name, ParamValue::Int(*i))),
            toml::Value::Float(f) => out.push((name, ParamValue::Float(*f))),
            toml::Value::String(s) => out.push((name, ParamValue::Str(s.clone()))),
            toml::Value::Array(_) | toml::Value::Datetime(_) => {
                return Err(AmgError::Serialization(format!(
                    "unsupported value at '{name}'"
                )));
            }
        }
    }
    Ok(())
}

/// Checks a dotted parameter name: non-empty segments, no whitespace.
pub fn validate_name(name: &str) -> AmgResult<()> {
    if name.is_empty() {
        return Err(AmgError::parameter(name, "name must not be empty"));
    }
    if name.split('.').any(str::is_empty) {
        return Err(AmgError::parameter(name, "name has an empty segment"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(AmgError::parameter(name, "name must not contain whitespace"));
    }
    Ok(())
}

fn join(prefix: &str, key: &str) -> AmgResult<String> {
    let name = if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    };
    validate_name(&name).map_err(|e| AmgError::Serialization(e.to_string()))?;
    Ok(name)
}

/// Rebuilds the nested JSON form of flattened entries.
pub fn nest_json(entries: &[(String, ParamValue)]) -> AmgResult<Value> {
    let mut root = Map::new();
    for (name, value) in entries {
        let mut segments: Vec<&str> = name.split('.').collect();
        let leaf = segments.pop().unwrap_or_default();
        let mut node = &mut root;
        for segment in segments {
            let child = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            node = match child {
                Value::Object(inner) => inner,
                _ => {
                    return Err(AmgError::Serialization(format!(
                        "'{name}' conflicts with a scalar parameter at '{segment}'"
                    )));
                }
            };
        }
        if matches!(node.get(leaf), Some(Value::Object(_))) {
            return Err(AmgError::Serialization(format!(
                "'{name}' conflicts with a parameter group"
            )));
        }
        let json = serde_json::to_value(value)
            .map_err(|e| AmgError::Serialization(e.to_string()))?;
        node.insert(leaf.to_string(), json);
    }
    Ok(Value::Object(root))
}
