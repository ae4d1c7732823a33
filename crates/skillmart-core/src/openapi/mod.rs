//! OpenAPI document checks and RFC 9457 error-schema generation.
//!
//! Documents are held as `serde_yaml::Value` so that YAML files with
//! integer mapping keys (`200:` under `responses`) and JSON files share
//! one representation. Keys are compared by their string form.

pub mod case;
pub mod errors;
pub mod naming;
pub mod validate;

use crate::error::{MarketError, Result};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Load a `.yaml`/`.yml` file as YAML and anything else as JSON.
pub fn load(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(MarketError::PathNotFound(path.display().to_string()));
    }
    let data = std::fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == "yaml" || e == "yml");

    let doc: Value = if is_yaml {
        serde_yaml::from_str(&data)?
    } else {
        let json: serde_json::Value = serde_json::from_str(&data)?;
        serde_yaml::to_value(json)?
    };

    if !doc.is_mapping() {
        return Err(MarketError::UnsupportedDocument(format!(
            "{}: top level is not a mapping",
            path.display()
        )));
    }
    Ok(doc)
}

/// String form of a mapping key or scalar.
pub(crate) fn key_str(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Look up `key` in a mapping, matching keys by string form.
pub(crate) fn get<'a>(v: &'a Value, key: &str) -> Option<&'a Value> {
    v.as_mapping()?
        .iter()
        .find(|(k, _)| key_str(k).as_deref() == Some(key))
        .map(|(_, v)| v)
}

pub(crate) fn has(v: &Value, key: &str) -> bool {
    get(v, key).is_some()
}

/// Mapping entries in document order with stringified keys. Non-mappings
/// yield nothing.
pub(crate) fn entries(v: &Value) -> Vec<(String, &Value)> {
    v.as_mapping()
        .map(|m: &Mapping| {
            m.iter()
                .filter_map(|(k, v)| key_str(k).map(|k| (k, v)))
                .collect()
        })
        .unwrap_or_default()
}

/// `components.schemas` entries, if any.
pub(crate) fn schemas(doc: &Value) -> Vec<(String, &Value)> {
    get(doc, "components")
        .and_then(|c| get(c, "schemas"))
        .map(entries)
        .unwrap_or_default()
}

pub(crate) fn type_is(schema: &Value, ty: &str) -> bool {
    get(schema, "type").and_then(Value::as_str) == Some(ty)
}
