//! Canonical JSON and YAML codecs for persisted artefacts.
//!
//! JSON artefacts are written with object keys sorted at every depth, so an
//! unchanged grid or heatmap always yields the same bytes and the same
//! provenance hash. Decoding failures carry the offending line and column.

use std::io::Write;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::errors::{ErrorInfo, HeatgridError};

fn json_error(code: &str, err: serde_json::Error) -> HeatgridError {
    let mut info = ErrorInfo::new(code, err.to_string());
    if err.line() > 0 {
        info = info
            .with_context("line", err.line())
            .with_context("column", err.column());
    }
    HeatgridError::Serde(info)
}

fn yaml_error(code: &str, err: serde_yaml::Error) -> HeatgridError {
    let mut info = ErrorInfo::new(code, err.to_string());
    if let Some(location) = err.location() {
        info = info
            .with_context("line", location.line())
            .with_context("column", location.column());
    }
    HeatgridError::Serde(info)
}

fn sort_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));
            for (key, mut nested) in entries {
                sort_keys(&mut nested);
                map.insert(key, nested);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sort_keys),
        _ => {}
    }
}

/// JSON tree of `value` with object keys in sorted order.
pub fn canonical_value<T: Serialize>(value: &T) -> Result<Value, HeatgridError> {
    let mut tree = serde_json::to_value(value).map_err(|err| json_error("json-serialize", err))?;
    sort_keys(&mut tree);
    Ok(tree)
}

/// Streams the canonical JSON form of `value` into `writer`.
pub fn write_canonical_json<T, W>(writer: W, value: &T) -> Result<(), HeatgridError>
where
    T: Serialize,
    W: Write,
{
    let tree = canonical_value(value)?;
    serde_json::to_writer(writer, &tree).map_err(|err| json_error("json-write", err))
}

/// Canonical JSON bytes of `value`.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, HeatgridError> {
    let mut bytes = Vec::new();
    write_canonical_json(&mut bytes, value)?;
    Ok(bytes)
}

/// Decodes a JSON artefact.
pub fn from_json_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, HeatgridError> {
    serde_json::from_slice(data).map_err(|err| json_error("json-deserialize", err))
}

/// Encodes a criteria definition as YAML.
pub fn to_yaml_string<T: Serialize>(value: &T) -> Result<String, HeatgridError> {
    serde_yaml::to_string(value).map_err(|err| yaml_error("yaml-serialize", err))
}

/// Decodes a YAML criteria definition.
pub fn from_yaml_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, HeatgridError> {
    serde_yaml::from_slice(data).map_err(|err| yaml_error("yaml-deserialize", err))
}
