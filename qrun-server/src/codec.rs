//! Job parameter codec
//!
//! Clients send runtime-encoded parameters in which typed objects are wrapped
//! as `{"__type__": "<kind>", "__value__": <payload>}`. Decoding strips those
//! envelopes so executors see plain JSON work units.

use serde_json::{Map, Value};
use thiserror::Error;

const TYPE_KEY: &str = "__type__";
const VALUE_KEY: &str = "__value__";

/// Errors raised while decoding job parameters
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("Type tag must be a string, found: {0}")]
    InvalidTypeTag(Value),

    #[error("Envelope of type '{0}' has no value")]
    MissingValue(String),
}

/// Decodes runtime-encoded parameters, unwrapping type envelopes recursively
pub fn decode_params(params: &Value) -> Result<Value, CodecError> {
    match params {
        Value::Array(items) => items
            .iter()
            .map(decode_params)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => decode_object(map),
        other => Ok(other.clone()),
    }
}

fn decode_object(map: &Map<String, Value>) -> Result<Value, CodecError> {
    let Some(tag) = map.get(TYPE_KEY) else {
        let mut decoded = Map::with_capacity(map.len());
        for (key, value) in map {
            decoded.insert(key.clone(), decode_params(value)?);
        }
        return Ok(Value::Object(decoded));
    };

    let tag = tag
        .as_str()
        .ok_or_else(|| CodecError::InvalidTypeTag(tag.clone()))?;

    let value = map
        .get(VALUE_KEY)
        .ok_or_else(|| CodecError::MissingValue(tag.to_string()))?;

    decode_params(value)
}

/// Extracts the work-unit list (`pubs`) from decoded parameters
pub fn work_units(params: &Value) -> Vec<Value> {
    match params.get("pubs") {
        Some(Value::Array(pubs)) => pubs.clone(),
        _ => Vec::new(),
    }
}
