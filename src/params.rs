//! Parameter normalization and the truthiness rule used by validation.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::literal;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error("parameter string is not valid JSON: {0}")]
    Decode(String),
    #[error("parameters must be an object, got {0}")]
    NotAnObject(&'static str),
}

/// Turn whatever arrived as "parameters" into a mapping.
///
/// Objects are used as-is, any falsy value (`null`, `false`, `0`, `[]`, blank
/// text) means no parameters, and a string is decoded as JSON (or, failing
/// that, as literal notation). Anything else is rejected.
pub fn normalize(value: &Value) -> Result<Map<String, Value>, ParamsError> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        Value::String(text) => normalize_text(text),
        other if !is_truthy(other) => Ok(Map::new()),
        other => Err(ParamsError::NotAnObject(kind_name(other))),
    }
}

fn normalize_text(text: &str) -> Result<Map<String, Value>, ParamsError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Map::new());
    }
    let decoded = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => value,
        Err(json_err) => match literal::parse(trimmed) {
            Ok(value) => value,
            Err(_) => return Err(ParamsError::Decode(json_err.to_string())),
        },
    };
    match decoded {
        Value::Object(map) => Ok(map),
        other if !is_truthy(&other) => Ok(Map::new()),
        other => Err(ParamsError::NotAnObject(kind_name(&other))),
    }
}

/// `null`, `false`, zero, `""`, `[]` and `{}` are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
