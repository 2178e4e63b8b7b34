//! Encoding and decoding of stored documents.
//!
//! Documents are stored as canonical JSON text. `serde_json` never escapes
//! forward slashes or non-ASCII characters, so Unicode content is stored
//! verbatim.

use serde_json::{Map, Value};

use super::DbError;

/// A stored document: an ordered mapping from field name to JSON value.
pub type Document = Map<String, Value>;

/// Encode a value as JSON text.
pub fn encode(value: &Value) -> Result<String, DbError> {
    Ok(serde_json::to_string(value)?)
}

/// Encode a whole document as JSON text.
pub fn encode_document(document: &Document) -> Result<String, DbError> {
    Ok(serde_json::to_string(document)?)
}

/// Decode JSON text into a value.
pub fn decode(text: &str) -> Result<Value, DbError> {
    Ok(serde_json::from_str(text)?)
}

/// Decode JSON text that must hold an object.
pub fn decode_document(text: &str) -> Result<Document, DbError> {
    match decode(text)? {
        Value::Object(map) => Ok(map),
        other => Err(DbError::InvalidDocument {
            found: type_name(&other),
        }),
    }
}

/// Documents from a single object or an array of objects.
pub fn documents_from_value(value: Value) -> Result<Vec<Document>, DbError> {
    let items = match value {
        Value::Object(map) => return Ok(vec![map]),
        Value::Array(items) => items,
        other => {
            return Err(DbError::InvalidDocument {
                found: type_name(&other),
            });
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map),
            other => Err(DbError::InvalidDocument {
                found: type_name(&other),
            }),
        })
        .collect()
}

/// Truthiness of a JSON value, used by projections and `$exists`.
///
/// `null`, `false`, `0`, `""`, `[]` and `{}` are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Get type name for error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
