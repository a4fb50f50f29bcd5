//! Decoding for the JSON-like strings the statistics API embeds in records.
//!
//! `passback_params` arrives as a Python-style dict literal, e.g.
//! `{'oauth_consumer_key': 'ck1'}`. Decoding swaps every single quote for a
//! double quote and then parses strict JSON. A value that itself contains an
//! apostrophe therefore fails to decode.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LenientDecodeError {
    #[error("not valid JSON after quote normalization: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn normalize_quotes(text: &str) -> String {
    text.replace('\'', "\"")
}

/// Decodes `text` into a JSON object, accepting single-quoted strings.
pub fn decode_lenient_object(text: &str) -> Result<Map<String, Value>, LenientDecodeError> {
    match serde_json::from_str::<Value>(&normalize_quotes(text))? {
        Value::Object(map) => Ok(map),
        other => Err(LenientDecodeError::NotAnObject(json_type_name(&other))),
    }
}
