//! Tagged view over JSON values.
//!
//! Item data nests JSON inside JSON: some string fields hold a serialized
//! object or array. Classifying a value yields one of four shapes, and a
//! string is further split into an encoded structure or a literal leaf.
//! Both the locator and the localizer match on [`Node`] exhaustively.

use serde_json::{Map, Value};

/// Shape of a JSON value as seen by a traversal
#[derive(Debug)]
pub enum Node<'a> {
    /// JSON object; keys never take part in matching
    Mapping(&'a Map<String, Value>),

    /// JSON array
    Sequence(&'a [Value]),

    /// JSON string
    Text(Text<'a>),

    /// Null, bool or number
    Scalar,
}

/// A string value after the attempt-parse step
#[derive(Debug)]
pub enum Text<'a> {
    /// The string is itself a serialized object or array
    Encoded(Value),

    /// Any other string, including ones that parse to a JSON scalar
    Literal(&'a str),
}

impl<'a> Node<'a> {
    /// Classify a value, decoding double-encoded strings
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => Node::Mapping(map),
            Value::Array(items) => Node::Sequence(items),
            Value::String(s) => Node::Text(Text::classify(s)),
            Value::Null | Value::Bool(_) | Value::Number(_) => Node::Scalar,
        }
    }
}

impl<'a> Text<'a> {
    /// Attempt to parse a string as structured JSON
    pub fn classify(s: &'a str) -> Self {
        // Cheap reject before invoking the parser on plain prose
        let trimmed = s.trim_start();
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            return Text::Literal(s);
        }

        match serde_json::from_str::<Value>(s) {
            Ok(inner @ (Value::Object(_) | Value::Array(_))) => Text::Encoded(inner),
            _ => Text::Literal(s),
        }
    }
}
