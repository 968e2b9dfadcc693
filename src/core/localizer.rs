//! Rewrite remote media URLs to bundle-local names.

use serde_json::Value;

use super::media::MediaPattern;
use super::traversal::{Node, Text};

/// Deep copy of `data` with every media URL replaced by its local name.
///
/// Objects and arrays keep their keys and lengths. Strings that hold
/// encoded JSON are transformed inside and re-encoded into the same field,
/// so the double-encoded shape survives. The input is never mutated.
pub fn localhosted_image_urls(data: &Value, pattern: &MediaPattern) -> Value {
    match Node::classify(data) {
        Node::Mapping(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), localhosted_image_urls(value, pattern)))
                .collect(),
        ),
        Node::Sequence(items) => Value::Array(
            items
                .iter()
                .map(|value| localhosted_image_urls(value, pattern))
                .collect(),
        ),
        Node::Text(Text::Encoded(inner)) => {
            Value::String(localhosted_image_urls(&inner, pattern).to_string())
        }
        Node::Text(Text::Literal(s)) => Value::String(pattern.localize_text(s).into_owned()),
        Node::Scalar => data.clone(),
    }
}
