//! Media URL discovery over nested item data.
//!
//! Depth-first walk that decodes double-encoded strings on the way down.
//! The walk is lazy and holds no state between calls, so every call to
//! [`all_image_urls`] starts a fresh traversal.

use std::borrow::Cow;
use std::collections::VecDeque;

use serde_json::Value;

use super::media::MediaPattern;
use super::traversal::{Node, Text};

/// Lazily yield every media URL in `data`, in traversal order.
///
/// Duplicates are yielded once per occurrence. Malformed encoded strings
/// are treated as literal text, never as errors.
pub fn all_image_urls<'a>(data: &'a Value, pattern: &'a MediaPattern) -> ImageUrls<'a> {
    ImageUrls {
        pattern,
        stack: vec![Cow::Borrowed(data)],
        pending: VecDeque::new(),
    }
}

/// Iterator returned by [`all_image_urls`]
pub struct ImageUrls<'a> {
    pattern: &'a MediaPattern,
    /// Values still to visit; decoded strings are owned
    stack: Vec<Cow<'a, Value>>,
    /// URLs found in the last text leaf, not yet yielded
    pending: VecDeque<String>,
}

impl<'a> ImageUrls<'a> {
    fn visit(&mut self, value: Cow<'a, Value>) {
        match value {
            Cow::Borrowed(value) => match Node::classify(value) {
                Node::Mapping(map) => self.stack.extend(map.values().rev().map(Cow::Borrowed)),
                Node::Sequence(items) => self.stack.extend(items.iter().rev().map(Cow::Borrowed)),
                Node::Text(text) => self.visit_text(text),
                Node::Scalar => {}
            },
            // A decoded subtree is owned by this walk alone, so its children
            // are moved onto the stack rather than copied
            Cow::Owned(Value::Object(map)) => self
                .stack
                .extend(map.into_iter().rev().map(|(_, child)| Cow::Owned(child))),
            Cow::Owned(Value::Array(items)) => {
                self.stack.extend(items.into_iter().rev().map(Cow::Owned))
            }
            Cow::Owned(Value::String(s)) => self.visit_text(Text::classify(&s)),
            Cow::Owned(Value::Null | Value::Bool(_) | Value::Number(_)) => {}
        }
    }

    fn visit_text(&mut self, text: Text<'_>) {
        match text {
            Text::Encoded(inner) => self.stack.push(Cow::Owned(inner)),
            Text::Literal(s) => self
                .pending
                .extend(self.pattern.find_urls(s).into_iter().map(str::to_string)),
        }
    }
}

impl Iterator for ImageUrls<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(url) = self.pending.pop_front() {
                return Some(url);
            }
            let value = self.stack.pop()?;
            self.visit(value);
        }
    }
}
