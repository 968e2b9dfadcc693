//! A single assessment item record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One interactive exercise definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentItem {
    /// Stable item identifier (merge key)
    pub id: String,

    /// JSON-encoded widget payload. This is a string holding serialized
    /// JSON, not a nested object.
    pub item_data: String,

    /// Every other field of the upstream record, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AssessmentItem {
    /// Create an item with no extra fields
    pub fn new(id: impl Into<String>, item_data: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            item_data: item_data.into(),
            extra: Map::new(),
        }
    }

    /// Attach an extra upstream field
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Decode `item_data` into its structured form
    pub fn decoded_item_data(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.item_data)
    }
}
