//! Keyed collection of assessment items.
//!
//! The collection is the unit persisted to the item store and the unit
//! carried inside a bundle. On the wire it is a JSON object keyed by item
//! id. Reading also accepts a JSON array of records that carry `id`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use super::item::AssessmentItem;

/// Errors raised while interpreting JSON as an item collection
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("Item at position {position} has no string `id` field")]
    MissingIdentifier { position: usize },

    #[error("Item '{id}' is malformed: {source}")]
    InvalidItem {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Expected a JSON object or array of items, found {found}")]
    NotACollection { found: &'static str },
}

/// Result of merging one collection into another
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Items whose id was not present before
    pub added: usize,

    /// Items that replaced an existing record with the same id
    pub replaced: usize,
}

/// Ordered, id-keyed set of assessment items
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct ItemCollection {
    items: IndexMap<String, AssessmentItem>,
}

impl ItemCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item, returning the record it replaced
    pub fn insert(&mut self, item: AssessmentItem) -> Option<AssessmentItem> {
        self.items.insert(item.id.clone(), item)
    }

    /// Get an item by id
    pub fn get(&self, id: &str) -> Option<&AssessmentItem> {
        self.items.get(id)
    }

    /// Check whether an id is present
    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Item ids in collection order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Items in collection order
    pub fn iter(&self) -> impl Iterator<Item = &AssessmentItem> {
        self.items.values()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert-or-replace every item of `incoming` by id.
    ///
    /// Items only present in `self` are kept untouched. A replaced item keeps
    /// its original position; new items are appended in `incoming` order, so
    /// merging the same collection twice gives the same result as once.
    pub fn merge(&mut self, incoming: ItemCollection) -> MergeStats {
        let mut stats = MergeStats::default();

        for (id, item) in incoming.items {
            if self.items.insert(id, item).is_some() {
                stats.replaced += 1;
            } else {
                stats.added += 1;
            }
        }

        stats
    }

    /// Serialize into a JSON value (object keyed by id)
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Parse from raw JSON bytes
    pub fn from_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Ok(Self::try_from(value)?)
    }
}

impl Serialize for ItemCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl TryFrom<Value> for ItemCollection {
    type Error = CollectionError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut collection = Self::new();

        match value {
            Value::Object(map) => {
                // The key is authoritative when the record's own id disagrees
                for (key, mut record) in map {
                    if let Value::Object(fields) = &mut record {
                        fields.insert("id".to_string(), Value::String(key.clone()));
                    }
                    collection.insert(parse_item(key, record)?);
                }
            }
            Value::Array(records) => {
                for (position, record) in records.into_iter().enumerate() {
                    let id = record
                        .get("id")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or(CollectionError::MissingIdentifier { position })?;
                    collection.insert(parse_item(id, record)?);
                }
            }
            other => {
                return Err(CollectionError::NotACollection {
                    found: json_kind(&other),
                })
            }
        }

        Ok(collection)
    }
}

impl FromIterator<AssessmentItem> for ItemCollection {
    fn from_iter<I: IntoIterator<Item = AssessmentItem>>(iter: I) -> Self {
        let mut collection = Self::new();
        for item in iter {
            collection.insert(item);
        }
        collection
    }
}

fn parse_item(id: String, record: Value) -> Result<AssessmentItem, CollectionError> {
    serde_json::from_value(record).map_err(|source| CollectionError::InvalidItem { id, source })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: &str, body: &str) -> AssessmentItem {
        AssessmentItem::new(id, format!(r#"{{"question":{{"content":"{}"}}}}"#, body))
    }

    #[test]
    fn test_merge_is_non_destructive() {
        let mut existing: ItemCollection = [item("A", "a"), item("B", "b")].into_iter().collect();
        let incoming: ItemCollection = [item("B", "b2"), item("C", "c")].into_iter().collect();

        let stats = existing.merge(incoming);

        assert_eq!(stats, MergeStats { added: 1, replaced: 1 });
        assert_eq!(existing.ids().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(existing.get("A"), Some(&item("A", "a")));
        assert_eq!(existing.get("B"), Some(&item("B", "b2")));
        assert_eq!(existing.get("C"), Some(&item("C", "c")));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let incoming: ItemCollection = [item("B", "b2"), item("C", "c")].into_iter().collect();

        let mut once: ItemCollection = [item("A", "a")].into_iter().collect();
        once.merge(incoming.clone());

        let mut twice = once.clone();
        let stats = twice.merge(incoming);

        assert_eq!(once, twice);
        assert_eq!(stats, MergeStats { added: 0, replaced: 2 });
    }

    #[test]
    fn test_object_form_uses_key_as_id() {
        let value = json!({
            "k1": {"item_data": "{}", "sha": "1"},
            "k2": {"id": "stale", "item_data": "{}"}
        });

        let collection = ItemCollection::try_from(value).unwrap();
        assert_eq!(collection.ids().collect::<Vec<_>>(), vec!["k1", "k2"]);
        assert_eq!(collection.get("k2").unwrap().id, "k2");
        assert_eq!(collection.get("k1").unwrap().extra["sha"], "1");
    }

    #[test]
    fn test_array_form_requires_id() {
        let value = json!([
            {"id": "a", "item_data": "{}"},
            {"item_data": "{}"}
        ]);

        match ItemCollection::try_from(value) {
            Err(CollectionError::MissingIdentifier { position }) => assert_eq!(position, 1),
            other => panic!("Expected MissingIdentifier, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_item_data_is_rejected() {
        let value = json!({"a": {"sha": "1"}});
        assert!(matches!(
            ItemCollection::try_from(value),
            Err(CollectionError::InvalidItem { .. })
        ));
    }

    #[test]
    fn test_scalar_is_not_a_collection() {
        assert!(matches!(
            ItemCollection::try_from(json!("nope")),
            Err(CollectionError::NotACollection { found: "a string" })
        ));
    }

    #[test]
    fn test_serializes_as_object_keyed_by_id() {
        let collection: ItemCollection = [item("A", "a")].into_iter().collect();
        let value = collection.to_value().unwrap();

        assert!(value.is_object());
        assert_eq!(value["A"]["id"], "A");

        let back = ItemCollection::try_from(value).unwrap();
        assert_eq!(back, collection);
    }
}
