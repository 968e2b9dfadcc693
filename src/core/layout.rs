//! Reserved entry names of the bundle archive.
//!
//! ```text
//! bundle.zip
//! ├── assessment_items.json          # localized ItemCollection (required)
//! ├── assessment_items.json.version  # version marker (optional)
//! └── <basename>.png|gif|jpg         # one entry per distinct media URL
//! ```

/// Entry holding the localized item collection
pub const ITEMS_ENTRY: &str = "assessment_items.json";

/// Entry holding the opaque version marker
pub const VERSION_ENTRY: &str = "assessment_items.json.version";

/// Check whether an entry name is reserved for bundle metadata
pub fn is_reserved(name: &str) -> bool {
    name == ITEMS_ENTRY || name == VERSION_ENTRY
}
