//! Domain types for assessment bundles.
//!
//! This module contains the core data structures:
//! - AssessmentItem: One exercise definition with its encoded payload
//! - ItemCollection: Id-keyed items, the unit stored and bundled

pub mod collection;
pub mod item;

// Re-export commonly used types
pub use collection::{CollectionError, ItemCollection, MergeStats};
pub use item::AssessmentItem;
