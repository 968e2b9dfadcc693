//! Persistent item store.
//!
//! The store owns the on-disk [`ItemCollection`] that survives across
//! pack/unpack cycles. The unpacker only needs load/save plus an exclusive
//! lock that spans its load-merge-save sequence.

pub mod json_store;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::ItemCollection;

pub use json_store::{JsonItemStore, StoreLock};

/// Load/save contract for the item store
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Take the store's exclusive lock. Held until the guard is dropped.
    async fn lock(&self) -> Result<StoreLock>;

    /// Load the current collection (empty if nothing is stored yet)
    async fn load(&self) -> Result<ItemCollection>;

    /// Replace the stored collection
    async fn save(&self, items: &ItemCollection) -> Result<()>;
}
