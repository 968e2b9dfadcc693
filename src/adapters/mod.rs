//! Adapter interfaces for external systems.
//!
//! The packer and unpacker never talk to the network directly. They go
//! through [`Fetcher`] for raw bytes and [`ItemSource`] for the remote item
//! collection, so tests can substitute in-memory implementations.

pub mod http;
pub mod source;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::ItemCollection;

// Re-export the HTTP-backed implementations
pub use http::{HttpConfig, HttpFetcher};
pub use source::RemoteItemSource;

/// Fetch the body of a URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the response body. No auth, no retries.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for &T {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        (**self).fetch(url).await
    }
}

/// Source of the assessment items to bundle
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Human-readable source description (for logs)
    fn describe(&self) -> String;

    /// Fetch the complete item collection
    async fn fetch_collection(&self) -> Result<ItemCollection>;
}
