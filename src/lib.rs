//! itembundle - Offline assessment content bundles
//!
//! Packs assessment items and every image they reference into a single zip
//! archive, and installs such archives on machines without network access.
//!
//! # Architecture
//!
//! - Packing walks the item collection (including JSON encoded inside JSON
//!   strings), rewrites image URLs to bundle-local file names, downloads
//!   each image once and writes the archive
//! - Unpacking merges the bundled items into the local item store by id,
//!   then extracts the images into the content directory
//!
//! # Modules
//!
//! - `adapters`: External collaborators (HTTP fetcher, remote item source)
//! - `core`: Locator, localizer, validator, packer, unpacker
//! - `domain`: Data structures (AssessmentItem, ItemCollection)
//! - `store`: Persistent item store
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Build a bundle from the configured item source
//! itembundle pack --output assessment_items.zip
//!
//! # Install it elsewhere, from a file or a URL
//! itembundle unpack ./assessment_items.zip
//! itembundle unpack https://example.com/assessment_items.zip
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod store;

// Re-export main types at crate root for convenience
pub use adapters::{Fetcher, HttpFetcher, ItemSource, RemoteItemSource};
pub use core::{
    all_image_urls, is_valid_url, localhosted_image_urls, BundleError, BundlePacker,
    BundleUnpacker, MediaPattern, PackOptions, PackReport, UnpackReport,
};
pub use domain::{AssessmentItem, ItemCollection, MergeStats};
pub use store::{ItemStore, JsonItemStore};
