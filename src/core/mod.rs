//! Core bundle logic.
//!
//! This module contains:
//! - Traversal: Tagged view over nested, partly double-encoded JSON
//! - Media: URL allowlist matching and local naming
//! - Locator / Localizer: Find and rewrite media URLs
//! - Validator: URL vs local path decision
//! - Packer / Unpacker: Bundle creation and installation

pub mod error;
pub mod layout;
pub mod localizer;
pub mod locator;
pub mod media;
pub mod packer;
pub mod traversal;
pub mod unpacker;
pub mod validator;

// Re-export commonly used types
pub use error::BundleError;
pub use layout::{ITEMS_ENTRY, VERSION_ENTRY};
pub use localizer::localhosted_image_urls;
pub use locator::{all_image_urls, ImageUrls};
pub use media::{local_name, MediaPattern};
pub use packer::{plan_assets, AssetFailure, BundlePacker, NameCollision, PackOptions, PackReport};
pub use traversal::{Node, Text};
pub use unpacker::{BundleContents, BundleUnpacker, UnpackReport};
pub use validator::is_valid_url;
