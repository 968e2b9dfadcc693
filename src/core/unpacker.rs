//! Bundle unpacker.
//!
//! Opens a bundle from a URL or a local path, merges its items into the
//! item store, writes the version marker and extracts every asset into the
//! content directory.

use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info, instrument, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use super::error::BundleError;
use super::layout::{self, ITEMS_ENTRY, VERSION_ENTRY};
use super::validator::is_valid_url;
use crate::adapters::Fetcher;
use crate::domain::{ItemCollection, MergeStats};
use crate::store::ItemStore;

/// Outcome of an unpack operation
#[derive(Debug, Clone, Default)]
pub struct UnpackReport {
    /// Items in the bundle
    pub items: usize,

    /// How the bundle's items were merged into the store
    pub merge: MergeStats,

    /// Asset files written to the content directory
    pub assets_extracted: Vec<PathBuf>,

    /// Whether the version marker was written
    pub version_written: bool,

    /// Entries skipped because their names escape the content directory
    pub skipped: Vec<String>,
}

/// Decoded contents of a bundle archive
#[derive(Debug)]
pub struct BundleContents {
    /// Parsed item collection
    pub items: ItemCollection,

    /// Raw version marker bytes, if present
    pub version: Option<Vec<u8>>,

    /// Asset entries: safe relative path and bytes
    pub assets: Vec<(PathBuf, Vec<u8>)>,

    /// Directory entries to create
    pub directories: Vec<PathBuf>,

    /// Entry names rejected as unsafe
    pub skipped: Vec<String>,
}

impl BundleContents {
    /// Read and validate a bundle archive from memory.
    ///
    /// Fails with [`BundleError::MalformedBundle`] if the bytes are not a
    /// zip archive, the items entry is missing, or it does not parse.
    pub fn read(bytes: Vec<u8>) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| BundleError::malformed(format!("not a zip archive: {}", e)))?;

        let items_json = match read_entry(&mut archive, ITEMS_ENTRY) {
            Ok(bytes) => bytes,
            Err(ZipError::FileNotFound) => {
                return Err(BundleError::malformed(format!("missing '{}' entry", ITEMS_ENTRY)).into())
            }
            Err(e) => {
                return Err(
                    BundleError::malformed(format!("unreadable '{}': {}", ITEMS_ENTRY, e)).into(),
                )
            }
        };

        let value: serde_json::Value = serde_json::from_slice(&items_json)
            .map_err(|e| BundleError::malformed(format!("'{}' is not JSON: {}", ITEMS_ENTRY, e)))?;
        let items = ItemCollection::try_from(value)
            .map_err(|e| BundleError::malformed(format!("'{}': {}", ITEMS_ENTRY, e)))?;

        let version = match read_entry(&mut archive, VERSION_ENTRY) {
            Ok(bytes) => Some(bytes),
            Err(ZipError::FileNotFound) => None,
            Err(e) => {
                return Err(
                    BundleError::malformed(format!("unreadable '{}': {}", VERSION_ENTRY, e)).into(),
                )
            }
        };

        let mut assets = Vec::new();
        let mut directories = Vec::new();
        let mut skipped = Vec::new();

        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| BundleError::malformed(format!("unreadable entry #{}: {}", index, e)))?;
            let name = entry.name().to_string();

            if layout::is_reserved(&name) {
                continue;
            }

            let Some(relative) = safe_relative_path(&name) else {
                skipped.push(name);
                continue;
            };

            if entry.is_dir() {
                directories.push(relative);
                continue;
            }

            let mut bytes = Vec::with_capacity(capacity_hint(entry.size()));
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| BundleError::malformed(format!("unreadable entry '{}': {}", name, e)))?;
            assets.push((relative, bytes));
        }

        Ok(Self {
            items,
            version,
            assets,
            directories,
            skipped,
        })
    }
}

/// Installs bundles into an item store and content directory
pub struct BundleUnpacker<F, S> {
    fetcher: F,
    store: S,
    content_dir: PathBuf,
    version_path: PathBuf,
}

impl<F: Fetcher, S: ItemStore> BundleUnpacker<F, S> {
    /// Create an unpacker
    pub fn new(
        fetcher: F,
        store: S,
        content_dir: impl Into<PathBuf>,
        version_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            store,
            content_dir: content_dir.into(),
            version_path: version_path.into(),
        }
    }

    /// The item store this unpacker merges into
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Unpack the bundle at `source` (http(s) URL or local path)
    #[instrument(skip(self))]
    pub async fn unpack(&self, source: &str) -> Result<UnpackReport> {
        let bytes = self.obtain(source).await?;
        let contents = BundleContents::read(bytes)?;
        self.install(contents).await
    }

    /// Fetch or read the raw bundle bytes
    async fn obtain(&self, source: &str) -> Result<Vec<u8>> {
        if is_valid_url(source) {
            info!(url = source, "Downloading bundle");
            return self.fetcher.fetch(source).await.map_err(|e| {
                BundleError::BundleSourceUnreachable {
                    source_ref: source.to_string(),
                    reason: format!("{:#}", e),
                }
                .into()
            });
        }

        let path = Path::new(source);
        if !path.is_file() {
            return Err(BundleError::InvalidSource(source.to_string()).into());
        }

        info!(path = %path.display(), "Opening bundle");
        fs::read(path)
            .await
            .with_context(|| format!("Failed to read bundle: {}", path.display()))
    }

    /// Merge, write the version marker, extract assets
    pub async fn install(&self, contents: BundleContents) -> Result<UnpackReport> {
        let BundleContents {
            items,
            version,
            assets,
            directories,
            skipped,
        } = contents;

        let item_count = items.len();
        let merge = self.merge(items).await?;
        info!(
            items = item_count,
            added = merge.added,
            replaced = merge.replaced,
            "Merged items into store"
        );

        let version_written = match version {
            Some(bytes) => {
                if let Some(parent) = self.version_path.parent() {
                    fs::create_dir_all(parent).await?;
                }
                fs::write(&self.version_path, bytes).await.with_context(|| {
                    format!("Failed to write version marker: {}", self.version_path.display())
                })?;
                true
            }
            None => false,
        };

        fs::create_dir_all(&self.content_dir).await.with_context(|| {
            format!("Failed to create content directory: {}", self.content_dir.display())
        })?;

        for dir in directories {
            fs::create_dir_all(self.content_dir.join(dir)).await?;
        }

        let mut assets_extracted = Vec::with_capacity(assets.len());
        for (relative, bytes) in assets {
            let target = self.content_dir.join(&relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&target, bytes)
                .await
                .with_context(|| format!("Failed to extract asset: {}", target.display()))?;
            debug!(path = %target.display(), "Extracted asset");
            assets_extracted.push(target);
        }

        for name in &skipped {
            warn!(entry = %name, "Skipped bundle entry with unsafe name");
        }

        info!(
            assets = assets_extracted.len(),
            content_dir = %self.content_dir.display(),
            "Bundle installed"
        );

        Ok(UnpackReport {
            items: item_count,
            merge,
            assets_extracted,
            version_written,
            skipped,
        })
    }

    /// Load-merge-save under the store lock
    async fn merge(&self, incoming: ItemCollection) -> Result<MergeStats> {
        let _guard = self.store.lock().await?;

        let mut existing = self.store.load().await?;
        let stats = existing.merge(incoming);
        self.store.save(&existing).await?;

        Ok(stats)
    }
}

/// Upper bound on buffer preallocation, whatever size an entry claims
const MAX_PREALLOCATION: u64 = 1 << 20;

fn capacity_hint(claimed: u64) -> usize {
    claimed.min(MAX_PREALLOCATION) as usize
}

fn read_entry(
    archive: &mut ZipArchive<Cursor<Vec<u8>>>,
    name: &str,
) -> Result<Vec<u8>, ZipError> {
    let mut entry = archive.by_name(name)?;
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Entry name as a relative path that stays inside the content directory
fn safe_relative_path(name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    let mut relative = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}
