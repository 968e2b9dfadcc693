//! Bundle packer.
//!
//! Fetches the remote item collection, localizes its media URLs, downloads
//! every referenced asset and writes one zip archive holding the localized
//! JSON plus the assets keyed by local name.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::layout::{self, ITEMS_ENTRY, VERSION_ENTRY};
use super::localizer::localhosted_image_urls;
use super::locator::all_image_urls;
use super::media::{local_name, MediaPattern};
use crate::adapters::{Fetcher, ItemSource};

/// Optional extras written into the bundle
#[derive(Debug, Clone, Default)]
pub struct PackOptions {
    /// Contents of the version marker entry; omitted when `None`
    pub version: Option<String>,
}

/// An asset that could not be bundled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFailure {
    pub url: String,
    pub local_name: String,
    pub reason: String,
}

/// Two distinct URLs that share a local name. The later URL wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollision {
    pub local_name: String,
    pub kept_url: String,
    pub dropped_url: String,
}

/// Outcome of a pack operation
#[derive(Debug, Clone)]
pub struct PackReport {
    /// Where the bundle was written
    pub output: PathBuf,

    /// Number of items in the bundled collection
    pub items: usize,

    /// Asset entry names, in archive order
    pub assets_written: Vec<String>,

    /// Assets skipped because their download failed
    pub failed: Vec<AssetFailure>,

    /// Local-name conflicts resolved by last-write-wins
    pub collisions: Vec<NameCollision>,

    /// Whether a version marker entry was written
    pub version_written: bool,
}

impl PackReport {
    /// True if every discovered asset made it into the bundle
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Deduplicate URLs by local name, keeping first-seen order.
///
/// When two different URLs map to the same local name, the one seen last
/// is kept and the conflict is reported.
pub fn plan_assets<I>(urls: I) -> (IndexMap<String, String>, Vec<NameCollision>)
where
    I: IntoIterator<Item = String>,
{
    let mut plan: IndexMap<String, String> = IndexMap::new();
    let mut collisions = Vec::new();

    for url in urls {
        let name = local_name(&url).to_string();
        match plan.get_mut(&name) {
            Some(existing) if *existing != url => {
                collisions.push(NameCollision {
                    local_name: name,
                    kept_url: url.clone(),
                    dropped_url: std::mem::replace(existing, url),
                });
            }
            Some(_) => {}
            None => {
                plan.insert(name, url);
            }
        }
    }

    (plan, collisions)
}

/// Builds bundles from a remote item source
pub struct BundlePacker<F> {
    fetcher: F,
    pattern: MediaPattern,
}

impl<F: Fetcher> BundlePacker<F> {
    /// Create a packer that downloads assets through `fetcher`
    pub fn new(fetcher: F, pattern: MediaPattern) -> Self {
        Self { fetcher, pattern }
    }

    /// Pack `source` into a zip archive at `dest`.
    ///
    /// Asset download failures are collected in the report and do not
    /// abort packing. The archive only appears at `dest` once complete.
    #[instrument(skip(self, source, dest, options), fields(dest = %dest.display()))]
    pub async fn pack(
        &self,
        source: &dyn ItemSource,
        dest: &Path,
        options: &PackOptions,
    ) -> Result<PackReport> {
        info!(source = %source.describe(), "Fetching item collection");
        let collection = source.fetch_collection().await?;
        let original = collection.to_value().context("Failed to serialize items")?;

        let localized = localhosted_image_urls(&original, &self.pattern);

        // Download from the original URLs, not the rewritten names
        let (plan, collisions) = plan_assets(all_image_urls(&original, &self.pattern));
        info!(
            items = collection.len(),
            assets = plan.len(),
            "Localized item collection"
        );
        for collision in &collisions {
            warn!(
                local_name = %collision.local_name,
                kept = %collision.kept_url,
                dropped = %collision.dropped_url,
                "Two media URLs share a local name; keeping the later one"
            );
        }

        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

        let tmp = NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        let mut zip = ZipWriter::new(tmp);
        let entry_options = entry_options();

        let mut assets_written = Vec::new();
        let mut failed = Vec::new();

        for (name, url) in &plan {
            if layout::is_reserved(name) {
                failed.push(AssetFailure {
                    url: url.clone(),
                    local_name: name.clone(),
                    reason: "local name collides with a reserved bundle entry".to_string(),
                });
                continue;
            }

            match self.fetcher.fetch(url).await {
                Ok(bytes) => {
                    write_entry(&mut zip, name, &bytes, entry_options)?;
                    debug!(%url, entry = %name, bytes = bytes.len(), "Bundled asset");
                    assets_written.push(name.clone());
                }
                Err(e) => failed.push(AssetFailure {
                    url: url.clone(),
                    local_name: name.clone(),
                    reason: format!("{:#}", e),
                }),
            }
        }

        if !failed.is_empty() {
            let urls: Vec<&str> = failed.iter().map(|f| f.url.as_str()).collect();
            warn!(
                count = failed.len(),
                urls = %urls.join(", "),
                "Some assets could not be bundled"
            );
        }

        let items_json = serialize_items(&localized)?;
        write_entry(&mut zip, ITEMS_ENTRY, &items_json, entry_options)?;

        let version_written = match &options.version {
            Some(version) => {
                write_entry(&mut zip, VERSION_ENTRY, version.as_bytes(), entry_options)?;
                true
            }
            None => false,
        };

        let tmp = zip.finish().context("Failed to finalize bundle archive")?;
        tmp.persist(dest)
            .with_context(|| format!("Failed to write bundle: {}", dest.display()))?;

        info!(
            assets = assets_written.len(),
            failed = failed.len(),
            "Bundle written"
        );

        Ok(PackReport {
            output: dest.to_path_buf(),
            items: collection.len(),
            assets_written,
            failed,
            collisions,
            version_written,
        })
    }
}

fn entry_options() -> SimpleFileOptions {
    // Fixed timestamps keep archives reproducible
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
}

fn write_entry<W>(
    zip: &mut ZipWriter<W>,
    name: &str,
    bytes: &[u8],
    options: SimpleFileOptions,
) -> Result<()>
where
    W: Write + std::io::Seek,
{
    zip.start_file(name, options)
        .with_context(|| format!("Failed to start bundle entry '{}'", name))?;
    zip.write_all(bytes)
        .with_context(|| format!("Failed to write bundle entry '{}'", name))?;
    Ok(())
}

fn serialize_items(localized: &Value) -> Result<Vec<u8>> {
    serde_json::to_vec(localized).context("Failed to serialize localized items")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plan_dedupes_by_local_name() {
        let (plan, collisions) = plan_assets(urls(&[
            "https://h/a.png",
            "https://h/b.png",
            "https://h/a.png",
        ]));

        assert_eq!(plan.keys().collect::<Vec<_>>(), vec!["a.png", "b.png"]);
        assert!(collisions.is_empty());
    }

    #[test]
    fn test_plan_last_write_wins_on_collision() {
        let (plan, collisions) = plan_assets(urls(&[
            "https://h/one/a.png",
            "https://h/b.png",
            "https://h/two/a.png",
        ]));

        assert_eq!(plan.keys().collect::<Vec<_>>(), vec!["a.png", "b.png"]);
        assert_eq!(plan["a.png"], "https://h/two/a.png");
        assert_eq!(
            collisions,
            vec![NameCollision {
                local_name: "a.png".to_string(),
                kept_url: "https://h/two/a.png".to_string(),
                dropped_url: "https://h/one/a.png".to_string(),
            }]
        );
    }
}
