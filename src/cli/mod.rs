//! Command-line interface for itembundle.
//!
//! Provides commands for packing a remote item source into a bundle,
//! unpacking a bundle into the local store, and showing configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{HttpFetcher, RemoteItemSource};
use crate::config::{self, ResolvedConfig};
use crate::core::{BundlePacker, BundleUnpacker, PackOptions};
use crate::store::JsonItemStore;

/// itembundle - Offline assessment content bundles
#[derive(Parser, Debug)]
#[command(name = "itembundle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch items and their images into a bundle
    Pack {
        /// Where to write the bundle
        #[arg(short, long, default_value = "assessment_items.zip")]
        output: PathBuf,

        /// Version marker to embed in the bundle
        #[arg(long = "data-version")]
        data_version: Option<String>,

        /// Item index endpoint (overrides config)
        #[arg(long, env = "ITEMBUNDLE_INDEX_URL")]
        index_url: Option<String>,

        /// Bulk item bodies endpoint (overrides config)
        #[arg(long, env = "ITEMBUNDLE_ITEMS_URL")]
        items_url: Option<String>,
    },

    /// Install a bundle from a URL or local path
    Unpack {
        /// http(s) URL or path of the bundle
        source: String,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Pack {
                output,
                data_version,
                index_url,
                items_url,
            } => pack(output, data_version, index_url, items_url).await,
            Commands::Unpack { source } => unpack(&source).await,
            Commands::Config => show_config(),
        }
    }
}

async fn pack(
    output: PathBuf,
    data_version: Option<String>,
    index_url: Option<String>,
    items_url: Option<String>,
) -> Result<()> {
    let cfg = config::config()?;

    let index_url = index_url
        .or_else(|| cfg.source.index_url.clone())
        .context("No item index URL. Use --index-url or set source.index_url in config")?;
    let items_url = items_url.or_else(|| cfg.source.items_url.clone());

    let fetcher = HttpFetcher::new(&cfg.http)?;
    let mut source = RemoteItemSource::new(&fetcher, index_url);
    if let Some(items_url) = items_url {
        source = source.with_items_url(items_url);
    }

    let packer = BundlePacker::new(&fetcher, cfg.media.pattern()?);
    let options = PackOptions {
        version: data_version,
    };
    let report = packer.pack(&source, &output, &options).await?;

    println!("Bundle written: {}", report.output.display());
    println!("  Items:  {}", report.items);
    println!("  Assets: {}", report.assets_written.len());
    if !report.collisions.is_empty() {
        println!("  Name collisions (last URL kept): {}", report.collisions.len());
    }
    if !report.is_complete() {
        eprintln!("  Failed downloads: {}", report.failed.len());
        for failure in &report.failed {
            eprintln!("    {} ({})", failure.url, failure.reason);
        }
    }

    Ok(())
}

async fn unpack(source: &str) -> Result<()> {
    let cfg = config::config()?;

    let fetcher = HttpFetcher::new(&cfg.http)?;
    let store = JsonItemStore::new(&cfg.items_path);
    let unpacker = BundleUnpacker::new(fetcher, store, &cfg.content_dir, cfg.version_path());

    let report = unpacker.unpack(source).await?;

    println!("Bundle installed from {}", source);
    println!(
        "  Items:  {} ({} new, {} replaced)",
        report.items, report.merge.added, report.merge.replaced
    );
    println!("  Assets: {} -> {}", report.assets_extracted.len(), cfg.content_dir.display());
    if report.version_written {
        println!("  Version marker: {}", cfg.version_path().display());
    }
    if !report.skipped.is_empty() {
        eprintln!("  Skipped unsafe entries: {}", report.skipped.join(", "));
    }

    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config() -> Result<()> {
    let cfg: &ResolvedConfig = config::config()?;

    println!("itembundle configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:           {}", cfg.home.display());
    println!("  Item store:     {}", cfg.items_path.display());
    println!("  Version marker: {}", cfg.version_path().display());
    println!("  Content:        {}", cfg.content_dir.display());
    println!();
    println!("Source:");
    println!("  Index URL: {}", cfg.source.index_url.as_deref().unwrap_or("(unset)"));
    println!("  Items URL: {}", cfg.source.items_url.as_deref().unwrap_or("(unset)"));
    println!();
    println!("Media:");
    println!("  Hosts:      {}", cfg.media.hosts.join(", "));
    println!("  Extensions: {}", cfg.media.extensions.join(", "));
    println!();
    println!("HTTP:");
    println!("  Timeout:    {}s", cfg.http.timeout_seconds);
    println!("  User-Agent: {}", cfg.http.user_agent);

    Ok(())
}
