//! Shared test collaborators and fixtures.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use itembundle::store::StoreLock;
use itembundle::{Fetcher, ItemCollection, ItemStore};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const SAMPLE_JSON: &str = include_str!("../fixtures/assessment_items_sample.json");

pub const IMG_PNG: &str =
    "https://ka-perseus-graphie.s3.amazonaws.com/8ea5af1fa5a5e8b8e727c3211083111897d23f5d.png";
pub const IMG_JPG: &str =
    "https://ka-perseus-images.s3.amazonaws.com/2c8ab0f1b4e1d3c6f6e8e7d1a9b2c4d5e6f7a8b9.jpg";
pub const IMG_GIF: &str =
    "https://ka-perseus-graphie.s3.amazonaws.com/a1c3e5f7b9d1f3a5c7e9b1d3f5a7c9e1b3d5f7a9.gif";

pub const PNG_NAME: &str = "8ea5af1fa5a5e8b8e727c3211083111897d23f5d.png";
pub const JPG_NAME: &str = "2c8ab0f1b4e1d3c6f6e8e7d1a9b2c4d5e6f7a8b9.jpg";
pub const GIF_NAME: &str = "a1c3e5f7b9d1f3a5c7e9b1d3f5a7c9e1b3d5f7a9.gif";

/// Parsed sample collection
pub fn sample_collection() -> ItemCollection {
    ItemCollection::from_slice(SAMPLE_JSON.as_bytes()).unwrap()
}

/// Fake image bytes derived from a URL
pub fn fake_image(url: &str) -> Vec<u8> {
    format!("IMAGE:{}", url).into_bytes()
}

/// Fetcher serving canned responses and recording every request
#[derive(Default)]
pub struct MemoryFetcher {
    responses: HashMap<String, Vec<u8>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(url.to_string(), body.into());
        self
    }

    /// Serve every sample image
    pub fn with_sample_images(self) -> Self {
        self.with(IMG_PNG, fake_image(IMG_PNG))
            .with(IMG_JPG, fake_image(IMG_JPG))
            .with(IMG_GIF, fake_image(IMG_GIF))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("404 Not Found: {}", url))
    }
}

/// Item store kept in memory
#[derive(Default)]
pub struct MemoryItemStore {
    items: Mutex<ItemCollection>,
    saves: Mutex<usize>,
}

impl MemoryItemStore {
    pub fn new(items: ItemCollection) -> Self {
        Self {
            items: Mutex::new(items),
            saves: Mutex::new(0),
        }
    }

    pub fn snapshot(&self) -> ItemCollection {
        self.items.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn lock(&self) -> Result<StoreLock> {
        Ok(StoreLock::unlocked())
    }

    async fn load(&self) -> Result<ItemCollection> {
        Ok(self.snapshot())
    }

    async fn save(&self, items: &ItemCollection) -> Result<()> {
        *self.items.lock().unwrap() = items.clone();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// Build a zip archive in memory
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        for (name, bytes) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
    }
    cursor.into_inner()
}

/// Entry names of a zip file on disk, in archive order
pub fn zip_entry_names(path: &Path) -> Vec<String> {
    let bytes = std::fs::read(path).unwrap();
    let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    archive.file_names().map(str::to_string).collect()
}

/// Contents of one entry of a zip file on disk
pub fn zip_entry(path: &Path, name: &str) -> Vec<u8> {
    let bytes = std::fs::read(path).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut out = Vec::new();
    entry.read_to_end(&mut out).unwrap();
    out
}
