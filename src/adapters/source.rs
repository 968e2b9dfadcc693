//! Remote item source.
//!
//! The upstream API is queried in two steps: an index request that names
//! the items, then a bulk request for their bodies. When no bulk URL is
//! configured the index response must already be the full collection.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::info;

use super::{Fetcher, ItemSource};
use crate::domain::ItemCollection;

/// Item source backed by HTTP endpoints
pub struct RemoteItemSource<F> {
    fetcher: F,
    index_url: String,
    items_url: Option<String>,
}

impl<F: Fetcher> RemoteItemSource<F> {
    /// Source whose index response is the whole collection
    pub fn new(fetcher: F, index_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            index_url: index_url.into(),
            items_url: None,
        }
    }

    /// Fetch item bodies from a separate bulk endpoint
    pub fn with_items_url(mut self, items_url: impl Into<String>) -> Self {
        self.items_url = Some(items_url.into());
        self
    }

    async fn fetch_json(&self, url: &str) -> Result<Value> {
        let body = self.fetcher.fetch(url).await?;
        serde_json::from_slice(&body).with_context(|| format!("Response from {} is not JSON", url))
    }
}

#[async_trait]
impl<F: Fetcher> ItemSource for RemoteItemSource<F> {
    fn describe(&self) -> String {
        match &self.items_url {
            Some(items_url) => format!("{} + {}", self.index_url, items_url),
            None => self.index_url.clone(),
        }
    }

    async fn fetch_collection(&self) -> Result<ItemCollection> {
        let index = self.fetch_json(&self.index_url).await?;

        let Some(items_url) = &self.items_url else {
            return Ok(ItemCollection::try_from(index)?);
        };

        let ids = index_ids(&index)?;
        info!(count = ids.len(), "Fetched item index");

        let url = bulk_url(items_url, &ids)?;
        let bodies = self.fetch_json(url.as_str()).await?;
        Ok(ItemCollection::try_from(bodies)?)
    }
}

/// Item ids named by an index response.
///
/// Accepts an array of id strings, an array of records with `id`, or an
/// object keyed by id.
pub fn index_ids(index: &Value) -> Result<Vec<String>> {
    match index {
        Value::Object(map) => Ok(map.keys().cloned().collect()),
        Value::Array(entries) => entries
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                entry
                    .as_str()
                    .or_else(|| entry.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .with_context(|| format!("Index entry {} has no item id", position))
            })
            .collect(),
        _ => anyhow::bail!("Item index must be a JSON array or object"),
    }
}

fn bulk_url(items_url: &str, ids: &[String]) -> Result<Url> {
    let mut url =
        Url::parse(items_url).with_context(|| format!("Invalid items URL: {}", items_url))?;
    url.query_pairs_mut().append_pair("ids", &ids.join(","));
    Ok(url)
}
