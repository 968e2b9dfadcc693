//! Distinguish fetchable URLs from local paths.

use reqwest::Url;

/// True if `s` is an absolute http(s) URL with a non-empty host.
///
/// Bare paths, relative references and other schemes are rejected.
pub fn is_valid_url(s: &str) -> bool {
    match Url::parse(s) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().map(|h| !h.is_empty()).unwrap_or(false)
        }
        Err(_) => false,
    }
}
