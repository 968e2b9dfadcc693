//! Media URL matching and bundle-local naming.
//!
//! A media URL is an http(s) URL on an allowlisted host whose path ends in
//! an allowlisted image extension, optionally followed by a query or
//! fragment. URLs are found anywhere inside a text leaf, so markdown such as
//! `![](https://host/a.png)` matches too. A match must end where the URL
//! ends: `a.png.bak` and `dir.png/x.txt` are not media URLs.

use std::borrow::Cow;

use regex::Regex;

/// Hosts that serve item images upstream
pub const DEFAULT_HOSTS: &[&str] = &[
    "ka-perseus-graphie.s3.amazonaws.com",
    "ka-perseus-images.s3.amazonaws.com",
];

/// Image extensions that are bundled
pub const DEFAULT_EXTENSIONS: &[&str] = &["png", "gif", "jpg", "jpeg"];

/// Compiled host + extension allowlist
#[derive(Debug, Clone)]
pub struct MediaPattern {
    hosts: Vec<String>,
    extensions: Vec<String>,
    regex: Regex,
}

impl Default for MediaPattern {
    fn default() -> Self {
        // The default allowlists are static and always compile
        Self::new(DEFAULT_HOSTS, DEFAULT_EXTENSIONS)
            .unwrap_or_else(|e| unreachable!("default media pattern is invalid: {}", e))
    }
}

impl MediaPattern {
    /// Build a pattern from host and extension allowlists.
    ///
    /// An empty host list accepts any host.
    pub fn new<H, E>(hosts: &[H], extensions: &[E]) -> Result<Self, regex::Error>
    where
        H: AsRef<str>,
        E: AsRef<str>,
    {
        let hosts: Vec<String> = hosts.iter().map(|h| h.as_ref().to_ascii_lowercase()).collect();
        let extensions: Vec<String> = extensions
            .iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();

        let host_alt = if hosts.is_empty() {
            r"[A-Za-z0-9.\-]+".to_string()
        } else {
            alternation(&hosts)
        };
        let ext_alt = alternation(&extensions);

        // The regex crate has no lookahead, so the character after the URL
        // is captured as `end` and written back when localizing. Trailing
        // sentence punctuation belongs to `end`, not to the URL.
        let regex = Regex::new(&format!(
            r#"(?i)(?P<url>https?://(?:{host_alt})(?::\d+)?/[^\s"'()<>\[\]{{}}?#]*\.(?:{ext_alt})(?:[?#][^\s"'()<>\[\]{{}}]*?)?)(?P<end>[.,;:!]*(?:$|[\s"'()<>\[\]{{}}]))"#
        ))?;

        Ok(Self {
            hosts,
            extensions,
            regex,
        })
    }

    /// Allowlisted hosts
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Allowlisted extensions (lowercase, no dot)
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Every media URL occurring in `text`, in order of appearance
    pub fn find_urls<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.name("url"))
            .map(|m| m.as_str())
            .collect()
    }

    /// Check whether `text` is exactly one media URL
    pub fn is_media_url(&self, text: &str) -> bool {
        self.regex
            .captures(text)
            .and_then(|caps| caps.name("url"))
            .map(|m| m.start() == 0 && m.end() == text.len())
            .unwrap_or(false)
    }

    /// Replace every media URL in `text` with its local name.
    ///
    /// Query strings and fragments are dropped along with the host and path.
    pub fn localize_text<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.regex.replace_all(text, |caps: &regex::Captures<'_>| {
            format!("{}{}", local_name(&caps["url"]), &caps["end"])
        })
    }
}

/// Bundle-local name of a URL: the final path segment
pub fn local_name(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = &url[..end];
    path.rsplit('/').next().unwrap_or(path)
}

fn alternation(items: &[String]) -> String {
    items
        .iter()
        .map(|item| regex::escape(item))
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMG: &str =
        "https://ka-perseus-graphie.s3.amazonaws.com/8ea5af1fa5a5e8b8e727c3211083111897d23f5d.png";

    #[test]
    fn test_local_name_is_basename() {
        assert_eq!(local_name(IMG), "8ea5af1fa5a5e8b8e727c3211083111897d23f5d.png");
        assert_eq!(local_name("http://test.com"), "test.com");
        assert_eq!(local_name("https://h/dir/a.png?size=2#top"), "a.png");
    }

    #[test]
    fn test_whole_string_match() {
        let pattern = MediaPattern::default();
        assert!(pattern.is_media_url(IMG));
        assert!(pattern.is_media_url(
            "http://ka-perseus-images.s3.amazonaws.com/nested/path/photo.JPEG"
        ));
        assert!(!pattern.is_media_url("https://example.com/a.png"));
        assert!(!pattern.is_media_url("https://ka-perseus-graphie.s3.amazonaws.com/a.svg"));
        assert!(!pattern.is_media_url("8ea5af1fa5a5e8b8e727c3211083111897d23f5d.png"));
    }

    #[test]
    fn test_finds_urls_embedded_in_markdown() {
        let pattern = MediaPattern::default();
        let text = format!("Look: ![graph]({}) and ![again]({})", IMG, IMG);

        assert_eq!(pattern.find_urls(&text), vec![IMG, IMG]);
    }

    #[test]
    fn test_localize_text_rewrites_each_occurrence() {
        let pattern = MediaPattern::default();
        let text = format!("![a]({}) plain", IMG);

        assert_eq!(
            pattern.localize_text(&text),
            "![a](8ea5af1fa5a5e8b8e727c3211083111897d23f5d.png) plain"
        );
        assert!(matches!(pattern.localize_text("no urls"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_extension_must_end_segment() {
        let pattern = MediaPattern::default();
        assert!(!pattern.is_media_url("https://ka-perseus-graphie.s3.amazonaws.com/a.pngx"));
    }

    #[test]
    fn test_extension_must_end_url() {
        let pattern = MediaPattern::default();
        for text in [
            "https://ka-perseus-graphie.s3.amazonaws.com/a.png.bak",
            "https://ka-perseus-graphie.s3.amazonaws.com/dir.png/real.txt",
            "https://ka-perseus-graphie.s3.amazonaws.com/a.png-large",
            "see https://ka-perseus-graphie.s3.amazonaws.com/a.png.bak here",
        ] {
            assert!(pattern.find_urls(text).is_empty(), "{}", text);
            assert_eq!(pattern.localize_text(text), text);
        }
    }

    #[test]
    fn test_query_and_fragment_are_part_of_the_url() {
        let pattern = MediaPattern::default();
        let url = "https://ka-perseus-graphie.s3.amazonaws.com/a.png?w=2";

        assert!(pattern.is_media_url(url));
        assert_eq!(pattern.find_urls(&format!("![]({})", url)), vec![url]);
        assert_eq!(pattern.localize_text(url), "a.png");
        assert_eq!(
            pattern.localize_text("x https://ka-perseus-images.s3.amazonaws.com/b.jpg#top y"),
            "x b.jpg y"
        );
    }

    #[test]
    fn test_trailing_punctuation_is_kept() {
        let pattern = MediaPattern::default();
        let text = format!("See {}. Then {}, done", IMG, IMG);

        assert_eq!(pattern.find_urls(&text), vec![IMG, IMG]);
        assert_eq!(
            pattern.localize_text(&text),
            "See 8ea5af1fa5a5e8b8e727c3211083111897d23f5d.png. \
             Then 8ea5af1fa5a5e8b8e727c3211083111897d23f5d.png, done"
        );
    }

    #[test]
    fn test_adjacent_urls_separated_by_one_character() {
        let pattern = MediaPattern::default();
        let text = format!("{} {}", IMG, IMG);

        assert_eq!(pattern.find_urls(&text).len(), 2);
    }

    #[test]
    fn test_empty_host_list_accepts_any_host() {
        let hosts: [&str; 0] = [];
        let pattern = MediaPattern::new(&hosts, &["png"]).unwrap();
        assert!(pattern.is_media_url("https://cdn.example.org/a.png"));
        assert!(!pattern.is_media_url("https://cdn.example.org/a.gif"));
    }
}
