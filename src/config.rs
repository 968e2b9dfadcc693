//! Configuration for itembundle paths and endpoints.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (ITEMBUNDLE_HOME, ITEMBUNDLE_CONTENT)
//! 2. Config file (.itembundle/config.yaml)
//! 3. Defaults (~/.itembundle)
//!
//! Config file discovery:
//! - Searches current directory and parents for .itembundle/config.yaml
//! - Paths in config file are relative to the .itembundle/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::HttpConfig;
use crate::core::media::{MediaPattern, DEFAULT_EXTENSIONS, DEFAULT_HOSTS};
use crate::core::ITEMS_ENTRY;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub media: Option<MediaConfig>,
    #[serde(default)]
    pub http: Option<HttpConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory holding the item store (relative to .itembundle/)
    pub home: Option<String>,
    /// Directory assets are extracted into
    pub content: Option<String>,
    /// Item store file (default: <home>/assessment_items.json)
    pub items: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    /// Item index endpoint
    pub index_url: Option<String>,
    /// Bulk item bodies endpoint
    pub items_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub hosts: Option<Vec<String>>,
    pub extensions: Option<Vec<String>>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// Asset extraction directory
    pub content_dir: PathBuf,
    /// Item store file
    pub items_path: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Remote item endpoints
    pub source: SourceConfig,
    /// Media URL allowlists
    pub media: MediaSettings,
    /// HTTP client settings
    pub http: HttpConfig,
}

#[derive(Debug, Clone)]
pub struct MediaSettings {
    pub hosts: Vec<String>,
    pub extensions: Vec<String>,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            hosts: DEFAULT_HOSTS.iter().map(|h| h.to_string()).collect(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl MediaSettings {
    /// Compile the allowlists
    pub fn pattern(&self) -> Result<MediaPattern> {
        MediaPattern::new(self.hosts.as_slice(), self.extensions.as_slice())
            .context("Invalid media host/extension allowlist")
    }
}

impl ResolvedConfig {
    /// Version marker path, next to the item store
    pub fn version_path(&self) -> PathBuf {
        let mut name = self
            .items_path
            .file_name()
            .unwrap_or_default()
            .to_os_string();
        name.push(".version");
        self.items_path.with_file_name(name)
    }
}

/// Environment overrides, captured once so resolution stays testable
#[derive(Debug, Clone, Default)]
struct EnvOverrides {
    home: Option<PathBuf>,
    content: Option<PathBuf>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            home: std::env::var("ITEMBUNDLE_HOME").ok().map(PathBuf::from),
            content: std::env::var("ITEMBUNDLE_CONTENT").ok().map(PathBuf::from),
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".itembundle").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Combine config file, env overrides and defaults
fn resolve_config(
    default_home: PathBuf,
    config_file: Option<PathBuf>,
    env: EnvOverrides,
) -> Result<ResolvedConfig> {
    let file = match &config_file {
        Some(path) => Some(load_config_file(path)?),
        None => None,
    };

    // Relative config paths are anchored at .itembundle/
    let base_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."))
        .to_path_buf();
    let paths = file.as_ref().map(|f| &f.paths);
    let from_file = |path: Option<&String>| path.map(|p| resolve_path(&base_dir, p));

    let home = env
        .home
        .or_else(|| from_file(paths.and_then(|p| p.home.as_ref())))
        .unwrap_or(default_home);

    let content_dir = env
        .content
        .or_else(|| from_file(paths.and_then(|p| p.content.as_ref())))
        .unwrap_or_else(|| home.join("content"));

    let items_path = from_file(paths.and_then(|p| p.items.as_ref()))
        .unwrap_or_else(|| home.join(ITEMS_ENTRY));

    let source = file.as_ref().map(|f| f.source.clone()).unwrap_or_default();

    let defaults = MediaSettings::default();
    let media = match file.as_ref().and_then(|f| f.media.clone()) {
        Some(media) => MediaSettings {
            hosts: media.hosts.unwrap_or(defaults.hosts),
            extensions: media.extensions.unwrap_or(defaults.extensions),
        },
        None => defaults,
    };

    let http = file.as_ref().and_then(|f| f.http.clone()).unwrap_or_default();

    Ok(ResolvedConfig {
        home,
        content_dir,
        items_path,
        config_file,
        source,
        media,
        http,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".itembundle");

    resolve_config(default_home, find_config_file(), EnvOverrides::from_env())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
