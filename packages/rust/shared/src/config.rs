//! Application configuration for Postnote.
//!
//! User config lives at `~/.postnote/postnote.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PostnoteError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "postnote.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".postnote";

// ---------------------------------------------------------------------------
// Config structs (matching postnote.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Endpoint handling.
    #[serde(default)]
    pub endpoint: EndpointConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default endnote content string.
    #[serde(default = "default_content")]
    pub content: String,

    /// Default delay between write calls, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_between_calls_ms: u64,

    /// Browse page size for discovery.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            content: default_content(),
            delay_between_calls_ms: default_delay_ms(),
            page_size: default_page_size(),
        }
    }
}

fn default_content() -> String {
    "Test endnote content".into()
}
fn default_delay_ms() -> u64 {
    50
}
fn default_page_size() -> u32 {
    100
}

/// `[endpoint]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Rewrite an exact `localhost` host to `127.0.0.1` before connecting.
    #[serde(default = "default_true")]
    pub rewrite_localhost: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            rewrite_localhost: default_true(),
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime migration configuration — merged from config file + CLI flags.
///
/// Constructed once per run and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Admin API base URL as supplied (normalized at initialization).
    pub api_url: String,
    /// Admin API key.
    pub admin_key: String,
    /// Target post identifiers.
    pub post_ids: Vec<String>,
    /// Endnote content string.
    pub content: String,
    /// Delay between write calls, in milliseconds.
    pub delay_between_calls_ms: u64,
    /// Concurrent in-flight writes. One at a time, so the store's write
    /// path is never flooded; the apply loop is safe at higher values.
    pub concurrency: u32,
    /// Browse page size for discovery.
    pub page_size: u32,
    /// Rewrite an exact `localhost` host to `127.0.0.1`.
    pub rewrite_localhost: bool,
}

impl RunConfig {
    /// Build a run config from app defaults plus the required per-run inputs.
    pub fn from_app_config(
        config: &AppConfig,
        api_url: impl Into<String>,
        admin_key: impl Into<String>,
        post_ids: Vec<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            admin_key: admin_key.into(),
            post_ids,
            content: config.defaults.content.clone(),
            delay_between_calls_ms: config.defaults.delay_between_calls_ms,
            concurrency: 1,
            page_size: config.defaults.page_size,
            rewrite_localhost: config.endpoint.rewrite_localhost,
        }
    }

    /// Validate the per-run inputs that must be present before any network
    /// call is made.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(PostnoteError::config("API URL is required"));
        }
        if self.admin_key.trim().is_empty() {
            return Err(PostnoteError::config("Admin API key is required"));
        }
        if self.post_ids.is_empty() {
            return Err(PostnoteError::config("at least one post id is required"));
        }
        if self.concurrency == 0 {
            return Err(PostnoteError::config("concurrency must be at least 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Endpoint normalization
// ---------------------------------------------------------------------------

/// Normalize the Admin API base URL.
///
/// Strips a trailing slash and, when `rewrite_localhost` is set, routes an
/// exact `localhost` host to its loopback numeric form. The rewrite never
/// applies to hosts that merely contain the substring.
pub fn normalize_api_url(raw: &str, rewrite_localhost: bool) -> Result<Url> {
    let trimmed = raw.trim_end_matches('/');

    let mut url = Url::parse(trimmed)
        .map_err(|e| PostnoteError::config(format!("invalid API URL '{raw}': {e}")))?;

    if rewrite_localhost && url.host_str() == Some("localhost") {
        url.set_host(Some("127.0.0.1"))
            .map_err(|e| PostnoteError::config(format!("invalid API URL '{raw}': {e}")))?;
    }

    Ok(url)
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.postnote/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PostnoteError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.postnote/postnote.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PostnoteError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PostnoteError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PostnoteError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PostnoteError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PostnoteError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
