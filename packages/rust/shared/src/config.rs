//! Application configuration for ReleaseWatch.
//!
//! User config lives at `~/.releasewatch/releasewatch.toml`.
//! CLI flags override environment variables, which override config file
//! values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReleaseWatchError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "releasewatch.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".releasewatch";

// ---------------------------------------------------------------------------
// Config structs (matching releasewatch.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Storage location.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Outbound HTTP settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Active sources and discovery filters.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Query API settings.
    #[serde(default)]
    pub api: ApiConfig,
}

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local file path (`~` allowed) or a `libsql://` / `https://` URL.
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Name of the env var holding the remote auth token (never store the token itself).
    #[serde(default = "default_auth_token_env")]
    pub auth_token_env: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            auth_token_env: default_auth_token_env(),
        }
    }
}

impl DatabaseConfig {
    /// Whether `url` points at a remote libSQL server rather than a local file.
    pub fn is_remote(&self) -> bool {
        ["libsql://", "https://", "http://", "wss://", "ws://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
    }

    /// Read the remote auth token from the configured env var (empty if unset).
    pub fn auth_token(&self) -> String {
        std::env::var(&self.auth_token_env).unwrap_or_default()
    }
}

fn default_database_url() -> String {
    "~/.releasewatch/releasewatch.db".into()
}
fn default_auth_token_env() -> String {
    "RELEASEWATCH_DB_TOKEN".into()
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout. Vendor documentation sites can be slow.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

/// `[sources]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Registry keys of the sources run by `releasewatch run`, in order.
    #[serde(default = "default_enabled_sources")]
    pub enabled: Vec<String>,

    /// Feed links containing any of these substrings are not crawled.
    #[serde(default = "default_ignored_feed_urls")]
    pub ignored_feed_urls: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_sources(),
            ignored_feed_urls: default_ignored_feed_urls(),
        }
    }
}

fn default_enabled_sources() -> Vec<String> {
    vec!["veracode-rss".into(), "sd-elements".into()]
}
fn default_ignored_feed_urls() -> Vec<String> {
    vec!["c_release_notes".into()]
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Socket address the query API listens on.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Page size used when `limit` is missing or invalid.
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            default_limit: default_limit(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".into()
}
fn default_limit() -> u32 {
    20
}

// ---------------------------------------------------------------------------
// Fetch config (runtime, derived from the app config)
// ---------------------------------------------------------------------------

/// Runtime fetch configuration handed to the source extractors.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Feed-link substrings to skip during discovery.
    pub ignored_feed_urls: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.http.timeout_secs,
            ignored_feed_urls: config.sources.ignored_feed_urls.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.releasewatch/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ReleaseWatchError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.releasewatch/releasewatch.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| ReleaseWatchError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ReleaseWatchError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ReleaseWatchError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ReleaseWatchError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ReleaseWatchError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| ReleaseWatchError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}
