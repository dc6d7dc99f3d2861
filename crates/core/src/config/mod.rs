//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (ROSTERCACHE_*)
//! 2. TOML config file (if ROSTERCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (ROSTERCACHE_*)
/// 2. TOML config file (if ROSTERCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via ROSTERCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Base URL of the gallery. Its origin defines "same origin" and
    /// relative asset names resolve against it.
    ///
    /// Set via ROSTERCACHE_SCOPE environment variable.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Name of the store populated at install time.
    #[serde(default = "default_static_cache")]
    pub static_cache: String,

    /// Name of the store populated while serving and warming.
    #[serde(default = "default_dynamic_cache")]
    pub dynamic_cache: String,

    /// Shell assets fetched at install, relative to `scope`.
    #[serde(default = "default_shell_assets")]
    pub shell_assets: Vec<String>,

    /// Document served when nothing better is available.
    #[serde(default = "default_shell_document")]
    pub shell_document: String,

    /// Path suffix identifying catalog manifest requests.
    #[serde(default = "default_manifest_suffix")]
    pub manifest_suffix: String,

    /// Shell part of the warm working set, relative to `scope`.
    #[serde(default = "default_warm_assets")]
    pub warm_assets: Vec<String>,

    /// Hosts whose requests are always treated as images.
    #[serde(default = "default_image_hosts")]
    pub image_hosts: Vec<String>,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via ROSTERCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Parallel add-to-cache operations in one warm batch.
    #[serde(default = "default_warm_concurrency")]
    pub warm_concurrency: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./rostercache.sqlite")
}

fn default_scope() -> String {
    "http://127.0.0.1:8080/".into()
}

fn default_static_cache() -> String {
    "app-static-v1".into()
}

fn default_dynamic_cache() -> String {
    "app-dynamic-v1".into()
}

fn default_shell_assets() -> Vec<String> {
    ["./", "index.html", "styles.css", "script.js", "manifest.webmanifest"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_shell_document() -> String {
    "index.html".into()
}

fn default_manifest_suffix() -> String {
    "/rooster.json".into()
}

fn default_warm_assets() -> Vec<String> {
    ["index.html", "styles.css", "script.js", "rooster.json"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_image_hosts() -> Vec<String> {
    vec!["images.start.gg".into()]
}

fn default_user_agent() -> String {
    "rostercache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_warm_concurrency() -> usize {
    8
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            scope: default_scope(),
            static_cache: default_static_cache(),
            dynamic_cache: default_dynamic_cache(),
            shell_assets: default_shell_assets(),
            shell_document: default_shell_document(),
            manifest_suffix: default_manifest_suffix(),
            warm_assets: default_warm_assets(),
            image_hosts: default_image_hosts(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            warm_concurrency: default_warm_concurrency(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The store names an activating agent keeps; everything else is purged.
    pub fn known_caches(&self) -> [&str; 2] {
        [self.static_cache.as_str(), self.dynamic_cache.as_str()]
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `ROSTERCACHE_`
    /// 2. TOML file from `ROSTERCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("ROSTERCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("ROSTERCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
