//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The generation identifier (`shell_store`) and the asset list are expected
//! to be stamped into the config file at deploy time.

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
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin of the application the router sits in front of.
    ///
    /// Set via SHELLCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Name of the versioned shell store. Rotate on every deployment.
    ///
    /// Set via SHELLCACHE_SHELL_STORE environment variable.
    #[serde(default = "default_shell_store")]
    pub shell_store: String,

    /// Name of the long-lived runtime store. Never rotated.
    ///
    /// Set via SHELLCACHE_RUNTIME_STORE environment variable.
    #[serde(default = "default_runtime_store")]
    pub runtime_store: String,

    /// URLs (absolute or root-relative) pre-populated at install.
    ///
    /// Set via SHELLCACHE_SHELL_ASSETS environment variable (`[/, /app.js]`).
    #[serde(default = "default_shell_assets")]
    pub shell_assets: Vec<String>,

    /// Document served for every navigation. Must be one of `shell_assets`.
    ///
    /// Set via SHELLCACHE_FALLBACK_DOCUMENT environment variable.
    #[serde(default = "default_fallback_document")]
    pub fallback_document: String,

    /// Cross-origin hosts treated as CDNs (network-first).
    ///
    /// Set via SHELLCACHE_CDN_HOSTS environment variable.
    #[serde(default = "default_cdn_hosts")]
    pub cdn_hosts: Vec<String>,

    /// Path to SQLite cache database.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SHELLCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via SHELLCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Optional HTTP timeout in milliseconds. Unset means no timeout.
    ///
    /// Set via SHELLCACHE_TIMEOUT_MS environment variable.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_shell_store() -> String {
    "app-shell-v1".into()
}

fn default_runtime_store() -> String {
    "app-runtime-v1".into()
}

fn default_shell_assets() -> Vec<String> {
    vec!["/".into(), "/index.html".into(), "/manifest.json".into()]
}

fn default_fallback_document() -> String {
    "/index.html".into()
}

fn default_cdn_hosts() -> Vec<String> {
    vec!["cdn.jsdelivr.net".into()]
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_max_bytes() -> usize {
    20_971_520 // 20MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            shell_store: default_shell_store(),
            runtime_store: default_runtime_store(),
            shell_assets: default_shell_assets(),
            fallback_document: default_fallback_document(),
            cdn_hosts: default_cdn_hosts(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: None,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
