//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - a store name is empty, or both store names are equal
    /// - `fallback_document` is not listed in `shell_assets`
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is set below 100ms or above 5 minutes
    /// - `user_agent` is empty
    ///
    /// Returns `ConfigError::Missing` if `shell_assets` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") && origin.host_str().is_some() => {}
            Ok(origin) => return Err(invalid("origin", format!("unsupported origin: {origin}"))),
            Err(e) => return Err(invalid("origin", e.to_string())),
        }

        if self.shell_store.trim().is_empty() {
            return Err(invalid("shell_store", "must not be empty"));
        }
        if self.runtime_store.trim().is_empty() {
            return Err(invalid("runtime_store", "must not be empty"));
        }
        if self.shell_store == self.runtime_store {
            return Err(invalid("runtime_store", "must differ from shell_store"));
        }

        if self.shell_assets.is_empty() {
            return Err(ConfigError::Missing {
                field: "shell_assets".into(),
                hint: "list at least the fallback document".into(),
            });
        }
        if !self.shell_assets.iter().any(|asset| asset == &self.fallback_document) {
            return Err(invalid("fallback_document", "must be one of shell_assets"));
        }

        if self.cdn_hosts.iter().any(|host| host.trim().is_empty()) {
            return Err(invalid("cdn_hosts", "must not contain empty host names"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if let Some(timeout_ms) = self.timeout_ms {
            if timeout_ms < 100 {
                return Err(invalid("timeout_ms", "must be at least 100ms"));
            }
            if timeout_ms > 300_000 {
                return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
            }
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.cdn_hosts.is_empty() {
            tracing::warn!("no cdn_hosts configured; cross-origin assets will use cache-first");
        }

        Ok(())
    }
}
