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
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn validate_cache_name(field: &str, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(invalid(field, "must not contain whitespace"));
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - either store name is empty, contains whitespace, or both names are equal
    /// - `scope` is not an absolute http(s) URL
    /// - `shell_assets` is empty or `manifest_suffix` does not start with `/`
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `warm_concurrency` is 0 or exceeds 64
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_cache_name("static_cache", &self.static_cache)?;
        validate_cache_name("dynamic_cache", &self.dynamic_cache)?;
        if self.static_cache == self.dynamic_cache {
            return Err(invalid("dynamic_cache", "must differ from static_cache"));
        }

        match url::Url::parse(&self.scope) {
            Ok(scope) if matches!(scope.scheme(), "http" | "https") && scope.has_host() => {}
            Ok(scope) => return Err(invalid("scope", format!("unsupported scheme: {}", scope.scheme()))),
            Err(e) => return Err(invalid("scope", e.to_string())),
        }

        if self.shell_assets.is_empty() {
            return Err(invalid("shell_assets", "must list at least the shell document"));
        }
        if self.shell_document.is_empty() {
            return Err(invalid("shell_document", "must not be empty"));
        }
        if !self.manifest_suffix.starts_with('/') {
            return Err(invalid("manifest_suffix", "must start with '/'"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.warm_concurrency == 0 || self.warm_concurrency > 64 {
            return Err(invalid("warm_concurrency", "must be between 1 and 64"));
        }

        if !self.shell_assets.iter().any(|a| a == &self.shell_document) {
            tracing::warn!(
                shell_document = %self.shell_document,
                "shell_document is not among shell_assets; offline fallback depends on the dynamic store"
            );
        }

        Ok(())
    }
}
