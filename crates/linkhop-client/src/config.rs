//! Client configuration.
//!
//! Configuration can be loaded from:
//! - A TOML file named by `LINKHOP_CONFIG` (an `[api]` table)
//! - Environment variables (`LINKHOP_*` prefixed)
//!
//! # Example
//!
//! ```rust,no_run
//! use linkhop_client::config::ClientConfig;
//!
//! // File named by LINKHOP_CONFIG, or environment variables
//! let config = ClientConfig::load().expect("Failed to load config");
//!
//! // Or explicitly from a file
//! let config = ClientConfig::from_file(std::path::Path::new("linkhop.toml")).expect("Failed to load");
//! ```

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use linkhop_core::defaults;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings injected once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API base URL; request paths are resolved against it.
    pub base_url: String,
    /// Cookie carrying the CSRF token.
    pub csrf_cookie_name: String,
    /// Header the CSRF token is echoed in.
    pub csrf_header_name: String,
    /// Path that sets a fresh CSRF cookie.
    pub csrf_cookie_path: String,
    /// Initial UI locale, sent as `Accept-Language`.
    pub locale: String,
    /// Request timeout. `None` leaves the HTTP client's default in place.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::API_URL.to_string(),
            csrf_cookie_name: defaults::CSRF_COOKIE.to_string(),
            csrf_header_name: defaults::CSRF_HEADER.to_string(),
            csrf_cookie_path: defaults::CSRF_COOKIE_PATH.to_string(),
            locale: defaults::LOCALE.to_string(),
            timeout_secs: None,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    /// Config for `base_url` with every other setting at its default.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load from the file named by `LINKHOP_CONFIG`, falling back to environment variables.
    pub fn load() -> ConfigResult<Self> {
        match env::var("LINKHOP_CONFIG") {
            Ok(path) if !path.is_empty() => {
                let path = PathBuf::from(path);
                info!("Loading client config from: {}", path.display());
                Self::from_file(&path)
            }
            _ => {
                debug!("LINKHOP_CONFIG not set, using environment variables");
                Self::from_env()
            }
        }
    }

    /// Load configuration from a TOML file with an `[api]` table.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        #[derive(Deserialize)]
        struct TomlRoot {
            #[serde(default)]
            api: ClientConfig,
        }

        let root: TomlRoot = toml::from_str(content)?;
        root.api.validate()?;
        Ok(root.api)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment-variable names).
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let timeout_secs = match lookup("LINKHOP_TIMEOUT_SECS") {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "LINKHOP_TIMEOUT_SECS",
                value: raw.clone(),
            })?),
            None => None,
        };

        let config = Self {
            base_url: lookup("LINKHOP_API_URL").unwrap_or(defaults.base_url),
            csrf_cookie_name: lookup("LINKHOP_CSRF_COOKIE").unwrap_or(defaults.csrf_cookie_name),
            csrf_header_name: lookup("LINKHOP_CSRF_HEADER").unwrap_or(defaults.csrf_header_name),
            csrf_cookie_path: lookup("LINKHOP_CSRF_PATH").unwrap_or(defaults.csrf_cookie_path),
            locale: lookup("LINKHOP_LOCALE").unwrap_or(defaults.locale),
            timeout_secs,
            user_agent: lookup("LINKHOP_USER_AGENT"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.base_url.is_empty() {
            return Err(ConfigError::Validation(
                "base_url cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        if self.csrf_cookie_name.is_empty() || self.csrf_header_name.is_empty() {
            return Err(ConfigError::Validation(
                "CSRF cookie and header names cannot be empty".to_string(),
            ));
        }

        if !self.csrf_cookie_path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "csrf_cookie_path must start with '/', got: {}",
                self.csrf_cookie_path
            )));
        }

        if self.locale.is_empty() {
            return Err(ConfigError::Validation("locale cannot be empty".to_string()));
        }

        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
