//! Session configuration
//!
//! One external base address for the image service plus the timeouts
//! applied at the remote-call boundary. Sources, lowest precedence first:
//! defaults, a TOML file, `PIXLAB_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Overrides [`EditorConfig::backend_url`]
pub const ENV_BACKEND_URL: &str = "PIXLAB_BACKEND_URL";
/// Overrides [`EditorConfig::request_timeout_secs`]
pub const ENV_REQUEST_TIMEOUT: &str = "PIXLAB_REQUEST_TIMEOUT_SECS";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value failed validation
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// HTTP client could not be built from this configuration
    #[error("cannot build HTTP client: {0}")]
    Client(#[from] pixlab_remote::RemoteError),
}

/// Editor session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Base address of the image service
    pub backend_url: String,
    /// Whole-request timeout
    pub request_timeout_secs: u64,
    /// Connection establishment timeout
    pub connect_timeout_secs: u64,
}

impl EditorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With backend base address
    #[inline]
    #[must_use]
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    /// With request timeout in seconds
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// With connect timeout in seconds
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[inline]
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Parse and validate a TOML document; missing keys keep their defaults
    ///
    /// # Errors
    /// `Parse` for malformed TOML or unknown keys, `Invalid` from [`Self::validate`]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// `Io` if the file cannot be read, otherwise as [`Self::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Overlay `PIXLAB_*` variables from the process environment
    ///
    /// # Errors
    /// `Invalid` for a non-numeric timeout or a result failing validation
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay variables from an arbitrary lookup
    ///
    /// # Errors
    /// As [`Self::apply_env`]
    pub fn apply_env_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
            self.backend_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
            self.request_timeout_secs = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                field: "request_timeout_secs",
                reason: format!("`{raw}` from {ENV_REQUEST_TIMEOUT} is not a number"),
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check every field
    ///
    /// # Errors
    /// `Invalid` for an empty or non-http(s) base URL, or a zero timeout
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.backend_url.trim();
        if url.is_empty() {
            return Err(ConfigError::Invalid {
                field: "backend_url",
                reason: "must not be empty".into(),
            });
        }
        let has_host = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"))
            .is_some_and(|rest| !rest.is_empty());
        if !has_host {
            return Err(ConfigError::Invalid {
                field: "backend_url",
                reason: format!("`{url}` is not an http(s) address"),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "connect_timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".into(),
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
        }
    }
}
