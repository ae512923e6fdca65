//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. explicit path (caller-provided)
//! 2. `~/.vedrfolnir/config.toml` (user)
//! 3. `/etc/vedrfolnir/config.toml` (system)
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.vedrfolnir/secrets.toml` (user, must be 0600)
//! 2. `/etc/vedrfolnir/secrets.toml` (system, must be 0600)
//!
//! Environment variables fill in for a missing secrets file:
//! `WEATHER_API_KEY` for the upstream credential (the variable the original
//! deployment used) and `VEDRFOLNIR_REDIS_URL` for the shared backend.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Result, VedrfolnirError};

/// Gateway configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Upstream provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL override; defaults to the provider's production host.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request timeout in seconds (default: 10).
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_upstream_timeout(),
        }
    }
}

fn default_upstream_timeout() -> u64 {
    10
}

/// Which storage backend to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-local map; lost on restart.
    #[default]
    Memory,
    /// Shared out-of-process store.
    Redis,
}

/// Cache behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Backend selection (default: memory).
    #[serde(default)]
    pub backend: BackendKind,
    /// Staleness threshold in seconds (default: 600).
    #[serde(default = "default_freshness_window")]
    pub freshness_window_secs: u64,
    /// Capacity bound for the in-memory backend (default: 1024).
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// Redis settings; required when `backend = "redis"`.
    #[serde(default)]
    pub redis: Option<RedisSettings>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            freshness_window_secs: default_freshness_window(),
            max_entries: default_max_entries(),
            redis: None,
        }
    }
}

fn default_freshness_window() -> u64 {
    600
}

fn default_max_entries() -> u64 {
    1_024
}

/// Redis backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Connection URL; omit to take it from secrets or the environment.
    #[serde(default)]
    pub url: Option<String>,
    /// Per-command timeout in milliseconds (default: 2000).
    #[serde(default = "default_redis_timeout_ms")]
    pub operation_timeout_ms: u64,
    /// Key namespace prefix (default: "weather:").
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: None,
            operation_timeout_ms: default_redis_timeout_ms(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_redis_timeout_ms() -> u64 {
    2_000
}

fn default_key_prefix() -> String {
    "weather:".to_string()
}

impl Config {
    /// Load configuration from the standard locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        let content = fs::read_to_string(&path).map_err(|e| {
            VedrfolnirError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            VedrfolnirError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(VedrfolnirError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".vedrfolnir").join("config.toml");
            if user_config.exists() {
                return Ok(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/vedrfolnir/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }

        Err(VedrfolnirError::Configuration(
            "No config file found. Create ~/.vedrfolnir/config.toml or /etc/vedrfolnir/config.toml"
                .to_string(),
        ))
    }
}

/// Secrets configuration (credentials).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub openweather: Option<ApiKeySecret>,
    #[serde(default)]
    pub redis: Option<RedisSecret>,
}

/// The upstream API credential.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

/// The shared backend credential-bearing URL.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSecret {
    pub url: String,
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Returns empty secrets if no file exists (credentials may come from
    /// environment variables instead).
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".vedrfolnir").join("secrets.toml");
            if user_secrets.exists() {
                Self::check_permissions(&user_secrets)?;
                return Self::load_from_file(&user_secrets);
            }
        }

        let system_secrets = PathBuf::from("/etc/vedrfolnir/secrets.toml");
        if system_secrets.exists() {
            Self::check_permissions(&system_secrets)?;
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            VedrfolnirError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            VedrfolnirError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            VedrfolnirError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(VedrfolnirError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// The upstream API key, falling back to `WEATHER_API_KEY`.
    pub fn weather_api_key(&self) -> Option<String> {
        self.openweather
            .as_ref()
            .map(|s| s.api_key.clone())
            .or_else(|| std::env::var("WEATHER_API_KEY").ok())
    }

    /// The Redis URL, falling back to `VEDRFOLNIR_REDIS_URL`.
    pub fn redis_url(&self) -> Option<String> {
        self.redis
            .as_ref()
            .map(|s| s.url.clone())
            .or_else(|| std::env::var("VEDRFOLNIR_REDIS_URL").ok())
    }
}
