//! Builder for configuring gateway instances.

use std::sync::Arc;
use std::time::Duration;

use super::WeatherGateway;
use crate::backend::{CacheBackend, MemoryBackend};
use crate::config::{BackendKind, Config, Secrets};
use crate::freshness::DEFAULT_FRESHNESS_WINDOW;
use crate::upstream::{OpenWeatherClient, WeatherUpstream};
use crate::{Result, VedrfolnirError};

/// Main entry point for creating gateway instances.
pub struct Vedrfolnir;

impl Vedrfolnir {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> VedrfolnirBuilder {
        VedrfolnirBuilder::new()
    }
}

/// Which storage backend the gateway will be built with.
enum BackendChoice {
    Memory { max_entries: Option<u64> },
    #[cfg(feature = "redis-backend")]
    Redis(crate::backend::RedisBackendConfig),
    Custom(Arc<dyn CacheBackend>),
}

/// Builder for configuring gateway instances.
///
/// The storage backend is selected exactly once here; the coordinator never
/// branches on backend kind again.
pub struct VedrfolnirBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    upstream_timeout: Option<Duration>,
    upstream: Option<Arc<dyn WeatherUpstream>>,
    backend: BackendChoice,
    window: Duration,
}

impl std::fmt::Debug for VedrfolnirBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VedrfolnirBuilder")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl VedrfolnirBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            upstream_timeout: None,
            upstream: None,
            backend: BackendChoice::Memory { max_entries: None },
            window: DEFAULT_FRESHNESS_WINDOW,
        }
    }

    /// Set the upstream API credential.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the upstream base URL (for testing with wiremock).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the upstream request timeout (default: 10 seconds).
    pub fn upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = Some(timeout);
        self
    }

    /// Inject a custom upstream implementation.
    ///
    /// Takes precedence over `api_key`/`base_url`; used by tests to script
    /// upstream behaviour.
    pub fn upstream(mut self, upstream: impl WeatherUpstream + 'static) -> Self {
        self.upstream = Some(Arc::new(upstream));
        self
    }

    /// Use the in-process backend with a custom capacity.
    ///
    /// This is the default backend; call this only to change the bound.
    pub fn memory(mut self, max_entries: u64) -> Self {
        self.backend = BackendChoice::Memory {
            max_entries: Some(max_entries),
        };
        self
    }

    /// Use the shared Redis backend at the given URL.
    #[cfg(feature = "redis-backend")]
    pub fn redis(mut self, url: impl Into<String>) -> Self {
        self.backend = BackendChoice::Redis(crate::backend::RedisBackendConfig::new(url));
        self
    }

    /// Use the shared Redis backend with explicit settings.
    #[cfg(feature = "redis-backend")]
    pub fn redis_config(mut self, config: crate::backend::RedisBackendConfig) -> Self {
        self.backend = BackendChoice::Redis(config);
        self
    }

    /// Inject a custom backend implementation.
    pub fn backend(mut self, backend: impl CacheBackend + 'static) -> Self {
        self.backend = BackendChoice::Custom(Arc::new(backend));
        self
    }

    /// Override the default 10-minute staleness threshold.
    pub fn freshness_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Populate the builder from loaded configuration and secrets.
    ///
    /// This is where backend selection happens: `cache.backend` picks the
    /// variant once, and the coordinator never branches on it again.
    pub fn from_config(mut self, config: &Config, secrets: &Secrets) -> Result<Self> {
        if let Some(ref base_url) = config.upstream.base_url {
            self.base_url = Some(base_url.clone());
        }
        self.upstream_timeout = Some(Duration::from_secs(config.upstream.timeout_secs));
        self.window = Duration::from_secs(config.cache.freshness_window_secs);
        if let Some(api_key) = secrets.weather_api_key() {
            self.api_key = Some(api_key);
        }

        self.backend = match config.cache.backend {
            BackendKind::Memory => BackendChoice::Memory {
                max_entries: Some(config.cache.max_entries),
            },
            #[cfg(feature = "redis-backend")]
            BackendKind::Redis => {
                let settings = config.cache.redis.clone().unwrap_or_default();
                let url = settings
                    .url
                    .or_else(|| secrets.redis_url())
                    .ok_or_else(|| {
                        VedrfolnirError::Configuration(
                            "cache.backend = \"redis\" but no redis url configured".to_string(),
                        )
                    })?;
                BackendChoice::Redis(
                    crate::backend::RedisBackendConfig::new(url)
                        .operation_timeout(Duration::from_millis(settings.operation_timeout_ms))
                        .key_prefix(settings.key_prefix),
                )
            }
            #[cfg(not(feature = "redis-backend"))]
            BackendKind::Redis => {
                return Err(VedrfolnirError::Configuration(
                    "cache.backend = \"redis\" but built without the redis-backend feature"
                        .to_string(),
                ));
            }
        };
        Ok(self)
    }

    /// Build the gateway.
    pub fn build(self) -> Result<WeatherGateway> {
        let upstream: Arc<dyn WeatherUpstream> = match self.upstream {
            Some(upstream) => upstream,
            None => {
                let api_key = self.api_key.ok_or_else(|| {
                    VedrfolnirError::Configuration(
                        "no upstream API key configured".to_string(),
                    )
                })?;
                let base_url = self
                    .base_url
                    .unwrap_or_else(|| OpenWeatherClient::DEFAULT_BASE_URL.to_string());
                let timeout = self
                    .upstream_timeout
                    .unwrap_or(OpenWeatherClient::DEFAULT_TIMEOUT);
                Arc::new(OpenWeatherClient::with_timeout(api_key, base_url, timeout))
            }
        };

        let backend: Arc<dyn CacheBackend> = match self.backend {
            BackendChoice::Memory { max_entries: None } => Arc::new(MemoryBackend::new()),
            BackendChoice::Memory {
                max_entries: Some(max),
            } => Arc::new(MemoryBackend::with_max_entries(max)),
            #[cfg(feature = "redis-backend")]
            BackendChoice::Redis(config) => {
                Arc::new(crate::backend::RedisBackend::with_config(config)?)
            }
            BackendChoice::Custom(backend) => backend,
        };

        Ok(WeatherGateway::new(backend, upstream, self.window))
    }
}

impl Default for VedrfolnirBuilder {
    fn default() -> Self {
        Self::new()
    }
}
