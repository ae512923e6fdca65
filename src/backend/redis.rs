//! Shared out-of-process cache backend over Redis.
//!
//! Values are stored as JSON `{"data": <payload>, "lastFetch": <epoch ms>}`
//! under a namespaced copy of the canonical cache key, so entries written by
//! one server instance resolve for every other instance pointing at the same
//! store — and stay readable from `redis-cli`.
//!
//! Every command is wrapped in a bounded timeout. A hung or unreachable
//! store must never stall the fallback-to-upstream path, so timeouts are
//! reported the same way as any other backend failure and the gateway
//! degrades them to a miss.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tokio::time::timeout;
use tracing::debug;

use super::{CacheBackend, CacheEntry};
use crate::{CacheKey, Result, VedrfolnirError};

/// Default per-command timeout.
const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_millis(2_000);

/// Default key namespace.
const DEFAULT_KEY_PREFIX: &str = "weather:";

/// Connection and behaviour settings for [`RedisBackend`].
#[derive(Debug, Clone)]
pub struct RedisBackendConfig {
    /// Connection URL. Use `rediss://` for TLS; credentials go in the URL
    /// (`rediss://:password@host:port`).
    pub url: String,
    /// Bound applied to every command, the initial connect included.
    pub operation_timeout: Duration,
    /// Prefix prepended to every cache key.
    pub key_prefix: String,
    /// Optional store-side expiry applied on write.
    ///
    /// Purely a garbage-collection floor for abandoned keys; freshness is
    /// decided by the gateway and never delegated to this TTL.
    pub storage_ttl: Option<Duration>,
}

impl RedisBackendConfig {
    /// Settings for the given URL with default timeout and prefix.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            storage_ttl: None,
        }
    }

    /// Set the per-command timeout.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Set the key namespace prefix.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set a store-side expiry floor.
    pub fn storage_ttl(mut self, ttl: Duration) -> Self {
        self.storage_ttl = Some(ttl);
        self
    }
}

/// Wire format of a stored entry.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    data: serde_json::Value,
    #[serde(rename = "lastFetch")]
    last_fetch: i64,
}

impl From<CacheEntry> for StoredEntry {
    fn from(entry: CacheEntry) -> Self {
        Self {
            data: entry.payload,
            last_fetch: entry.observed_at.timestamp_millis(),
        }
    }
}

impl TryFrom<StoredEntry> for CacheEntry {
    type Error = VedrfolnirError;

    fn try_from(stored: StoredEntry) -> Result<Self> {
        let observed_at = DateTime::<Utc>::from_timestamp_millis(stored.last_fetch)
            .ok_or_else(|| {
                VedrfolnirError::BackendUnavailable(format!(
                    "stored timestamp out of range: {}",
                    stored.last_fetch
                ))
            })?;
        Ok(CacheEntry {
            payload: stored.data,
            observed_at,
        })
    }
}

/// Network-attached backend shared across server instances.
///
/// The connection is established lazily on first use and re-established
/// automatically after drops; a failed connect leaves the cell empty so the
/// next operation retries.
pub struct RedisBackend {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
    config: RedisBackendConfig,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend").finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// Create a backend for the given URL with default settings.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_config(RedisBackendConfig::new(url))
    }

    /// Create a backend from explicit settings.
    ///
    /// Fails only on an unparseable URL; no connection is attempted here.
    pub fn with_config(config: RedisBackendConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            VedrfolnirError::Configuration(format!("invalid redis url: {e}"))
        })?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
            config,
        })
    }

    fn storage_key(&self, key: &CacheKey) -> String {
        format!("{}{}", self.config.key_prefix, key.as_str())
    }

    /// Shared auto-reconnecting connection, created on first use.
    async fn manager(&self) -> Result<ConnectionManager> {
        let manager = self
            .conn
            .get_or_try_init(|| async {
                let connect = ConnectionManager::new(self.client.clone());
                match timeout(self.config.operation_timeout, connect).await {
                    Ok(Ok(manager)) => {
                        debug!("redis backend connected");
                        Ok(manager)
                    }
                    Ok(Err(e)) => Err(VedrfolnirError::BackendUnavailable(format!(
                        "redis connect: {e}"
                    ))),
                    Err(_) => Err(VedrfolnirError::BackendUnavailable(format!(
                        "redis connect timed out after {:?}",
                        self.config.operation_timeout
                    ))),
                }
            })
            .await?;
        Ok(manager.clone())
    }

    /// Run a command under the per-command timeout, folding every failure
    /// mode into `BackendUnavailable`.
    async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match timeout(self.config.operation_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(VedrfolnirError::BackendUnavailable(format!(
                "redis {op}: {e}"
            ))),
            Err(_) => Err(VedrfolnirError::BackendUnavailable(format!(
                "redis {op} timed out after {:?}",
                self.config.operation_timeout
            ))),
        }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let mut conn = self.manager().await?;
        let storage_key = self.storage_key(key);

        let raw: Option<String> = self.run("get", conn.get(&storage_key)).await?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        let stored: StoredEntry = serde_json::from_str(&raw).map_err(|e| {
            VedrfolnirError::BackendUnavailable(format!("undecodable entry for {storage_key}: {e}"))
        })?;
        Ok(Some(stored.try_into()?))
    }

    async fn put(&self, key: &CacheKey, entry: CacheEntry) -> Result<()> {
        let mut conn = self.manager().await?;
        let storage_key = self.storage_key(key);

        let raw = serde_json::to_string(&StoredEntry::from(entry)).map_err(|e| {
            VedrfolnirError::BackendUnavailable(format!("unencodable entry: {e}"))
        })?;

        match self.config.storage_ttl {
            Some(ttl) => {
                self.run("set", conn.set_ex::<_, _, ()>(&storage_key, raw, ttl.as_secs()))
                    .await
            }
            None => self.run("set", conn.set::<_, _, ()>(&storage_key, raw)).await,
        }
    }
}
