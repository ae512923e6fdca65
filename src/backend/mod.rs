//! Cache storage backends.
//!
//! Two interchangeable backends sit behind one trait:
//!
//! - [`MemoryBackend`] — a bounded in-process map. Nothing survives a
//!   restart and nothing is shared across instances, but operations cannot
//!   meaningfully fail.
//!
//! - [`RedisBackend`] — a shared network-attached store (feature
//!   `redis-backend`). Entries survive restarts and are visible to every
//!   server instance pointing at the same store, at the price of real
//!   failure modes: connection loss, timeouts, auth rejection, bad payloads.
//!
//! The backend is picked once, at construction, and injected into the
//! gateway. Callers of the trait must treat it as advisory storage: a
//! backend that errors on `get` is a cache miss, a backend that errors on
//! `put` loses nothing but a future hit. Entries are replaced wholesale;
//! freshness is decided by the gateway, not by store-side expiry.

mod memory;
#[cfg(feature = "redis-backend")]
mod redis;

pub use memory::MemoryBackend;
#[cfg(feature = "redis-backend")]
pub use redis::{RedisBackend, RedisBackendConfig};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{CacheKey, Result};

/// A cached upstream payload plus the moment it was fetched.
///
/// `observed_at` records when the payload left the upstream provider, not
/// when it was stored or read; the freshness policy compares against it.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Opaque upstream response body.
    pub payload: serde_json::Value,
    /// When the payload was fetched from upstream.
    pub observed_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry observed now.
    pub fn observed_now(payload: serde_json::Value) -> Self {
        Self {
            payload,
            observed_at: Utc::now(),
        }
    }
}

/// Storage abstraction over `{get, put}`.
///
/// Implementations must be safe under concurrent gets and puts for the same
/// key: readers observe either the old or the new entry, never a torn one.
/// A missing key is `Ok(None)` — an expected outcome, not an error.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Backend name used in logs and metric labels.
    fn name(&self) -> &str;

    /// Look up the entry for `key`.
    ///
    /// Returns `Ok(None)` when no entry exists. An `Err` means the backend
    /// itself is unavailable; the gateway degrades that to a miss.
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;

    /// Store `entry` under `key`, replacing any previous entry wholesale.
    ///
    /// Last write wins. Failures are tolerated by the caller — failing to
    /// cache a fresh value is not a request failure.
    async fn put(&self, key: &CacheKey, entry: CacheEntry) -> Result<()>;
}
