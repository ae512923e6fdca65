//! In-process cache backend.

use async_trait::async_trait;
use moka::future::Cache;

use super::{CacheBackend, CacheEntry};
use crate::{CacheKey, Result};

/// Default maximum number of entries held in memory.
const DEFAULT_MAX_ENTRIES: u64 = 1_024;

/// Process-local backend over a bounded concurrent map.
///
/// The capacity bound exists only to keep long-running processes from
/// growing without limit; it is not an expiry mechanism. No TTL is set on
/// the map — staleness is the gateway's decision, and a stale entry stays
/// put until a fresh fetch supersedes it.
pub struct MemoryBackend {
    entries: Cache<String, CacheEntry>,
}

impl MemoryBackend {
    /// Create a backend with the default capacity (1,024 entries).
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// Create a backend with a custom capacity.
    pub fn with_max_entries(max: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(max).build(),
        }
    }

    /// Number of entries currently held.
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Whether the backend holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        Ok(self.entries.get(key.as_str()).await)
    }

    async fn put(&self, key: &CacheKey, entry: CacheEntry) -> Result<()> {
        self.entries.insert(key.as_str().to_owned(), entry).await;
        Ok(())
    }
}
