//! The fetch coordinator: cache consultation, upstream fallback, best-effort
//! write-back, and per-key request coalescing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::backend::{CacheBackend, CacheEntry};
use crate::freshness::is_fresh;
use crate::upstream::WeatherUpstream;
use crate::{CacheKey, GeoQuery, Result, WeatherQuery, telemetry};

/// Caching gateway between page renderers and the weather provider.
///
/// A resolve follows one linear path: derive the key, consult the backend,
/// apply the freshness window, and on a miss fetch upstream once and hand
/// the payload back while the write-back completes on its own. The backend
/// is advisory throughout — it can fail on read (degraded to a miss) or on
/// write (dropped) without the caller ever seeing a backend error.
pub struct WeatherGateway {
    backend: Arc<dyn CacheBackend>,
    upstream: Arc<dyn WeatherUpstream>,
    window: Duration,
    flights: Mutex<HashMap<CacheKey, broadcast::Sender<Result<serde_json::Value>>>>,
}

impl std::fmt::Debug for WeatherGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherGateway")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

/// What a resolve that missed the cache does next: fetch for everyone, or
/// wait on the resolve already fetching this key.
enum Flight {
    Lead(broadcast::Sender<Result<serde_json::Value>>),
    Follow(broadcast::Receiver<Result<serde_json::Value>>),
}

/// Removes a led flight from the map even if the leading resolve is
/// cancelled mid-fetch; followers then observe a closed channel and fetch
/// for themselves.
struct FlightGuard<'a> {
    gateway: &'a WeatherGateway,
    key: CacheKey,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.gateway
            .flights
            .lock()
            .expect("flight map poisoned")
            .remove(&self.key);
    }
}

impl WeatherGateway {
    pub(crate) fn new(
        backend: Arc<dyn CacheBackend>,
        upstream: Arc<dyn WeatherUpstream>,
        window: Duration,
    ) -> Self {
        Self {
            backend,
            upstream,
            window,
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// The freshness window this gateway serves cached entries within.
    pub fn freshness_window(&self) -> Duration {
        self.window
    }

    /// Resolve current conditions for `query`.
    ///
    /// Served from the cache when a sufficiently fresh entry exists;
    /// otherwise fetched upstream exactly once and returned, with the cache
    /// updated off the response path. Upstream failures surface as errors —
    /// stale data is never served silently in their place.
    pub async fn weather(&self, query: &WeatherQuery) -> Result<serde_json::Value> {
        let key = query.cache_key()?;

        // Fast path: fresh entry, zero upstream traffic.
        if let Some(payload) = self.lookup(&key).await {
            return Ok(payload);
        }

        // Miss. Concurrent misses for the same key collapse onto whichever
        // resolve registered its flight first; the rest receive that
        // flight's outcome verbatim. Distinct keys proceed independently.
        match self.join_flight(&key) {
            Flight::Lead(tx) => {
                let guard = FlightGuard { gateway: self, key };
                let result = self.fetch_and_store(&guard.key, query).await;
                // Unregister before publishing so a resolve arriving after
                // this outcome starts a fresh flight instead of joining a
                // finished one.
                drop(guard);
                let _ = tx.send(result.clone());
                result
            }
            Flight::Follow(mut rx) => {
                metrics::counter!(telemetry::COALESCED_WAITS_TOTAL).increment(1);
                debug!(key = %key, "waiting on in-flight fetch");
                match rx.recv().await {
                    Ok(outcome) => outcome,
                    // Leading resolve was cancelled before it could publish;
                    // fetch on our own behalf.
                    Err(_) => self.fetch_and_store(&key, query).await,
                }
            }
        }
    }

    /// Resolve a postal code to coordinate data.
    ///
    /// Uncached passthrough; geocoding answers are effectively immutable and
    /// requested once per location, so they carry none of the freshness
    /// machinery.
    pub async fn geocode(&self, query: &GeoQuery) -> Result<serde_json::Value> {
        self.upstream.geocode(query).await
    }

    /// Register as the leading resolve for `key`, or subscribe to the one
    /// already in flight.
    fn join_flight(&self, key: &CacheKey) -> Flight {
        let mut flights = self.flights.lock().expect("flight map poisoned");
        match flights.get(key) {
            Some(tx) => Flight::Follow(tx.subscribe()),
            None => {
                let (tx, _) = broadcast::channel(1);
                flights.insert(key.clone(), tx.clone());
                Flight::Lead(tx)
            }
        }
    }

    /// Consult the backend and apply the freshness policy.
    ///
    /// Returns the payload only for a usable hit. Absent, stale, and backend
    /// failure all report `None`; a failure is logged and counted but never
    /// escapes — an unreachable cache reads as an empty one.
    async fn lookup(&self, key: &CacheKey) -> Option<serde_json::Value> {
        let backend = self.backend.name().to_string();
        match self.backend.get(key).await {
            Ok(Some(entry)) if is_fresh(entry.observed_at, Utc::now(), self.window) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "backend" => backend).increment(1);
                Some(entry.payload)
            }
            Ok(Some(_)) => {
                metrics::counter!(
                    telemetry::CACHE_MISSES_TOTAL,
                    "backend" => backend,
                    "reason" => "stale"
                )
                .increment(1);
                None
            }
            Ok(None) => {
                metrics::counter!(
                    telemetry::CACHE_MISSES_TOTAL,
                    "backend" => backend,
                    "reason" => "absent"
                )
                .increment(1);
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "backend get failed; treating as miss");
                metrics::counter!(
                    telemetry::BACKEND_ERRORS_TOTAL,
                    "backend" => backend.clone(),
                    "operation" => "get"
                )
                .increment(1);
                metrics::counter!(
                    telemetry::CACHE_MISSES_TOTAL,
                    "backend" => backend,
                    "reason" => "error"
                )
                .increment(1);
                None
            }
        }
    }

    /// Fetch upstream and write back best-effort.
    ///
    /// The write runs as a detached task: a slow or failing backend never
    /// delays the response, and a write failure after the payload is already
    /// on its way to the caller costs nothing but a future cache hit.
    async fn fetch_and_store(
        &self,
        key: &CacheKey,
        query: &WeatherQuery,
    ) -> Result<serde_json::Value> {
        let payload = self.upstream.fetch_current(query).await?;

        let entry = CacheEntry::observed_now(payload.clone());
        let backend = Arc::clone(&self.backend);
        let key = key.clone();
        tokio::spawn(async move {
            if let Err(e) = backend.put(&key, entry).await {
                warn!(key = %key, error = %e, "backend put failed; entry dropped");
                metrics::counter!(
                    telemetry::BACKEND_ERRORS_TOTAL,
                    "backend" => backend.name().to_string(),
                    "operation" => "put"
                )
                .increment(1);
            }
        });

        Ok(payload)
    }
}
