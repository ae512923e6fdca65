//! Telemetry metric name constants.
//!
//! Centralised metric names for vedrfolnir operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `vedrfolnir_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `backend` — cache backend name (e.g. "memory", "redis")
//! - `reason` — miss cause: "absent", "stale", or "error"
//! - `operation` — backend call: "get" or "put"
//! - `endpoint` — upstream call: "onecall" or "geocode"
//! - `status` — outcome: "ok" or "error"

/// Total resolves served from the cache without an upstream call.
///
/// Labels: `backend`.
pub const CACHE_HITS_TOTAL: &str = "vedrfolnir_cache_hits_total";

/// Total resolves that fell through to the upstream fetch.
///
/// Labels: `backend`, `reason` ("absent" | "stale" | "error").
pub const CACHE_MISSES_TOTAL: &str = "vedrfolnir_cache_misses_total";

/// Total backend operations that failed and were degraded or dropped.
///
/// Labels: `backend`, `operation` ("get" | "put").
pub const BACKEND_ERRORS_TOTAL: &str = "vedrfolnir_backend_errors_total";

/// Total requests sent to the upstream provider.
///
/// Labels: `endpoint`, `status` ("ok" | "error").
pub const UPSTREAM_REQUESTS_TOTAL: &str = "vedrfolnir_upstream_requests_total";

/// Upstream request duration in seconds.
///
/// Labels: `endpoint`.
pub const UPSTREAM_REQUEST_DURATION_SECONDS: &str = "vedrfolnir_upstream_request_duration_seconds";

/// Total resolves that waited on another in-flight fetch for the same key.
pub const COALESCED_WAITS_TOTAL: &str = "vedrfolnir_coalesced_waits_total";
