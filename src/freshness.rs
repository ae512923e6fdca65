//! Freshness policy for cached entries.
//!
//! This is the sole policy point: the backends store observation timestamps
//! but never expire entries on their own, and the gateway consults nothing
//! else when deciding whether to serve a cached payload.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Default staleness threshold: entries older than this are refetched.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Whether an entry observed at `observed_at` is still servable at `now`.
///
/// Defined as `now - observed_at <= window`: an entry aged exactly the
/// window is still fresh. A non-positive age (clock skew between writer and
/// reader, or a reader with a lagging clock) counts as fresh — a timestamp
/// from the future is at worst brand new data.
pub fn is_fresh(observed_at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    let age = now.signed_duration_since(observed_at);
    match age.to_std() {
        Ok(age) => age <= window,
        // Negative age does not convert; treat as fresh.
        Err(_) => true,
    }
}
