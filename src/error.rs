//! Vedrfolnir error types

use std::time::Duration;

/// Vedrfolnir error types.
///
/// Backend variants are recovered inside the gateway (a failed `get` becomes
/// a cache miss, a failed `put` is dropped); upstream and encoding variants
/// surface to the caller. The enum is `Clone` so a single upstream outcome
/// can be handed to every coalesced waiter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VedrfolnirError {
    // Backend errors — never fatal to a resolve
    #[error("cache backend unavailable: {0}")]
    BackendUnavailable(String),

    // Upstream errors — fatal to the current resolve
    #[error("upstream unreachable: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream error ({status}): {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    // Data errors
    #[error("cache key encoding failed: {0}")]
    Encoding(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl VedrfolnirError {
    /// Whether this error originated in the cache backend.
    ///
    /// Backend errors must never escape the gateway's read or write path;
    /// the degradation tests assert against this predicate.
    pub fn is_backend(&self) -> bool {
        matches!(self, VedrfolnirError::BackendUnavailable(_))
    }
}

/// Result type alias for vedrfolnir operations
pub type Result<T> = std::result::Result<T, VedrfolnirError>;
