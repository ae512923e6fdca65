//! Vedrfolnir - Time-bound caching gateway for weather data APIs
//!
//! Weather providers meter and rate-limit their APIs, while the pages that
//! render their data are happy with anything observed in the last few
//! minutes. This crate sits between the two: a gateway that serves cached
//! payloads while they are fresh, fetches upstream exactly once when they
//! are not, and treats its own storage as advisory — an unreachable cache
//! degrades to a fetch, never to a user-visible error.
//!
//! Storage comes in two interchangeable variants behind one trait: a
//! process-local map, and a shared Redis store that multiple server
//! instances can sit in front of. Both are selected once, at construction.
//!
//! # Example
//!
//! ```rust,no_run
//! use vedrfolnir::{Units, Vedrfolnir, WeatherQuery};
//!
//! #[tokio::main]
//! async fn main() -> vedrfolnir::Result<()> {
//!     let gateway = Vedrfolnir::builder()
//!         .api_key("your-openweather-key")
//!         .redis("rediss://:secret@cache.example.net:6380")
//!         .build()?;
//!
//!     let query = WeatherQuery::new(45.3211, -75.7391).units(Units::Metric);
//!     let conditions = gateway.weather(&query).await?;
//!
//!     println!("{}", conditions["current"]);
//!     Ok(())
//! }
//! ```
//!
//! # Freshness
//!
//! An entry is served while `now - observed_at <= window` (10 minutes by
//! default, configurable). Expiry is lazy: nothing scans for stale entries,
//! they are simply refetched on the next read and superseded in place.

pub mod backend;
pub mod config;
pub mod error;
pub mod freshness;
pub mod gateway;
pub mod key;
pub mod telemetry;
pub mod types;
pub mod upstream;

// Re-export main types at crate root
pub use backend::{CacheBackend, CacheEntry, MemoryBackend};
pub use error::{Result, VedrfolnirError};
pub use gateway::{Vedrfolnir, VedrfolnirBuilder, WeatherGateway};
pub use key::CacheKey;
pub use types::{GeoQuery, Units, WeatherQuery};
pub use upstream::{OpenWeatherClient, WeatherUpstream};

#[cfg(feature = "redis-backend")]
pub use backend::{RedisBackend, RedisBackendConfig};
