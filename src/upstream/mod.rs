//! Upstream weather provider boundary.
//!
//! The gateway treats the provider as a black box: two endpoints, JSON in
//! and out, no schema knowledge beyond handing structured data back to the
//! caller. [`OpenWeatherClient`] is the production implementation; tests
//! inject scripted implementations of [`WeatherUpstream`].

mod openweather;

pub use openweather::OpenWeatherClient;

use async_trait::async_trait;

use crate::{GeoQuery, Result, WeatherQuery};

/// The upstream provider contract.
#[async_trait]
pub trait WeatherUpstream: Send + Sync {
    /// Fetch current conditions + forecast for the given coordinates.
    ///
    /// The payload passes through opaquely; a non-success response or an
    /// unparseable body is an error, never a partial value.
    async fn fetch_current(&self, query: &WeatherQuery) -> Result<serde_json::Value>;

    /// Resolve a postal code to coordinate data.
    async fn geocode(&self, query: &GeoQuery) -> Result<serde_json::Value>;
}
