//! OpenWeather API client.
//!
//! Thin HTTP caller for the "One Call" current + forecast endpoint and the
//! zip/postal geocoding endpoint.
//! See: <https://openweathermap.org/api/one-call-3>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::WeatherUpstream;
use crate::key::format_coord;
use crate::{GeoQuery, Result, VedrfolnirError, WeatherQuery, telemetry};

/// Client for the OpenWeather API.
///
/// Holds the API credential and a pooled HTTP client; cheap to clone.
#[derive(Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl OpenWeatherClient {
    /// Default base URL for the OpenWeather API.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openweathermap.org";

    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, Self::DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::with_timeout(api_key, base_url, Self::DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom base URL and request timeout.
    pub fn with_timeout(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into(),
        }
    }

    async fn get_json(
        &self,
        endpoint: &'static str,
        url: String,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value> {
        let started = std::time::Instant::now();
        let result = self.request(url, params).await;

        metrics::histogram!(
            telemetry::UPSTREAM_REQUEST_DURATION_SECONDS,
            "endpoint" => endpoint
        )
        .record(started.elapsed().as_secs_f64());
        metrics::counter!(
            telemetry::UPSTREAM_REQUESTS_TOTAL,
            "endpoint" => endpoint,
            "status" => if result.is_ok() { "ok" } else { "error" }
        )
        .increment(1);

        result
    }

    async fn request(&self, url: String, params: &[(&str, String)]) -> Result<serde_json::Value> {
        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| VedrfolnirError::UpstreamUnavailable(e.to_string()))?;

        Self::handle_response_errors(&response)?;

        response
            .json()
            .await
            .map_err(|e| VedrfolnirError::MalformedResponse(e.to_string()))
    }

    /// Check response status and map to the appropriate error.
    fn handle_response_errors(response: &reqwest::Response) -> Result<()> {
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        match status.as_u16() {
            401 => Err(VedrfolnirError::AuthenticationFailed),
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(VedrfolnirError::RateLimited { retry_after })
            }
            code => Err(VedrfolnirError::UpstreamStatus {
                status: code,
                message: format!("OpenWeather API error: {status}"),
            }),
        }
    }
}

#[async_trait]
impl WeatherUpstream for OpenWeatherClient {
    async fn fetch_current(&self, query: &WeatherQuery) -> Result<serde_json::Value> {
        // Coordinates render through the same fixed-precision formatter as
        // the cache key, so a key always names exactly the request it caches.
        let params = [
            ("lat", format_coord(query.lat)?),
            ("lon", format_coord(query.lon)?),
            ("units", query.units.as_str().to_string()),
        ];
        let url = format!("{}/data/3.0/onecall", self.base_url);
        self.get_json("onecall", url, &params).await
    }

    async fn geocode(&self, query: &GeoQuery) -> Result<serde_json::Value> {
        let params = [(
            "zip",
            format!("{},{}", query.postal_code, query.country_code),
        )];
        let url = format!("{}/geo/1.0/zip", self.base_url);
        self.get_json("geocode", url, &params).await
    }
}
