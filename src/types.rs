//! Request parameter types for the weather gateway.

use serde::{Deserialize, Serialize};

/// Unit system for upstream responses.
///
/// Mirrors the provider's `units` query parameter vocabulary. `Standard`
/// (Kelvin) is the provider's default when the parameter is omitted, so it
/// is the default here too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Kelvin / metres per second.
    #[default]
    Standard,
    /// Celsius / metres per second.
    Metric,
    /// Fahrenheit / miles per hour.
    Imperial,
}

impl Units {
    /// Wire form of the unit system, used verbatim in cache keys and URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Standard => "standard",
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a current-conditions request.
///
/// Every field participates in cache key derivation; two queries that differ
/// in any field resolve to different cache entries.
///
/// ```rust
/// use vedrfolnir::{Units, WeatherQuery};
///
/// let query = WeatherQuery::new(45.3211, -75.7391).units(Units::Metric);
/// assert_eq!(query.units, Units::Metric);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherQuery {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// Unit system for the response.
    #[serde(default)]
    pub units: Units,
}

impl WeatherQuery {
    /// Create a query for the given coordinates with default units.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            units: Units::default(),
        }
    }

    /// Set the unit system.
    pub fn units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }
}

/// Parameters of a postal-code geocoding request.
///
/// Geocoding responses are passed through uncached; the struct exists so the
/// upstream boundary takes typed parameters rather than raw strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoQuery {
    /// Postal or ZIP code, e.g. `"K2G 1V8"`.
    pub postal_code: String,
    /// ISO 3166 country code, e.g. `"CA"`.
    pub country_code: String,
}

impl GeoQuery {
    /// Create a geocoding query.
    pub fn new(postal_code: impl Into<String>, country_code: impl Into<String>) -> Self {
        Self {
            postal_code: postal_code.into(),
            country_code: country_code.into(),
        }
    }
}
