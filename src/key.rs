//! Cache key derivation.
//!
//! Keys are stored verbatim (not hashed) so entries in a shared store stay
//! debuggable from `redis-cli`, and so a key computed by one server instance
//! resolves against entries written by another. The canonical form is the
//! query string the original page used:
//!
//! ```text
//! lat=45.3211&lon=-75.7391&units=metric
//! ```
//!
//! Coordinates are formatted to a fixed 4 decimal places (roughly 11 m of
//! ground resolution) so float-formatting drift can never produce spurious
//! misses. The same formatting feeds the upstream URL builder, keeping the
//! key and the request it stands for in lockstep.

use crate::{Result, VedrfolnirError, WeatherQuery};

/// Decimal places used when rendering coordinates.
const COORD_PRECISION: usize = 4;

/// An opaque, deterministic cache key.
///
/// Derived from every request field that affects the upstream response.
/// Identical queries always produce identical keys; queries differing in any
/// field produce different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a current-conditions query.
    ///
    /// Fails with [`VedrfolnirError::Encoding`] if a coordinate is NaN or
    /// infinite — callers get that error before any network traffic happens.
    pub fn for_query(query: &WeatherQuery) -> Result<Self> {
        let lat = format_coord(query.lat)?;
        let lon = format_coord(query.lon)?;
        Ok(CacheKey(format!(
            "lat={lat}&lon={lon}&units={}",
            query.units.as_str()
        )))
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl WeatherQuery {
    /// Derive the cache key for this query. See [`CacheKey::for_query`].
    pub fn cache_key(&self) -> Result<CacheKey> {
        CacheKey::for_query(self)
    }
}

/// Render a coordinate with the fixed precision shared by keys and URLs.
pub(crate) fn format_coord(value: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(VedrfolnirError::Encoding(format!(
            "coordinate is not a finite number: {value}"
        )));
    }
    Ok(format!("{value:.prec$}", prec = COORD_PRECISION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Units;

    #[test]
    fn key_is_deterministic() {
        let query = WeatherQuery::new(45.3211, -75.7391).units(Units::Metric);
        let k1 = CacheKey::for_query(&query).unwrap();
        let k2 = CacheKey::for_query(&query).unwrap();
        assert_eq!(k1, k2);
    }

    #[test]
    fn key_matches_canonical_form() {
        let query = WeatherQuery::new(45.3211, -75.7391).units(Units::Metric);
        let key = CacheKey::for_query(&query).unwrap();
        assert_eq!(key.as_str(), "lat=45.3211&lon=-75.7391&units=metric");
    }

    #[test]
    fn key_differs_on_units() {
        let metric = WeatherQuery::new(45.3211, -75.7391).units(Units::Metric);
        let imperial = metric.units(Units::Imperial);
        assert_ne!(
            CacheKey::for_query(&metric).unwrap(),
            CacheKey::for_query(&imperial).unwrap()
        );
    }

    #[test]
    fn key_differs_on_coordinates() {
        let a = WeatherQuery::new(45.3211, -75.7391);
        let b = WeatherQuery::new(45.3212, -75.7391);
        assert_ne!(
            CacheKey::for_query(&a).unwrap(),
            CacheKey::for_query(&b).unwrap()
        );
    }

    #[test]
    fn coordinates_render_with_fixed_precision() {
        // Short inputs gain trailing zeros, long inputs round; either way the
        // rendered width is stable across call sites.
        assert_eq!(format_coord(45.32).unwrap(), "45.3200");
        assert_eq!(format_coord(-75.73914999).unwrap(), "-75.7391");
    }

    #[test]
    fn non_finite_coordinate_is_an_encoding_error() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = CacheKey::for_query(&WeatherQuery::new(bad, 0.0)).unwrap_err();
            assert!(matches!(err, VedrfolnirError::Encoding(_)));
        }
    }
}
