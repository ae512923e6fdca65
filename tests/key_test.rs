//! Tests for cache key derivation — determinism, injectivity over
//! distinguishing fields, and the canonical wire form.

use vedrfolnir::{CacheKey, Units, VedrfolnirError, WeatherQuery};

#[test]
fn same_parameters_always_yield_the_same_key() {
    let query = WeatherQuery::new(45.3211, -75.7391).units(Units::Metric);
    assert_eq!(
        CacheKey::for_query(&query).unwrap(),
        CacheKey::for_query(&query).unwrap()
    );
}

#[test]
fn canonical_form_is_the_original_query_string() {
    let query = WeatherQuery::new(45.3211, -75.7391).units(Units::Metric);
    assert_eq!(
        query.cache_key().unwrap().as_str(),
        "lat=45.3211&lon=-75.7391&units=metric"
    );
}

#[test]
fn differing_units_yield_differing_keys() {
    let base = WeatherQuery::new(45.3211, -75.7391);
    let metric = base.units(Units::Metric).cache_key().unwrap();
    let imperial = base.units(Units::Imperial).cache_key().unwrap();
    assert_ne!(metric, imperial);
}

#[test]
fn differing_coordinates_yield_differing_keys() {
    let a = WeatherQuery::new(45.3211, -75.7391).cache_key().unwrap();
    let b = WeatherQuery::new(45.3212, -75.7391).cache_key().unwrap();
    let c = WeatherQuery::new(45.3211, -75.7392).cache_key().unwrap();
    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_ne!(b, c);
}

#[test]
fn field_names_prevent_concatenation_collisions() {
    // Same digit stream split differently across lat/lon must not collide.
    let a = WeatherQuery::new(12.3, 45.0).cache_key().unwrap();
    let b = WeatherQuery::new(12.0, 345.0).cache_key().unwrap();
    assert_ne!(a, b);
}

#[test]
fn formatting_drift_does_not_split_the_cache() {
    // 45.32110 and 45.3211 are the same coordinate; fixed precision keeps
    // them on the same entry regardless of how the caller wrote the float.
    let a = WeatherQuery::new(45.32110, -75.7391).cache_key().unwrap();
    let b = WeatherQuery::new(45.3211, -75.7391).cache_key().unwrap();
    assert_eq!(a, b);
}

#[test]
fn keys_resolve_identically_across_instances() {
    // A key is a plain string; one computed by this process must match one
    // computed by any other process against a shared store.
    let query = WeatherQuery::new(49.2827, -123.1207).units(Units::Imperial);
    let key = query.cache_key().unwrap();
    assert_eq!(key.to_string(), "lat=49.2827&lon=-123.1207&units=imperial");
}

#[test]
fn non_finite_coordinates_are_rejected() {
    for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = WeatherQuery::new(45.0, bad).cache_key().unwrap_err();
        assert!(matches!(err, VedrfolnirError::Encoding(_)));
    }
}
