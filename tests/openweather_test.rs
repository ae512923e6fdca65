//! Wiremock tests for the OpenWeather client — request shape, status
//! mapping, and the gateway's hit path over real HTTP.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vedrfolnir::upstream::WeatherUpstream;
use vedrfolnir::{GeoQuery, OpenWeatherClient, Units, Vedrfolnir, VedrfolnirError, WeatherQuery};

fn sample_conditions() -> serde_json::Value {
    json!({
        "lat": 45.3211,
        "lon": -75.7391,
        "current": {
            "temp": 21.4,
            "humidity": 62,
            "weather": [{"main": "Clear", "description": "clear sky"}]
        }
    })
}

fn ottawa() -> WeatherQuery {
    WeatherQuery::new(45.3211, -75.7391).units(Units::Metric)
}

#[tokio::test]
async fn onecall_sends_the_canonical_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .and(query_param("lat", "45.3211"))
        .and(query_param("lon", "-75.7391"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_conditions()))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenWeatherClient::with_base_url("test-key", server.uri());
    let payload = client.fetch_current(&ottawa()).await.unwrap();

    // Payload passes through untouched.
    assert_eq!(payload, sample_conditions());
}

#[tokio::test]
async fn coordinates_are_sent_with_fixed_precision() {
    let server = MockServer::start().await;

    // The caller wrote short floats; the wire carries the same rendering
    // the cache key uses.
    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .and(query_param("lat", "45.3200"))
        .and(query_param("lon", "-75.7000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenWeatherClient::with_base_url("test-key", server.uri());
    client
        .fetch_current(&WeatherQuery::new(45.32, -75.7))
        .await
        .unwrap();
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_failed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "bad key"})))
        .mount(&server)
        .await;

    let client = OpenWeatherClient::with_base_url("bad-key", server.uri());
    let err = client.fetch_current(&ottawa()).await.unwrap_err();

    assert!(matches!(err, VedrfolnirError::AuthenticationFailed));
}

#[tokio::test]
async fn rate_limit_carries_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .mount(&server)
        .await;

    let client = OpenWeatherClient::with_base_url("test-key", server.uri());
    let err = client.fetch_current(&ottawa()).await.unwrap_err();

    match err {
        VedrfolnirError::RateLimited { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(30)));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_maps_to_upstream_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = OpenWeatherClient::with_base_url("test-key", server.uri());
    let err = client.fetch_current(&ottawa()).await.unwrap_err();

    match err {
        VedrfolnirError::UpstreamStatus { status, .. } => assert_eq!(status, 502),
        other => panic!("expected UpstreamStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_body_maps_to_malformed_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = OpenWeatherClient::with_base_url("test-key", server.uri());
    let err = client.fetch_current(&ottawa()).await.unwrap_err();

    assert!(matches!(err, VedrfolnirError::MalformedResponse(_)));
}

#[tokio::test]
async fn hung_upstream_times_out_as_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client =
        OpenWeatherClient::with_timeout("test-key", server.uri(), Duration::from_millis(100));
    let err = client.fetch_current(&ottawa()).await.unwrap_err();

    assert!(matches!(err, VedrfolnirError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn geocode_sends_zip_and_country_together() {
    let server = MockServer::start().await;

    let geo = json!({"zip": "K2G 1V8", "name": "Ottawa", "lat": 45.3211, "lon": -75.7391, "country": "CA"});
    Mock::given(method("GET"))
        .and(path("/geo/1.0/zip"))
        .and(query_param("zip", "K2G 1V8,CA"))
        .and(query_param("appid", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geo.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenWeatherClient::with_base_url("test-key", server.uri());
    let payload = client
        .geocode(&GeoQuery::new("K2G 1V8", "CA"))
        .await
        .unwrap();

    assert_eq!(payload, geo);
}

// =========================================================================
// Gateway over real HTTP
// =========================================================================

#[tokio::test]
async fn second_resolve_within_the_window_stays_off_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_conditions()))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Vedrfolnir::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .build()
        .unwrap();

    let first = gateway.weather(&ottawa()).await.unwrap();
    // The write-back is detached; give it a beat to land before re-reading.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = gateway.weather(&ottawa()).await.unwrap();

    assert_eq!(first, second);
    // expect(1) on the mock verifies the second resolve never hit the server.
}

#[tokio::test]
async fn upstream_outage_surfaces_through_the_gateway() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/3.0/onecall"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let gateway = Vedrfolnir::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .build()
        .unwrap();

    let err = gateway.weather(&ottawa()).await.unwrap_err();
    match err {
        VedrfolnirError::UpstreamStatus { status, .. } => assert_eq!(status, 503),
        other => panic!("expected UpstreamStatus, got {other:?}"),
    }
}
