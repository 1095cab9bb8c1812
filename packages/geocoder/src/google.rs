//! Google Maps Geocoding API client.
//!
//! Sends `GET {base_url}?address=...&key=...` and reads
//! `results[0].geometry.location.{lat,lng}`. Any `status` other than
//! `"OK"` is a hard failure.
//!
//! See <https://developers.google.com/maps/documentation/geocoding/requests-geocoding>

use async_trait::async_trait;
use location_insight_metrics_models::Coordinates;
use serde::Deserialize;

use crate::{GeocodeError, Geocoder, validate_query};

/// Status value for a successful lookup.
const STATUS_OK: &str = "OK";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Geocoder backed by the Google Maps Geocoding API.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleGeocoder {
    /// Creates a geocoder that sends requests to `base_url`.
    #[must_use]
    pub const fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn resolve(&self, location_text: &str) -> Result<Coordinates, GeocodeError> {
        let address = validate_query(location_text)?;

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(GeocodeError::Failed {
                reason: resp.status().to_string(),
            });
        }

        let body = resp.text().await?;
        parse_response(&body)
    }
}

/// Parses a Geocoding API JSON body.
fn parse_response(body: &str) -> Result<Coordinates, GeocodeError> {
    let response: GeocodeResponse =
        serde_json::from_str(body).map_err(|e| GeocodeError::Parse {
            message: format!("Invalid geocoding response: {e}"),
        })?;

    if response.status != STATUS_OK {
        if let Some(message) = &response.error_message {
            log::warn!("Geocoding returned {}: {message}", response.status);
        }
        return Err(GeocodeError::Failed {
            reason: response.status,
        });
    }

    let Some(first) = response.results.first() else {
        return Err(GeocodeError::Failed {
            reason: "ZERO_RESULTS".to_string(),
        });
    };

    Ok(Coordinates::new(
        first.geometry.location.lat,
        first.geometry.location.lng,
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn ok_body() -> serde_json::Value {
        json!({
            "status": "OK",
            "results": [{
                "formatted_address": "Downtown Dubai - Dubai - United Arab Emirates",
                "geometry": { "location": { "lat": 25.0657, "lng": 55.1713 } }
            }]
        })
    }

    #[test]
    fn parses_first_result() {
        let coords = parse_response(&ok_body().to_string()).unwrap();
        assert!((coords.latitude - 25.0657).abs() < 1e-6);
        assert!((coords.longitude - 55.1713).abs() < 1e-6);
    }

    #[test]
    fn non_ok_status_is_failure() {
        let body = json!({ "status": "ZERO_RESULTS", "results": [] }).to_string();
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, GeocodeError::Failed { reason } if reason == "ZERO_RESULTS"));
    }

    #[test]
    fn ok_without_results_is_failure() {
        let body = json!({ "status": "OK", "results": [] }).to_string();
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Failed { .. })
        ));
    }

    #[test]
    fn garbage_is_parse_error() {
        assert!(matches!(
            parse_response("<html>"),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn resolves_against_service() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("address", "Downtown Dubai"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let geocoder =
            GoogleGeocoder::new(reqwest::Client::new(), server.uri(), "test-key".to_string());
        let coords = geocoder.resolve(" Downtown Dubai ").await.unwrap();
        assert!((coords.latitude - 25.0657).abs() < 1e-6);
    }

    #[tokio::test]
    async fn request_denied_is_reported_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid.",
                "results": []
            })))
            .mount(&server)
            .await;

        let geocoder =
            GoogleGeocoder::new(reqwest::Client::new(), server.uri(), "bad".to_string());
        let err = geocoder.resolve("Marina").await.unwrap_err();
        assert!(matches!(err, GeocodeError::Failed { reason } if reason == "REQUEST_DENIED"));
    }

    #[tokio::test]
    async fn http_error_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let geocoder = GoogleGeocoder::new(reqwest::Client::new(), server.uri(), "k".to_string());
        let err = geocoder.resolve("Marina").await.unwrap_err();
        assert!(matches!(err, GeocodeError::Failed { reason } if reason.contains("503")));
    }

    #[tokio::test]
    async fn blank_query_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(0)
            .mount(&server)
            .await;

        let geocoder = GoogleGeocoder::new(reqwest::Client::new(), server.uri(), "k".to_string());
        assert!(matches!(
            geocoder.resolve("   ").await,
            Err(GeocodeError::InvalidQuery)
        ));
    }
}
