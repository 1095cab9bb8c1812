//! Nominatim / OpenStreetMap geocoder client.
//!
//! Keyless alternative to the Google geocoder. Nominatim has strict rate
//! limits: **1 request per second** maximum on the public instance, which
//! is fine for interactive, debounced queries.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use async_trait::async_trait;
use location_insight_metrics_models::Coordinates;

use crate::{GeocodeError, Geocoder, validate_query};

/// Geocoder backed by a Nominatim free-form search endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Creates a geocoder that sends requests to `base_url`.
    #[must_use]
    pub const fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, location_text: &str) -> Result<Coordinates, GeocodeError> {
        let query = validate_query(location_text)?;

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("q", query), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(GeocodeError::Failed {
                reason: resp.status().to_string(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses Nominatim JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Coordinates, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Err(GeocodeError::Failed {
            reason: "ZERO_RESULTS".to_string(),
        });
    };

    let lat = first["lat"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lat in Nominatim response".to_string(),
        })?;

    let lon = first["lon"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lon in Nominatim response".to_string(),
        })?;

    Ok(Coordinates::new(lat, lon))
}
