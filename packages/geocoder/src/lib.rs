#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for location insight queries.
//!
//! Converts a free-text place name (e.g. `"Downtown Dubai"`) into a
//! coordinate pair. Providers are configured via TOML files in
//! `services/` and loaded from the [`service_registry`]:
//!
//! 1. **Google Maps Geocoding API** (priority 1): requires an API key.
//! 2. **Nominatim / OpenStreetMap** (priority 2, disabled by default):
//!    free, 1 req/sec rate limit.
//!
//! Every provider makes exactly one outbound request per call. There are
//! no retries; a failed lookup fails the query.

pub mod google;
pub mod nominatim;
pub mod service_registry;

use async_trait::async_trait;
use location_insight_metrics_models::Coordinates;
use thiserror::Error;

use crate::service_registry::{GeocodingService, ProviderConfig};

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The location text was empty or whitespace.
    #[error("Location text is empty")]
    InvalidQuery,

    /// The geocoding service answered but did not resolve the location.
    #[error("Geocoding failed: {reason}")]
    Failed {
        /// Upstream status string (e.g. `"ZERO_RESULTS"`, `"REQUEST_DENIED"`).
        reason: String,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

/// Resolves a location string to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves `location_text` to a single coordinate pair.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::InvalidQuery`] without any network call
    /// when `location_text` is blank, and [`GeocodeError::Failed`] when
    /// the service does not return a match.
    async fn resolve(&self, location_text: &str) -> Result<Coordinates, GeocodeError>;
}

/// Trims `location_text`, rejecting blank input.
///
/// # Errors
///
/// Returns [`GeocodeError::InvalidQuery`] if nothing but whitespace remains.
pub fn validate_query(location_text: &str) -> Result<&str, GeocodeError> {
    let trimmed = location_text.trim();
    if trimmed.is_empty() {
        return Err(GeocodeError::InvalidQuery);
    }
    Ok(trimmed)
}

/// Builds the geocoder for a configured service.
///
/// `api_key` is passed through to providers that need one and ignored by
/// the rest.
#[must_use]
pub fn geocoder_for_service(
    client: reqwest::Client,
    service: &GeocodingService,
    api_key: &str,
) -> Box<dyn Geocoder> {
    match &service.provider {
        ProviderConfig::Google { base_url } => Box::new(google::GoogleGeocoder::new(
            client,
            base_url.clone(),
            api_key.to_string(),
        )),
        ProviderConfig::Nominatim { base_url } => Box::new(nominatim::NominatimGeocoder::new(
            client,
            base_url.clone(),
        )),
    }
}

/// Builds the geocoder for the highest-priority enabled service.
///
/// Returns `None` if every service is disabled.
#[must_use]
pub fn default_geocoder(client: reqwest::Client, api_key: &str) -> Option<Box<dyn Geocoder>> {
    let service = service_registry::enabled_services().into_iter().next()?;
    log::debug!("Using geocoding service '{}' ({})", service.id, service.name);
    Some(geocoder_for_service(client, &service, api_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_queries_are_invalid() {
        assert!(matches!(validate_query(""), Err(GeocodeError::InvalidQuery)));
        assert!(matches!(
            validate_query("  \t "),
            Err(GeocodeError::InvalidQuery)
        ));
    }

    #[test]
    fn queries_are_trimmed() {
        assert_eq!(validate_query("  Downtown Dubai ").unwrap(), "Downtown Dubai");
    }

    #[test]
    fn default_geocoder_uses_enabled_service() {
        assert!(default_geocoder(reqwest::Client::new(), "key").is_some());
    }
}
