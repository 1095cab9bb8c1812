//! HTTP metric backend client.
//!
//! Sends `GET {base_url}/{path}?lat=..&lng=..` and validates the body
//! against the category's schema. No retries: a failing backend simply
//! becomes a partial failure for the query that asked for it.

use async_trait::async_trait;
use location_insight_metrics_models::{Coordinates, MetricCategory};
use location_insight_source_models::{SourceDefinition, SourcePayload};

use crate::parse::parse_payload;
use crate::{MetricSourceClient, SourceError};

/// A [`MetricSourceClient`] backed by one comprehensive-analysis endpoint.
#[derive(Debug, Clone)]
pub struct HttpMetricSource {
    client: reqwest::Client,
    category: MetricCategory,
    url: String,
}

impl HttpMetricSource {
    /// Creates a client for `definition`, rooted at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, definition: &SourceDefinition, base_url: &str) -> Self {
        Self {
            client,
            category: definition.category,
            url: definition.endpoint(base_url),
        }
    }

    /// The full endpoint URL this client requests.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MetricSourceClient for HttpMetricSource {
    fn category(&self) -> MetricCategory {
        self.category
    }

    async fn fetch(&self, coordinates: Coordinates) -> Result<SourcePayload, SourceError> {
        let category = self.category;
        log::debug!("Fetching {category} metrics for {coordinates}");

        let resp = self
            .client
            .get(&self.url)
            .query(&[
                ("lat", coordinates.latitude),
                ("lng", coordinates.longitude),
            ])
            .send()
            .await
            .map_err(|e| classify(category, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable {
                category,
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| classify(category, e))?;
        parse_payload(category, &body)
    }
}

/// Maps transport-level timeouts onto [`SourceError::Timeout`].
fn classify(category: MetricCategory, e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout { category }
    } else {
        SourceError::Http(e)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::registry::source_for;

    fn client_for(server: &MockServer, category: MetricCategory) -> HttpMetricSource {
        let def = source_for(category).unwrap();
        HttpMetricSource::new(reqwest::Client::new(), &def, &server.uri())
    }

    #[tokio::test]
    async fn fetches_with_lat_lng_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/living/comprehensive"))
            .and(query_param("lat", "25.0657"))
            .and(query_param("lng", "55.1713"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "living_quality": {
                    "components": { "dining_entertainment": { "score": 72 } }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = client_for(&server, MetricCategory::Living);
        let payload = source
            .fetch(Coordinates::new(25.0657, 55.1713))
            .await
            .unwrap();
        assert_eq!(payload.category(), MetricCategory::Living);
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/schools/comprehensive"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let source = client_for(&server, MetricCategory::Education);
        let err = source
            .fetch(Coordinates::new(25.0, 55.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SourceError::Unavailable {
                category: MetricCategory::Education,
                status: 502
            }
        ));
    }

    #[tokio::test]
    async fn unsuccessful_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transportation/comprehensive"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
            .mount(&server)
            .await;

        let source = client_for(&server, MetricCategory::Access);
        assert!(matches!(
            source.fetch(Coordinates::new(25.0, 55.0)).await,
            Err(SourceError::Rejected { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_http_error() {
        let def = source_for(MetricCategory::Living).unwrap();
        // Port 9 (discard) is not expected to accept HTTP connections.
        let source = HttpMetricSource::new(reqwest::Client::new(), &def, "http://127.0.0.1:9");
        assert!(matches!(
            source.fetch(Coordinates::new(0.0, 0.0)).await,
            Err(SourceError::Http(_))
        ));
    }

    #[test]
    fn url_is_rooted_at_base() {
        let def = source_for(MetricCategory::Education).unwrap();
        let source = HttpMetricSource::new(reqwest::Client::new(), &def, "https://api.example.com");
        assert_eq!(source.url(), "https://api.example.com/schools/comprehensive");
    }
}
