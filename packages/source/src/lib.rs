#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Metric backend clients.
//!
//! Each scoring backend implements the [`MetricSourceClient`] trait: one
//! request per call, parameterized by latitude/longitude, answering with a
//! typed [`SourcePayload`]. Payloads are validated here so that nothing
//! downstream has to deal with half-shaped JSON.
//!
//! Deadlines are not applied by the clients themselves; the caller wraps
//! each fetch with whatever timeout it has been configured with.

pub mod http;
pub mod parse;
pub mod registry;

use async_trait::async_trait;
use location_insight_metrics_models::{Coordinates, MetricCategory};
use location_insight_source_models::SourcePayload;

/// Base URL used when no override is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Errors that can occur while fetching from a metric backend.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The backend answered with a non-2xx status.
    #[error("{category} backend unavailable (HTTP {status})")]
    Unavailable {
        /// Backend category.
        category: MetricCategory,
        /// HTTP status code.
        status: u16,
    },

    /// The backend did not answer within the configured deadline.
    #[error("{category} backend timed out")]
    Timeout {
        /// Backend category.
        category: MetricCategory,
    },

    /// The backend answered with `success: false`.
    #[error("{category} backend reported an unsuccessful analysis")]
    Rejected {
        /// Backend category.
        category: MetricCategory,
    },

    /// The response body did not match the backend's schema.
    #[error("{category} backend returned a malformed payload: {message}")]
    MalformedPayload {
        /// Backend category.
        category: MetricCategory,
        /// Description of what went wrong.
        message: String,
    },

    /// HTTP request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Trait that every metric backend client implements.
#[async_trait]
pub trait MetricSourceClient: Send + Sync {
    /// The category of records this backend produces.
    fn category(&self) -> MetricCategory;

    /// Fetches and validates the backend's payload for `coordinates`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails, the backend answers
    /// with a non-2xx status, or the payload is malformed or unsuccessful.
    async fn fetch(&self, coordinates: Coordinates) -> Result<SourcePayload, SourceError>;
}
