//! Source registry: loads all backend definitions from embedded TOML configs.
//!
//! Each `.toml` file in `packages/source/sources/` is baked into the binary
//! at compile time via [`include_str!`]. Adding a new backend means adding a
//! TOML file here, a [`MetricCategory`] variant, and its sub-metrics in the
//! normalizer table.

use std::sync::Arc;

use location_insight_metrics_models::MetricCategory;
use location_insight_source_models::SourceDefinition;

use crate::MetricSourceClient;
use crate::http::HttpMetricSource;

/// TOML configs embedded at compile time.
const SOURCE_TOMLS: &[(&str, &str)] = &[
    ("education", include_str!("../sources/education.toml")),
    ("living", include_str!("../sources/living.toml")),
    ("access", include_str!("../sources/access.toml")),
];

/// Parses a backend definition from TOML.
///
/// # Errors
///
/// Returns a [`toml::de::Error`] if the TOML is malformed or missing
/// required fields.
pub fn parse_source_toml(toml_str: &str) -> Result<SourceDefinition, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns all configured backend definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_sources() -> Vec<SourceDefinition> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_source_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns the backend definition for `category`, if one is configured.
#[must_use]
pub fn source_for(category: MetricCategory) -> Option<SourceDefinition> {
    all_sources().into_iter().find(|s| s.category == category)
}

/// Builds one HTTP client per configured backend, all rooted at `base_url`.
#[must_use]
pub fn http_sources(client: &reqwest::Client, base_url: &str) -> Vec<Arc<dyn MetricSourceClient>> {
    all_sources()
        .into_iter()
        .map(|def| {
            log::debug!(
                "Registered {} backend at {}",
                def.category,
                def.endpoint(base_url)
            );
            Arc::new(HttpMetricSource::new(client.clone(), &def, base_url))
                as Arc<dyn MetricSourceClient>
        })
        .collect()
}
