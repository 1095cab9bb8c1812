#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location insight widget core.
//!
//! [`QueryController`] turns a location string into an
//! [`AggregateResult`](location_insight_metrics_models::AggregateResult)
//! and publishes every step as an immutable
//! [`WidgetSnapshot`](location_insight_widget_models::WidgetSnapshot).
//! Renderers subscribe to snapshots and never touch the pipeline directly.

pub mod controller;
pub mod hooks;
pub mod input;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{QueryController, source_error_kind};
pub use hooks::WidgetHooks;
pub use input::{DebouncedInput, InputEvent, spawn_input_driver};

use location_insight_widget_models::ConfigError;

/// Errors raised while building a widget.
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Every geocoding service is disabled.
    #[error("No geocoding service is enabled")]
    NoGeocoder,

    /// The configured `geocodingService` is not in the registry.
    #[error("Unknown geocoding service '{0}'")]
    UnknownGeocodingService(String),
}
