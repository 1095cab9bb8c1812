#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Metric aggregation and normalization.
//!
//! [`aggregate::MetricAggregator`] fans out to every configured backend at
//! once and waits for all of them to settle. Backends that fail are
//! recorded as partial failures; only when every backend fails does the
//! aggregation itself fail. [`normalize::MetricNormalizer`] then flattens
//! each successful payload into [`MetricRecord`]s using a static sub-metric
//! table.
//!
//! [`MetricRecord`]: location_insight_metrics_models::MetricRecord

pub mod aggregate;
pub mod normalize;

// helpers for unit tests
#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

pub use aggregate::{AggregateError, FetchedPayloads, MetricAggregator};
pub use normalize::{MetricNormalizer, SUB_METRICS, SubMetric};
