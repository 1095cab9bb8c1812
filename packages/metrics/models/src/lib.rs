#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Metric, coordinate, and map feature types.
//!
//! Every scoring backend (education, living quality, access) produces raw
//! payloads in its own shape. After normalization they all become
//! [`MetricRecord`]s tagged with a [`MetricCategory`], collected into a
//! single [`AggregateResult`] per query.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Opaque, monotonically minted query token.
///
/// Only used to compare a result's origin against the currently active
/// query; callers should not attach meaning to the numeric value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct QueryId(u64);

impl QueryId {
    /// Returns the token that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// A scoring backend category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetricCategory {
    /// School density, quality, and proximity.
    Education,
    /// Dining, shopping, healthcare, and walkability.
    Living,
    /// Transportation and commute access.
    Access,
}

impl MetricCategory {
    /// All categories in display order.
    pub const ALL: &[Self] = &[Self::Education, Self::Living, Self::Access];

    /// Human-readable category name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Education => "Education",
            Self::Living => "Living",
            Self::Access => "Access",
        }
    }
}

/// The value scale a sub-metric's raw score is reported on.
///
/// The two scales round differently and must never be conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricScale {
    /// A 0-100 percentage-like score, rounded to a whole number.
    Percentage,
    /// A 0-10 density or rating, rounded to one decimal place.
    Density,
}

impl MetricScale {
    /// Converts a raw backend score into the displayed value.
    ///
    /// The result is always clamped to `[0, 100]`.
    #[must_use]
    pub fn normalize(self, score: f64) -> f64 {
        let value = match self {
            Self::Percentage => score.round(),
            Self::Density => (score * 10.0).round() / 10.0,
        };
        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 100.0)
        }
    }
}

/// What to do when a backend response lacks an expected sub-metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AbsentMetricPolicy {
    /// Emit no record for the missing sub-metric.
    #[default]
    OmitIfAbsent,
    /// Emit a record with a score of zero.
    ZeroIfAbsent,
}

/// One normalized sub-metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    /// Stable identifier (e.g. `"school_density"`).
    pub key: String,
    /// Which backend produced this record.
    pub category: MetricCategory,
    /// Display label.
    pub label: String,
    /// Raw score as reported by the backend.
    pub score: f64,
    /// Static explanation of what the score measures.
    pub description: String,
    /// Score converted to the sub-metric's display scale, in `[0, 100]`.
    pub normalized_value: f64,
}

/// Map feature tags that can be toggled on and off as filters.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeatureTag {
    /// Schools of any level.
    Schools,
    /// Metro stations and bus stops.
    Transit,
    /// Clinics, hospitals, and pharmacies.
    Healthcare,
    /// Restaurants and cafes.
    Restaurants,
    /// Parks and green space.
    Parks,
}

impl FeatureTag {
    /// All tags in filter-bar order.
    pub const ALL: &[Self] = &[
        Self::Schools,
        Self::Transit,
        Self::Healthcare,
        Self::Restaurants,
        Self::Parks,
    ];

    /// Tags that are active when a widget first loads.
    pub const DEFAULT_ACTIVE: &[Self] = &[Self::Schools, Self::Transit, Self::Healthcare];

    /// Human-readable tag name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Schools => "Schools",
            Self::Transit => "Transit",
            Self::Healthcare => "Healthcare",
            Self::Restaurants => "Restaurants",
            Self::Parks => "Parks",
        }
    }
}

/// A point of interest that can be drawn on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapFeature {
    /// Stable identifier used to diff annotations across refreshes.
    pub id: String,
    /// Filter tag this feature belongs to.
    pub tag: FeatureTag,
    /// Feature location.
    pub coordinates: Coordinates,
    /// Display name.
    pub label: String,
    /// Street address, when the backend provides one.
    pub address: Option<String>,
    /// Rating out of 5, when the backend provides one.
    pub rating: Option<f64>,
}

/// The merged outcome of one query's pipeline run.
///
/// Replaced wholesale on each successful query, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    /// The query this result belongs to.
    pub query_id: QueryId,
    /// Where the query resolved to.
    pub coordinates: Coordinates,
    /// Normalized records, ordered by category then by sub-metric.
    pub records: Vec<MetricRecord>,
    /// Map features from every successful source.
    pub features: Vec<MapFeature>,
    /// Categories whose source failed.
    pub partial_failures: BTreeSet<MetricCategory>,
}

impl AggregateResult {
    /// Returns the records belonging to `category`, in order.
    pub fn records_for(&self, category: MetricCategory) -> impl Iterator<Item = &MetricRecord> {
        self.records.iter().filter(move |r| r.category == category)
    }

    /// Returns the record with the given key, if present.
    #[must_use]
    pub fn record(&self, key: &str) -> Option<&MetricRecord> {
        self.records.iter().find(|r| r.key == key)
    }

    /// Whether every category was fetched successfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.partial_failures.is_empty()
    }
}
