#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Metric backend payload schemas and source definition types.
//!
//! Each scoring backend answers with its own nested JSON envelope. The
//! structs here mirror those envelopes so a payload is validated once, at
//! the client boundary, instead of being walked with untyped lookups.
//! Only the fields the pipeline consumes are modelled; everything else is
//! ignored during deserialization.

use std::collections::BTreeMap;

use location_insight_metrics_models::MetricCategory;
use serde::{Deserialize, Serialize};

/// A metric backend, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Unique source identifier (e.g., `"education"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Category of records this backend produces.
    pub category: MetricCategory,
    /// Endpoint path relative to the API base URL
    /// (e.g., `"schools/comprehensive"`).
    pub path: String,
}

impl SourceDefinition {
    /// Returns the full endpoint URL under `base_url`.
    #[must_use]
    pub fn endpoint(&self, base_url: &str) -> String {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

/// One scored component of a backend analysis.
///
/// Every backend reports `score`; the school density component reports
/// `schools_per_km2` instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Component score.
    #[serde(default)]
    pub score: Option<f64>,
    /// KG-G12 schools per square kilometre within the analysis radius.
    #[serde(default)]
    pub schools_per_km2: Option<f64>,
}

/// A point of interest as reported by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFeature {
    /// Backend identifier, if any.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Street address.
    #[serde(default)]
    pub address: Option<String>,
    /// Rating out of 5.
    #[serde(default)]
    pub rating: Option<f64>,
}

/// Points of interest keyed by filter tag name (e.g. `"schools"`).
///
/// Keys are kept as strings so an unknown tag from a newer backend does
/// not invalidate the whole payload.
pub type FeatureGroups = BTreeMap<String, Vec<RawFeature>>;

// ── Education ───────────────────────────────────────────────────────

/// `GET .../schools/comprehensive` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationPayload {
    /// Whether the backend produced an analysis.
    #[serde(default)]
    pub success: bool,
    /// The analysis.
    pub education_analysis: EducationAnalysis,
    /// Optional points of interest.
    #[serde(default)]
    pub features: FeatureGroups,
}

/// Education analysis body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationAnalysis {
    /// Backend's own aggregate score (not used for records).
    #[serde(default)]
    pub overall_education_score: Option<f64>,
    /// Scored components.
    #[serde(default)]
    pub components: EducationComponents,
}

/// Education components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationComponents {
    /// School density within 5 km.
    #[serde(default)]
    pub school_density: Option<Component>,
    /// Average school rating within 5 km.
    #[serde(default)]
    pub school_quality: Option<Component>,
    /// Proximity by school type.
    #[serde(default)]
    pub proximity_analysis: Option<ProximityAnalysis>,
}

/// Proximity scores by school type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProximityAnalysis {
    /// Primary and secondary schools.
    #[serde(default)]
    pub kg_g12_schools: Option<Component>,
    /// Nurseries.
    #[serde(default)]
    pub nursery_schools: Option<Component>,
    /// Universities.
    #[serde(default)]
    pub universities: Option<Component>,
}

// ── Living quality ──────────────────────────────────────────────────

/// `GET .../living/comprehensive` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivingPayload {
    /// Whether the backend produced an analysis.
    #[serde(default)]
    pub success: bool,
    /// The analysis.
    pub living_quality: LivingQuality,
    /// Optional points of interest.
    #[serde(default)]
    pub features: FeatureGroups,
}

/// Living quality body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivingQuality {
    /// Backend's own aggregate score (not used for records).
    #[serde(default)]
    pub overall_score: Option<f64>,
    /// Scored components.
    #[serde(default)]
    pub components: LivingComponents,
}

/// Living quality components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LivingComponents {
    /// Restaurant and cafe density.
    #[serde(default)]
    pub dining_entertainment: Option<Component>,
    /// Shopping and grocery accessibility.
    #[serde(default)]
    pub shopping_groceries: Option<Component>,
    /// Healthcare facility access.
    #[serde(default)]
    pub healthcare_access: Option<Component>,
    /// Walkability.
    #[serde(default)]
    pub walkability: Option<Component>,
}

// ── Access / transportation ─────────────────────────────────────────

/// `GET .../transportation/comprehensive` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPayload {
    /// Whether the backend produced an analysis.
    #[serde(default)]
    pub success: bool,
    /// The analysis.
    pub data: AccessData,
    /// Optional points of interest.
    #[serde(default)]
    pub features: FeatureGroups,
}

/// Access analysis body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessData {
    /// Backend's own aggregate score (not used for records).
    #[serde(default)]
    pub overall_score: Option<f64>,
    /// Scored components.
    #[serde(default)]
    pub components: AccessComponents,
}

/// Access components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessComponents {
    /// Proximity to metro stations.
    #[serde(default)]
    pub metro_proximity: Option<Component>,
    /// Bus stop density.
    #[serde(default)]
    pub bus_connectivity: Option<Component>,
    /// Distance to major roads and access density.
    #[serde(default)]
    pub road_access: Option<Component>,
    /// Car ownership proxy.
    #[serde(default)]
    pub car_independence: Option<Component>,
    /// Commute times to business hubs.
    #[serde(default)]
    pub commute_efficiency: Option<Component>,
    /// Walk, drive, and bike infrastructure mix.
    #[serde(default)]
    pub bike_walk_infrastructure: Option<Component>,
}

/// A validated payload from one backend.
#[derive(Debug, Clone, PartialEq)]
pub enum SourcePayload {
    /// Schools backend.
    Education(EducationPayload),
    /// Living quality backend.
    Living(LivingPayload),
    /// Transportation backend.
    Access(AccessPayload),
}

impl SourcePayload {
    /// The category this payload belongs to.
    #[must_use]
    pub const fn category(&self) -> MetricCategory {
        match self {
            Self::Education(_) => MetricCategory::Education,
            Self::Living(_) => MetricCategory::Living,
            Self::Access(_) => MetricCategory::Access,
        }
    }

    /// Points of interest carried by the payload.
    #[must_use]
    pub const fn features(&self) -> &FeatureGroups {
        match self {
            Self::Education(p) => &p.features,
            Self::Living(p) => &p.features,
            Self::Access(p) => &p.features,
        }
    }
}
