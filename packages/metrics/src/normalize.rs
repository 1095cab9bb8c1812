//! Flattens backend payloads into uniform metric records.
//!
//! Which sub-metrics exist, what they are called, and which scale they
//! are reported on is fixed in [`SUB_METRICS`]. Payload contents never
//! introduce new keys.

use std::collections::BTreeSet;
use std::str::FromStr as _;

use location_insight_metrics_models::{
    AbsentMetricPolicy, AggregateResult, Coordinates, FeatureTag, MapFeature, MetricCategory,
    MetricRecord, MetricScale, QueryId,
};
use location_insight_source_models::{
    AccessComponents, Component, EducationComponents, LivingComponents, RawFeature, SourcePayload,
};

use crate::aggregate::FetchedPayloads;

/// Static description of one recognized sub-metric.
#[derive(Debug, Clone, Copy)]
pub struct SubMetric {
    /// Stable record key.
    pub key: &'static str,
    /// Backend the sub-metric comes from.
    pub category: MetricCategory,
    /// Display label.
    pub label: &'static str,
    /// What the score measures.
    pub description: &'static str,
    /// Scale of the raw score.
    pub scale: MetricScale,
    extract: fn(&SourcePayload) -> Option<f64>,
}

impl SubMetric {
    /// Reads this sub-metric's raw score from `payload`, if present.
    #[must_use]
    pub fn raw_score(&self, payload: &SourcePayload) -> Option<f64> {
        (self.extract)(payload)
    }
}

/// Every recognized sub-metric, in record order.
pub const SUB_METRICS: &[SubMetric] = &[
    // ── Education ───────────────────────────────────────────────────
    SubMetric {
        key: "school_density",
        category: MetricCategory::Education,
        label: "School Density",
        description: "Number of KG-G12 schools per km squared calculated with a 5km radius",
        scale: MetricScale::Density,
        extract: school_density,
    },
    SubMetric {
        key: "school_quality",
        category: MetricCategory::Education,
        label: "School Rating",
        description: "Average of all KG-G12 schools in a 5km radius of location",
        scale: MetricScale::Density,
        extract: school_quality,
    },
    SubMetric {
        key: "kg_g12",
        category: MetricCategory::Education,
        label: "KG-G12 School Proximity",
        description: "Access to primary and secondary schools",
        scale: MetricScale::Percentage,
        extract: kg_g12,
    },
    SubMetric {
        key: "nursery",
        category: MetricCategory::Education,
        label: "Nursery Proximity",
        description: "Access to nursery schools",
        scale: MetricScale::Percentage,
        extract: nursery,
    },
    SubMetric {
        key: "university",
        category: MetricCategory::Education,
        label: "University Proximity",
        description: "Access to higher education",
        scale: MetricScale::Percentage,
        extract: university,
    },
    // ── Living ──────────────────────────────────────────────────────
    SubMetric {
        key: "dining",
        category: MetricCategory::Living,
        label: "Dining",
        description: "Restaurant and cafe density",
        scale: MetricScale::Percentage,
        extract: dining,
    },
    SubMetric {
        key: "shopping",
        category: MetricCategory::Living,
        label: "Shopping and Grocery",
        description: "Shopping and grocery accessibility",
        scale: MetricScale::Percentage,
        extract: shopping,
    },
    SubMetric {
        key: "healthcare",
        category: MetricCategory::Living,
        label: "Healthcare",
        description: "Healthcare facility access",
        scale: MetricScale::Percentage,
        extract: healthcare,
    },
    SubMetric {
        key: "walkability",
        category: MetricCategory::Living,
        label: "Walkability",
        description: "Walkability",
        scale: MetricScale::Percentage,
        extract: walkability,
    },
    // ── Access ──────────────────────────────────────────────────────
    SubMetric {
        key: "metro_proximity",
        category: MetricCategory::Access,
        label: "Metro Proximity",
        description: "Proximity to metro station",
        scale: MetricScale::Percentage,
        extract: metro_proximity,
    },
    SubMetric {
        key: "bus_connectivity",
        category: MetricCategory::Access,
        label: "Bus stop density",
        description: "Score based on number of bus stops per km squared",
        scale: MetricScale::Percentage,
        extract: bus_connectivity,
    },
    SubMetric {
        key: "road_access",
        category: MetricCategory::Access,
        label: "Road Access",
        description: "Score based on distance to major roads and access density",
        scale: MetricScale::Percentage,
        extract: road_access,
    },
    SubMetric {
        key: "car_independence",
        category: MetricCategory::Access,
        label: "Car Ownership Proxy",
        description: "Ratio of car dependent places of interest to the total number of places of interest",
        scale: MetricScale::Percentage,
        extract: car_independence,
    },
    SubMetric {
        key: "commute_efficiency",
        category: MetricCategory::Access,
        label: "Commute time to Business Hubs",
        description: "Score based on average car/public transportation commute times to key areas",
        scale: MetricScale::Percentage,
        extract: commute_efficiency,
    },
    SubMetric {
        key: "bike_walk_infrastructure",
        category: MetricCategory::Access,
        label: "Walk, Drive, Bike Infrastructure Mix",
        description: "Score based on the proportion of road types and pathways",
        scale: MetricScale::Percentage,
        extract: bike_walk_infrastructure,
    },
];

// ── Payload accessors ───────────────────────────────────────────────

const fn education(payload: &SourcePayload) -> Option<&EducationComponents> {
    match payload {
        SourcePayload::Education(p) => Some(&p.education_analysis.components),
        _ => None,
    }
}

const fn living(payload: &SourcePayload) -> Option<&LivingComponents> {
    match payload {
        SourcePayload::Living(p) => Some(&p.living_quality.components),
        _ => None,
    }
}

const fn access(payload: &SourcePayload) -> Option<&AccessComponents> {
    match payload {
        SourcePayload::Access(p) => Some(&p.data.components),
        _ => None,
    }
}

fn score(component: Option<&Component>) -> Option<f64> {
    component.and_then(|c| c.score)
}

fn school_density(p: &SourcePayload) -> Option<f64> {
    education(p)?.school_density.as_ref()?.schools_per_km2
}

fn school_quality(p: &SourcePayload) -> Option<f64> {
    score(education(p)?.school_quality.as_ref())
}

fn kg_g12(p: &SourcePayload) -> Option<f64> {
    score(education(p)?.proximity_analysis.as_ref()?.kg_g12_schools.as_ref())
}

fn nursery(p: &SourcePayload) -> Option<f64> {
    score(education(p)?.proximity_analysis.as_ref()?.nursery_schools.as_ref())
}

fn university(p: &SourcePayload) -> Option<f64> {
    score(education(p)?.proximity_analysis.as_ref()?.universities.as_ref())
}

fn dining(p: &SourcePayload) -> Option<f64> {
    score(living(p)?.dining_entertainment.as_ref())
}

fn shopping(p: &SourcePayload) -> Option<f64> {
    score(living(p)?.shopping_groceries.as_ref())
}

fn healthcare(p: &SourcePayload) -> Option<f64> {
    score(living(p)?.healthcare_access.as_ref())
}

fn walkability(p: &SourcePayload) -> Option<f64> {
    score(living(p)?.walkability.as_ref())
}

fn metro_proximity(p: &SourcePayload) -> Option<f64> {
    score(access(p)?.metro_proximity.as_ref())
}

fn bus_connectivity(p: &SourcePayload) -> Option<f64> {
    score(access(p)?.bus_connectivity.as_ref())
}

fn road_access(p: &SourcePayload) -> Option<f64> {
    score(access(p)?.road_access.as_ref())
}

fn car_independence(p: &SourcePayload) -> Option<f64> {
    score(access(p)?.car_independence.as_ref())
}

fn commute_efficiency(p: &SourcePayload) -> Option<f64> {
    score(access(p)?.commute_efficiency.as_ref())
}

fn bike_walk_infrastructure(p: &SourcePayload) -> Option<f64> {
    score(access(p)?.bike_walk_infrastructure.as_ref())
}

// ── Normalizer ──────────────────────────────────────────────────────

/// Converts validated payloads into records and map features.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricNormalizer {
    policy: AbsentMetricPolicy,
}

impl MetricNormalizer {
    /// Creates a normalizer that handles missing sub-metrics per `policy`.
    #[must_use]
    pub const fn new(policy: AbsentMetricPolicy) -> Self {
        Self { policy }
    }

    /// The configured absent-sub-metric policy.
    #[must_use]
    pub const fn policy(&self) -> AbsentMetricPolicy {
        self.policy
    }

    /// Emits one record per recognized sub-metric of the payload's category.
    ///
    /// Records come out in [`SUB_METRICS`] order. A sub-metric missing from
    /// the payload is dropped or zeroed according to the policy.
    #[must_use]
    pub fn normalize(&self, payload: &SourcePayload) -> Vec<MetricRecord> {
        let category = payload.category();

        SUB_METRICS
            .iter()
            .filter(|def| def.category == category)
            .filter_map(|def| {
                let score = match (def.raw_score(payload), self.policy) {
                    (Some(score), _) => score,
                    (None, AbsentMetricPolicy::ZeroIfAbsent) => 0.0,
                    (None, AbsentMetricPolicy::OmitIfAbsent) => {
                        log::trace!("{category}: '{}' absent, omitting", def.key);
                        return None;
                    }
                };
                Some(MetricRecord {
                    key: def.key.to_string(),
                    category,
                    label: def.label.to_string(),
                    score,
                    description: def.description.to_string(),
                    normalized_value: def.scale.normalize(score),
                })
            })
            .collect()
    }

    /// Extracts the payload's points of interest.
    ///
    /// Groups with an unrecognized tag are skipped. Features without a
    /// backend id get one derived from tag, name, and position.
    #[must_use]
    pub fn features(&self, payload: &SourcePayload) -> Vec<MapFeature> {
        let mut features = Vec::new();

        for (tag_name, raw_features) in payload.features() {
            let Ok(tag) = FeatureTag::from_str(tag_name) else {
                log::debug!(
                    "{}: skipping {} features with unknown tag '{tag_name}'",
                    payload.category(),
                    raw_features.len()
                );
                continue;
            };
            features.extend(raw_features.iter().map(|raw| to_map_feature(tag, raw)));
        }

        features
    }

    /// Builds the query's result from every successfully fetched payload.
    ///
    /// Records are ordered by category, then by [`SUB_METRICS`] order.
    /// Features with a repeated id keep their first occurrence.
    #[must_use]
    pub fn build_result(
        &self,
        query_id: QueryId,
        coordinates: Coordinates,
        fetched: &FetchedPayloads,
    ) -> AggregateResult {
        let mut payloads: Vec<&SourcePayload> = fetched.payloads.iter().collect();
        payloads.sort_by_key(|p| p.category());

        let records = payloads.iter().flat_map(|p| self.normalize(p)).collect();

        let mut seen = BTreeSet::new();
        let features = payloads
            .iter()
            .flat_map(|p| self.features(p))
            .filter(|f| seen.insert(f.id.clone()))
            .collect();

        AggregateResult {
            query_id,
            coordinates,
            records,
            features,
            partial_failures: fetched.partial_failures(),
        }
    }
}

fn to_map_feature(tag: FeatureTag, raw: &RawFeature) -> MapFeature {
    let id = raw.id.clone().unwrap_or_else(|| {
        format!("{tag}:{}@{:.5},{:.5}", raw.name, raw.lat, raw.lng)
    });
    MapFeature {
        id,
        tag,
        coordinates: Coordinates::new(raw.lat, raw.lng),
        label: raw.name.clone(),
        address: raw.address.clone(),
        rating: raw.rating,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::fixtures::{access_payload, education_payload, full_living_payload, living_payload};

    #[test]
    fn sub_metric_keys_are_unique() {
        let mut keys: Vec<&str> = SUB_METRICS.iter().map(|d| d.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), SUB_METRICS.len());
    }

    #[test]
    fn dining_score_becomes_living_record() {
        let payload = living_payload(json!({ "dining_entertainment": { "score": 72 } }));
        let records = MetricNormalizer::default().normalize(&payload);

        assert_eq!(records.len(), 1);
        let dining = &records[0];
        assert_eq!(dining.key, "dining");
        assert_eq!(dining.category, MetricCategory::Living);
        assert!((dining.score - 72.0).abs() < f64::EPSILON);
        assert!((dining.normalized_value - 72.0).abs() < f64::EPSILON);
    }

    #[test]
    fn full_payload_yields_one_record_per_sub_metric_in_order() {
        let records = MetricNormalizer::default().normalize(&full_living_payload());
        let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["dining", "shopping", "healthcare", "walkability"]);
    }

    #[test]
    fn full_education_payload_uses_both_scales() {
        let payload = education_payload(json!({
            "school_density": { "schools_per_km2": 8.47 },
            "school_quality": { "score": 6.12 },
            "proximity_analysis": {
                "kg_g12_schools": { "score": 73.2 },
                "nursery_schools": { "score": 55.5 },
                "universities": { "score": 12.49 }
            }
        }));
        let records = MetricNormalizer::default().normalize(&payload);
        let values: Vec<(&str, f64)> = records
            .iter()
            .map(|r| (r.key.as_str(), r.normalized_value))
            .collect();

        assert_eq!(
            values,
            [
                ("school_density", 8.5),
                ("school_quality", 6.1),
                ("kg_g12", 73.0),
                ("nursery", 56.0),
                ("university", 12.0),
            ]
        );
    }

    #[test]
    fn full_access_payload_yields_every_sub_metric_in_order() {
        let payload = access_payload(json!({
            "metro_proximity": { "score": 88.4 },
            "bus_connectivity": { "score": 41.6 },
            "road_access": { "score": 73 },
            "car_independence": { "score": 12.2 },
            "commute_efficiency": { "score": 99.9 },
            "bike_walk_infrastructure": { "score": 64.51 }
        }));
        let records = MetricNormalizer::default().normalize(&payload);

        assert!(records.iter().all(|r| r.category == MetricCategory::Access));
        let values: Vec<(&str, f64)> = records
            .iter()
            .map(|r| (r.key.as_str(), r.normalized_value))
            .collect();
        assert_eq!(
            values,
            [
                ("metro_proximity", 88.0),
                ("bus_connectivity", 42.0),
                ("road_access", 73.0),
                ("car_independence", 12.0),
                ("commute_efficiency", 100.0),
                ("bike_walk_infrastructure", 65.0),
            ]
        );
    }

    #[test]
    fn absent_sub_metrics_are_omitted_by_default() {
        let payload = access_payload(json!({
            "metro_proximity": { "score": 88.0 },
            "road_access": {}
        }));
        let records = MetricNormalizer::default().normalize(&payload);
        let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["metro_proximity"]);
    }

    #[test]
    fn zero_policy_fills_absent_sub_metrics() {
        let payload = access_payload(json!({ "metro_proximity": { "score": 88.0 } }));
        let records =
            MetricNormalizer::new(AbsentMetricPolicy::ZeroIfAbsent).normalize(&payload);

        assert_eq!(records.len(), 6);
        let road = records.iter().find(|r| r.key == "road_access").unwrap();
        assert!(road.score.abs() < f64::EPSILON);
        assert!(road.normalized_value.abs() < f64::EPSILON);
    }

    #[test]
    fn features_are_tagged_and_given_ids() {
        let payload = crate::fixtures::with_features(
            living_payload(json!({})),
            json!({
                "healthcare": [
                    { "id": "clinic-1", "name": "Mediclinic", "lat": 25.19, "lng": 55.27, "rating": 4.5 },
                    { "name": "Aster Pharmacy", "lat": 25.2, "lng": 55.28 }
                ],
                "nightlife": [{ "name": "Club", "lat": 25.0, "lng": 55.0 }]
            }),
        );
        let features = MetricNormalizer::default().features(&payload);

        assert_eq!(features.len(), 2);
        assert_eq!(features[0].id, "clinic-1");
        assert_eq!(features[0].tag, FeatureTag::Healthcare);
        assert_eq!(features[0].rating, Some(4.5));
        assert_eq!(features[1].id, "healthcare:Aster Pharmacy@25.20000,55.28000");
    }

    #[test]
    fn build_result_orders_by_category_and_tracks_failures() {
        use location_insight_source::SourceError;

        let fetched = FetchedPayloads {
            payloads: vec![
                living_payload(json!({ "walkability": { "score": 64 } })),
                education_payload(json!({ "school_quality": { "score": 7.0 } })),
            ],
            failures: vec![(
                MetricCategory::Access,
                SourceError::Unavailable {
                    category: MetricCategory::Access,
                    status: 503,
                },
            )],
        };

        let result = MetricNormalizer::default().build_result(
            QueryId::default(),
            Coordinates::new(25.0657, 55.1713),
            &fetched,
        );

        let keys: Vec<&str> = result.records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["school_quality", "walkability"]);
        assert_eq!(
            result.partial_failures,
            BTreeSet::from([MetricCategory::Access])
        );
    }

    #[test]
    fn build_result_drops_duplicate_feature_ids() {
        let feature = json!({
            "schools": [{ "id": "s-1", "name": "GEMS", "lat": 25.1, "lng": 55.2 }]
        });
        let fetched = FetchedPayloads {
            payloads: vec![
                crate::fixtures::with_features(education_payload(json!({})), feature.clone()),
                crate::fixtures::with_features(living_payload(json!({})), feature),
            ],
            failures: Vec::new(),
        };

        let result = MetricNormalizer::default().build_result(
            QueryId::default(),
            Coordinates::new(25.0, 55.0),
            &fetched,
        );
        assert_eq!(result.features.len(), 1);
    }
}
