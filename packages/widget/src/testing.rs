//! Scripted geocoder with controllable latency, plus the payloads the
//! widget tests share.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use location_insight_geocoder::{GeocodeError, Geocoder, validate_query};
use location_insight_metrics::MetricAggregator;
use location_insight_metrics::fixtures::{
    access_payload, education_payload, living_payload, with_features,
};
use location_insight_metrics_models::Coordinates;
use location_insight_source_models::SourcePayload;
use serde_json::json;

pub use location_insight_metrics::fixtures::ScriptedSource;

pub const DOWNTOWN_DUBAI: Coordinates = Coordinates::new(25.0657, 55.1713);
pub const DUBAI_MARINA: Coordinates = Coordinates::new(25.0805, 55.1403);

/// Resolves a fixed list of places, each after its own delay.
pub struct ScriptedGeocoder {
    places: Vec<(&'static str, u64, Coordinates)>,
    miss_delay_ms: u64,
    calls: AtomicUsize,
}

impl ScriptedGeocoder {
    pub fn new(places: &[(&'static str, u64, Coordinates)]) -> Self {
        Self {
            places: places.to_vec(),
            miss_delay_ms: 10,
            calls: AtomicUsize::new(0),
        }
    }

    pub const fn with_miss_delay(mut self, ms: u64) -> Self {
        self.miss_delay_ms = ms;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for ScriptedGeocoder {
    async fn resolve(&self, location_text: &str) -> Result<Coordinates, GeocodeError> {
        let location = validate_query(location_text)?;
        self.calls.fetch_add(1, Ordering::SeqCst);

        let place = self.places.iter().find(|(name, ..)| *name == location);
        if let Some((_, delay_ms, coordinates)) = place {
            tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
            Ok(*coordinates)
        } else {
            tokio::time::sleep(Duration::from_millis(self.miss_delay_ms)).await;
            Err(GeocodeError::Failed {
                reason: "ZERO_RESULTS".to_string(),
            })
        }
    }
}

pub fn education() -> SourcePayload {
    with_features(
        education_payload(json!({
            "school_density": { "schools_per_km2": 8.47 },
            "school_quality": { "score": 7.2 }
        })),
        json!({
            "schools": [
                { "id": "s1", "name": "Dubai International Academy", "lat": 25.07, "lng": 55.17 }
            ]
        }),
    )
}

pub fn living() -> SourcePayload {
    living_payload(json!({ "dining_entertainment": { "score": 72 } }))
}

pub fn access() -> SourcePayload {
    access_payload(json!({ "metro_proximity": { "score": 88.4 } }))
}

/// All three backends answering successfully after 10 ms.
pub fn healthy_aggregator() -> MetricAggregator {
    MetricAggregator::new(vec![
        ScriptedSource::ok(education()).boxed(),
        ScriptedSource::ok(living()).boxed(),
        ScriptedSource::ok(access()).boxed(),
    ])
}
