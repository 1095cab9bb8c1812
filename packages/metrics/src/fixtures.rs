//! Payload builders and a scripted backend for tests.
//!
//! Available to other crates' tests through the `test-utils` feature.

#![allow(clippy::missing_panics_doc, clippy::must_use_candidate)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use location_insight_metrics_models::{Coordinates, MetricCategory};
use location_insight_source::{MetricSourceClient, SourceError};
use location_insight_source_models::SourcePayload;
use serde_json::{Value, json};

pub fn education_payload(components: Value) -> SourcePayload {
    SourcePayload::Education(
        serde_json::from_value(json!({
            "success": true,
            "education_analysis": { "components": components }
        }))
        .unwrap(),
    )
}

pub fn living_payload(components: Value) -> SourcePayload {
    SourcePayload::Living(
        serde_json::from_value(json!({
            "success": true,
            "living_quality": { "components": components }
        }))
        .unwrap(),
    )
}

pub fn full_living_payload() -> SourcePayload {
    living_payload(json!({
        "dining_entertainment": { "score": 72 },
        "shopping_groceries": { "score": 61.4 },
        "healthcare_access": { "score": 80.6 },
        "walkability": { "score": 55 }
    }))
}

pub fn access_payload(components: Value) -> SourcePayload {
    SourcePayload::Access(
        serde_json::from_value(json!({
            "success": true,
            "data": { "components": components }
        }))
        .unwrap(),
    )
}

pub fn with_features(payload: SourcePayload, features: Value) -> SourcePayload {
    let features = serde_json::from_value(features).unwrap();
    match payload {
        SourcePayload::Education(mut p) => {
            p.features = features;
            SourcePayload::Education(p)
        }
        SourcePayload::Living(mut p) => {
            p.features = features;
            SourcePayload::Living(p)
        }
        SourcePayload::Access(mut p) => {
            p.features = features;
            SourcePayload::Access(p)
        }
    }
}

type DelayFn = dyn Fn(Coordinates) -> u64 + Send + Sync;

/// A backend with a fixed outcome whose latency can depend on where it is
/// asked about. Answers after 10 ms unless told otherwise.
pub struct ScriptedSource {
    category: MetricCategory,
    /// `None` answers with HTTP 503.
    payload: Option<SourcePayload>,
    delay_ms: Box<DelayFn>,
}

impl ScriptedSource {
    pub fn ok(payload: SourcePayload) -> Self {
        Self {
            category: payload.category(),
            payload: Some(payload),
            delay_ms: Box::new(|_| 10),
        }
    }

    pub fn failing(category: MetricCategory) -> Self {
        Self {
            category,
            payload: None,
            delay_ms: Box::new(|_| 10),
        }
    }

    /// Answers after `delay_ms` wherever it is asked about.
    #[must_use]
    pub fn after(self, delay_ms: u64) -> Self {
        self.with_delay(move |_| delay_ms)
    }

    #[must_use]
    pub fn with_delay(mut self, delay_ms: impl Fn(Coordinates) -> u64 + Send + Sync + 'static) -> Self {
        self.delay_ms = Box::new(delay_ms);
        self
    }

    pub fn boxed(self) -> Arc<dyn MetricSourceClient> {
        Arc::new(self)
    }
}

#[async_trait]
impl MetricSourceClient for ScriptedSource {
    fn category(&self) -> MetricCategory {
        self.category
    }

    async fn fetch(&self, coordinates: Coordinates) -> Result<SourcePayload, SourceError> {
        tokio::time::sleep(Duration::from_millis((self.delay_ms)(coordinates))).await;
        self.payload.clone().ok_or(SourceError::Unavailable {
            category: self.category,
            status: 503,
        })
    }
}
