//! Concurrent fan-out to every metric backend.
//!
//! All fetches start together and the aggregation completes only after
//! every one of them has settled, so the total latency is that of the
//! slowest backend rather than the sum.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use location_insight_metrics_models::{Coordinates, MetricCategory};
use location_insight_source::{MetricSourceClient, SourceError};
use location_insight_source_models::SourcePayload;

/// Errors that fail an aggregation as a whole.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// Every backend failed; each failure is kept for reporting.
    #[error("All {} metric sources failed", failures.len())]
    AllSourcesFailed {
        /// Per-backend failures, in backend order.
        failures: Vec<(MetricCategory, SourceError)>,
    },
}

/// Payloads gathered by one aggregation.
#[derive(Debug, Default)]
pub struct FetchedPayloads {
    /// Validated payloads from the backends that answered.
    pub payloads: Vec<SourcePayload>,
    /// Backends that failed, with their errors.
    pub failures: Vec<(MetricCategory, SourceError)>,
}

impl FetchedPayloads {
    /// Categories whose backend failed.
    #[must_use]
    pub fn partial_failures(&self) -> BTreeSet<MetricCategory> {
        self.failures.iter().map(|(category, _)| *category).collect()
    }
}

/// Fans a query out to every configured backend.
#[derive(Clone)]
pub struct MetricAggregator {
    sources: Vec<Arc<dyn MetricSourceClient>>,
    deadline: Option<Duration>,
}

impl std::fmt::Debug for MetricAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let categories: Vec<MetricCategory> = self.sources.iter().map(|s| s.category()).collect();
        f.debug_struct("MetricAggregator")
            .field("sources", &categories)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl MetricAggregator {
    /// Creates an aggregator over `sources` with no per-backend deadline.
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn MetricSourceClient>>) -> Self {
        Self {
            sources,
            deadline: None,
        }
    }

    /// Fails any backend that has not answered within `deadline` with
    /// [`SourceError::Timeout`].
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Categories covered by the configured backends, in backend order.
    #[must_use]
    pub fn categories(&self) -> Vec<MetricCategory> {
        self.sources.iter().map(|s| s.category()).collect()
    }

    /// Fetches from every backend concurrently.
    ///
    /// Succeeds if at least one backend answered; failed backends are
    /// recorded in [`FetchedPayloads::failures`].
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::AllSourcesFailed`] if no backend produced
    /// a payload.
    pub async fn aggregate(
        &self,
        coordinates: Coordinates,
    ) -> Result<FetchedPayloads, AggregateError> {
        let fetches = self.sources.iter().map(|source| async move {
            let category = source.category();
            let result = match self.deadline {
                Some(deadline) => tokio::time::timeout(deadline, source.fetch(coordinates))
                    .await
                    .unwrap_or(Err(SourceError::Timeout { category })),
                None => source.fetch(coordinates).await,
            };
            (category, result)
        });

        let mut fetched = FetchedPayloads::default();
        for (category, result) in join_all(fetches).await {
            match result {
                Ok(payload) => fetched.payloads.push(payload),
                Err(e) => {
                    log::warn!("{category} source failed: {e}");
                    fetched.failures.push((category, e));
                }
            }
        }

        if fetched.payloads.is_empty() {
            return Err(AggregateError::AllSourcesFailed {
                failures: fetched.failures,
            });
        }

        log::debug!(
            "Aggregated {} of {} sources for {coordinates}",
            fetched.payloads.len(),
            self.sources.len()
        );

        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::time::Instant;

    use super::*;
    use crate::fixtures::{
        ScriptedSource, access_payload, education_payload, full_living_payload,
    };

    fn here() -> Coordinates {
        Coordinates::new(25.0657, 55.1713)
    }

    #[tokio::test(start_paused = true)]
    async fn latency_is_the_slowest_source_not_the_sum() {
        let aggregator = MetricAggregator::new(vec![
            ScriptedSource::ok(education_payload(json!({}))).after(300).boxed(),
            ScriptedSource::ok(full_living_payload()).after(100).boxed(),
            ScriptedSource::ok(access_payload(json!({}))).after(200).boxed(),
        ]);

        let start = Instant::now();
        let fetched = aggregator.aggregate(here()).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(fetched.payloads.len(), 3);
        assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(600), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn payloads_keep_source_order_regardless_of_completion() {
        let aggregator = MetricAggregator::new(vec![
            ScriptedSource::ok(education_payload(json!({}))).after(50).boxed(),
            ScriptedSource::ok(full_living_payload()).after(10).boxed(),
        ]);

        let fetched = aggregator.aggregate(here()).await.unwrap();
        let categories: Vec<MetricCategory> =
            fetched.payloads.iter().map(SourcePayload::category).collect();
        assert_eq!(
            categories,
            [MetricCategory::Education, MetricCategory::Living]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn one_failing_source_is_a_partial_failure() {
        let aggregator = MetricAggregator::new(vec![
            ScriptedSource::ok(education_payload(json!({}))).after(10).boxed(),
            ScriptedSource::ok(full_living_payload()).after(10).boxed(),
            ScriptedSource::failing(MetricCategory::Access).after(10).boxed(),
        ]);

        let fetched = aggregator.aggregate(here()).await.unwrap();
        assert_eq!(fetched.payloads.len(), 2);
        assert_eq!(
            fetched.partial_failures(),
            BTreeSet::from([MetricCategory::Access])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn all_failing_sources_fail_the_aggregation() {
        let aggregator = MetricAggregator::new(
            MetricCategory::ALL
                .iter()
                .map(|c| ScriptedSource::failing(*c).after(5).boxed())
                .collect(),
        );

        let err = aggregator.aggregate(here()).await.unwrap_err();
        let AggregateError::AllSourcesFailed { failures } = err;
        assert_eq!(failures.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out_without_holding_up_the_rest() {
        let aggregator = MetricAggregator::new(vec![
            ScriptedSource::ok(full_living_payload()).after(100).boxed(),
            ScriptedSource::ok(access_payload(json!({}))).after(60_000).boxed(),
        ])
        .with_deadline(Duration::from_secs(2));

        let start = Instant::now();
        let fetched = aggregator.aggregate(here()).await.unwrap();

        assert!(start.elapsed() < Duration::from_secs(3));
        assert_eq!(fetched.payloads.len(), 1);
        assert!(matches!(
            fetched.failures.as_slice(),
            [(
                MetricCategory::Access,
                SourceError::Timeout {
                    category: MetricCategory::Access
                }
            )]
        ));
    }

    #[tokio::test]
    async fn no_sources_is_total_failure() {
        let aggregator = MetricAggregator::new(Vec::new());
        assert!(aggregator.aggregate(here()).await.is_err());
    }
}
