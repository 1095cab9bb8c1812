//! Query pipeline controller.
//!
//! Sequences geocoding, aggregation, and normalization for each submitted
//! location and publishes a [`WidgetSnapshot`] after every transition.
//!
//! Every submission mints a new [`QueryId`] at the moment it is published.
//! In-flight work for older queries is not aborted; whatever it produces is
//! compared against the current id on arrival and dropped if it no longer
//! matches. Minting and the staleness check both happen under the snapshot
//! channel's lock, so a superseded result can never overwrite a newer one.

use std::sync::Arc;

use location_insight_geocoder::service_registry::service_by_id;
use location_insight_geocoder::{
    GeocodeError, Geocoder, default_geocoder, geocoder_for_service, validate_query,
};
use location_insight_metrics::{AggregateError, MetricAggregator, MetricNormalizer};
use location_insight_metrics_models::{AggregateResult, Coordinates, QueryId};
use location_insight_source::registry::http_sources;
use location_insight_source::{DEFAULT_API_BASE_URL, SourceError};
use location_insight_widget_models::{
    PipelineError, PipelineErrorKind, Query, QueryState, WidgetConfig, WidgetSnapshot,
};
use tokio::sync::watch;

use crate::WidgetError;
use crate::hooks::WidgetHooks;

/// Owns the current query and publishes its progress.
///
/// Cloning is cheap; clones share the same current query and snapshot.
#[derive(Clone)]
pub struct QueryController {
    geocoder: Arc<dyn Geocoder>,
    aggregator: MetricAggregator,
    normalizer: MetricNormalizer,
    state: Arc<watch::Sender<WidgetSnapshot>>,
    hooks: Arc<WidgetHooks>,
}

impl std::fmt::Debug for QueryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryController")
            .field("aggregator", &self.aggregator)
            .field("normalizer", &self.normalizer)
            .field("snapshot", &*self.state.borrow())
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl QueryController {
    /// Builds a controller from its pipeline stages. The initial snapshot
    /// is idle with no query.
    #[must_use]
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        aggregator: MetricAggregator,
        normalizer: MetricNormalizer,
    ) -> Self {
        let (state, _) = watch::channel(WidgetSnapshot::default());
        Self {
            geocoder,
            aggregator,
            normalizer,
            state: Arc::new(state),
            hooks: Arc::new(WidgetHooks::default()),
        }
    }

    /// Builds a controller wired to the configured geocoding service and
    /// HTTP metric backends.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError`] if the config is invalid, names an unknown
    /// geocoding service, or leaves none to choose from.
    pub fn from_config(config: &WidgetConfig, client: reqwest::Client) -> Result<Self, WidgetError> {
        config.validate()?;

        let geocoder = match &config.geocoding_service {
            Some(id) => {
                let service = service_by_id(id)
                    .ok_or_else(|| WidgetError::UnknownGeocodingService(id.clone()))?;
                log::debug!("Using geocoding service '{}' ({})", service.id, service.name);
                geocoder_for_service(client.clone(), &service, &config.api_key)
            }
            None => default_geocoder(client.clone(), &config.api_key)
                .ok_or(WidgetError::NoGeocoder)?,
        };
        let base_url = config
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL);
        let aggregator = MetricAggregator::new(http_sources(&client, base_url))
            .with_deadline(config.source_timeout());

        log::debug!(
            "Metric backends at {base_url}: {:?}, deadline {:?}",
            aggregator.categories(),
            config.source_timeout()
        );

        Ok(Self::new(
            Arc::from(geocoder),
            aggregator,
            MetricNormalizer::new(config.absent_metric_policy),
        ))
    }

    /// Installs embedder callbacks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: WidgetHooks) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// The latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> WidgetSnapshot {
        self.state.borrow().clone()
    }

    /// A receiver that observes every snapshot published from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WidgetSnapshot> {
        self.state.subscribe()
    }

    /// The current query, if one is active.
    #[must_use]
    pub fn current_query(&self) -> Option<Query> {
        self.state.borrow().query.clone()
    }

    /// Replaces the current location. Same as [`Self::submit`].
    pub async fn update_location(&self, location: &str) -> QueryId {
        self.submit(location).await
    }

    /// Runs the pipeline for `location_text` and returns the id it was
    /// given.
    ///
    /// Resolves once this query's pipeline has settled, whether or not its
    /// outcome was published. Blank input resets the widget to idle without
    /// touching the network.
    pub async fn submit(&self, location_text: &str) -> QueryId {
        let Ok(location) = validate_query(location_text) else {
            let id = self.begin(None);
            log::debug!("Query {id}: blank input, idle");
            return id;
        };

        let id = self.begin(Some(location_text));
        log::debug!("Query {id}: resolving '{location}'");

        let coordinates = match self.geocoder.resolve(location).await {
            Ok(coordinates) => coordinates,
            Err(e) => {
                self.fail(id, geocode_error(&e));
                return id;
            }
        };

        if !self.publish(id, |s| {
            s.state = QueryState::Aggregating;
            if let Some(query) = &mut s.query {
                query.coordinates = Some(coordinates);
            }
        }) {
            return id;
        }
        log::debug!("Query {id}: '{location}' resolved to {coordinates}, aggregating");

        match self.aggregator.aggregate(coordinates).await {
            Ok(fetched) => {
                let result = self.normalizer.build_result(id, coordinates, &fetched);
                self.complete(id, location, coordinates, result);
            }
            Err(e) => self.fail(id, aggregate_error(&e)),
        }

        id
    }

    /// Mints the next id and publishes the new query's first snapshot.
    fn begin(&self, location_text: Option<&str>) -> QueryId {
        let mut id = QueryId::default();
        self.state.send_modify(|s| {
            id = s.query_id.next();
            *s = WidgetSnapshot {
                query_id: id,
                query: location_text.map(|text| Query::new(id, text)),
                state: if location_text.is_some() {
                    QueryState::Resolving
                } else {
                    QueryState::Idle
                },
                data: None,
                error: None,
            };
        });
        id
    }

    /// Applies `update` only if `id` is still the current query.
    fn publish(&self, id: QueryId, update: impl FnOnce(&mut WidgetSnapshot)) -> bool {
        let current = self.state.send_if_modified(|s| {
            if !s.is_current(id) {
                return false;
            }
            update(s);
            true
        });
        if !current {
            log::debug!("Query {id}: superseded, dropping its outcome");
        }
        current
    }

    fn complete(
        &self,
        id: QueryId,
        location: &str,
        coordinates: Coordinates,
        result: AggregateResult,
    ) {
        let published = self.publish(id, |s| {
            s.state = QueryState::Ready;
            s.data = Some(result.clone());
            s.error = None;
        });
        if !published {
            return;
        }

        if result.partial_failures.is_empty() {
            log::info!(
                "Query {id}: '{location}' ({coordinates}) ready with {} records",
                result.records.len()
            );
        } else {
            log::info!(
                "Query {id}: '{location}' ({coordinates}) ready with {} records, missing {:?}",
                result.records.len(),
                result.partial_failures
            );
        }
        self.notify_if_current(id, |hooks| hooks.location_changed(location, &result));
    }

    fn fail(&self, id: QueryId, error: PipelineError) {
        let published = self.publish(id, |s| {
            s.state = QueryState::Error;
            s.data = None;
            s.error = Some(error.clone());
        });
        if published {
            log::warn!("Query {id}: {error}");
            self.notify_if_current(id, |hooks| hooks.failed(&error));
        }
    }

    /// Runs `notify` against the hooks unless `id` was superseded after its
    /// outcome was published.
    fn notify_if_current(&self, id: QueryId, notify: impl FnOnce(&WidgetHooks)) -> bool {
        if !self.state.borrow().is_current(id) {
            log::debug!("Query {id}: superseded before its hooks ran");
            return false;
        }
        notify(&self.hooks);
        true
    }
}

// ── Error mapping ───────────────────────────────────────────────────

fn geocode_error(e: &GeocodeError) -> PipelineError {
    let kind = match e {
        GeocodeError::InvalidQuery => PipelineErrorKind::InvalidQuery,
        GeocodeError::Failed { .. } | GeocodeError::Http(_) | GeocodeError::Parse { .. } => {
            PipelineErrorKind::GeocodeFailed
        }
    };
    PipelineError::new(kind, e.to_string())
}

fn aggregate_error(e: &AggregateError) -> PipelineError {
    let AggregateError::AllSourcesFailed { failures } = e;
    let detail = failures
        .iter()
        .map(|(category, err)| format!("{category}: {}", source_error_kind(err)))
        .collect::<Vec<_>>()
        .join(", ");
    let error = PipelineError::new(
        PipelineErrorKind::AllSourcesFailed,
        format!("{e} ({detail})"),
    );
    match failures.as_slice() {
        [(category, _)] => error.with_category(*category),
        _ => error,
    }
}

/// The error kind a single backend failure corresponds to.
#[must_use]
pub const fn source_error_kind(e: &SourceError) -> PipelineErrorKind {
    match e {
        SourceError::Timeout { .. } => PipelineErrorKind::SourceTimeout,
        SourceError::MalformedPayload { .. } => PipelineErrorKind::MalformedPayload,
        SourceError::Unavailable { .. } | SourceError::Rejected { .. } | SourceError::Http(_) => {
            PipelineErrorKind::SourceUnavailable
        }
    }
}
