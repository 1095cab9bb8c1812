//! Annotation set reconciliation.
//!
//! The desired annotations are the current features whose tag is in the
//! [`FilterSet`]. Every filter toggle or data refresh diffs that set against
//! the live annotations by feature id: stale ones are destroyed, missing ones
//! created, and the rest left alone.

use std::collections::{BTreeMap, BTreeSet};

use location_insight_metrics_models::{AggregateResult, FeatureTag, MapFeature, QueryId};
use location_insight_widget_models::{QueryState, WidgetSnapshot};

use crate::{Annotation, AnnotationHandle, FilterSet, MapProvider, MarkerError};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The live set now matches the desired set (except for annotations
    /// the provider rejected).
    Applied {
        created: usize,
        released: usize,
    },
    /// The provider was not ready; the pass resumes on
    /// [`FilterableMarkerManager::on_provider_ready`].
    Deferred,
}

/// Keeps a map's annotations in line with the active filters and the latest
/// query result.
pub struct FilterableMarkerManager<P: MapProvider> {
    provider: P,
    filters: FilterSet,
    features: Vec<MapFeature>,
    markers: BTreeMap<String, Box<dyn AnnotationHandle>>,
    applied_query: Option<QueryId>,
    deferred: bool,
}

impl<P: MapProvider> std::fmt::Debug for FilterableMarkerManager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterableMarkerManager")
            .field("filters", &self.filters)
            .field("features", &self.features.len())
            .field("markers", &self.markers.keys().collect::<Vec<_>>())
            .field("deferred", &self.deferred)
            .finish_non_exhaustive()
    }
}

impl<P: MapProvider> FilterableMarkerManager<P> {
    /// Starts with no features and no live annotations.
    #[must_use]
    pub const fn new(provider: P, filters: FilterSet) -> Self {
        Self {
            provider,
            filters,
            features: Vec::new(),
            markers: BTreeMap::new(),
            applied_query: None,
            deferred: false,
        }
    }

    /// The active filter set.
    #[must_use]
    pub const fn filters(&self) -> &FilterSet {
        &self.filters
    }

    #[must_use]
    pub fn features(&self) -> &[MapFeature] {
        &self.features
    }

    /// Feature ids that currently have a live annotation.
    #[must_use]
    pub fn marker_ids(&self) -> BTreeSet<&str> {
        self.markers.keys().map(String::as_str).collect()
    }

    /// Whether a reconciliation is waiting for the provider.
    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// The map provider annotations are placed on.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    pub const fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Flips `tag` in the filter set and reconciles.
    pub fn on_filter_toggle(&mut self, tag: FeatureTag) -> Reconciliation {
        let active = self.filters.toggle(tag);
        log::debug!("Filter '{tag}' {}", if active { "on" } else { "off" });
        self.reconcile()
    }

    /// Replaces the feature list with `result`'s and reconciles.
    pub fn on_data_refresh(&mut self, result: &AggregateResult) -> Reconciliation {
        self.applied_query = Some(result.query_id);
        self.features.clone_from(&result.features);
        self.reconcile()
    }

    /// Applies a published snapshot.
    ///
    /// A snapshot carrying a result not yet applied triggers a refresh. An
    /// error or idle snapshot for a newer query clears the map. Loading
    /// snapshots keep the previous annotations until the next result lands.
    pub fn on_snapshot(&mut self, snapshot: &WidgetSnapshot) -> Option<Reconciliation> {
        if let Some(result) = &snapshot.data {
            if self.applied_query == Some(result.query_id) {
                return None;
            }
            return Some(self.on_data_refresh(result));
        }

        match snapshot.state {
            QueryState::Error | QueryState::Idle
                if self.applied_query != Some(snapshot.query_id) =>
            {
                log::debug!("Clearing annotations for {}", snapshot.query_id);
                self.applied_query = Some(snapshot.query_id);
                self.features.clear();
                Some(self.reconcile())
            }
            _ => None,
        }
    }

    /// Resumes a deferred reconciliation once the provider has initialized.
    pub fn on_provider_ready(&mut self) -> Reconciliation {
        if !self.deferred {
            return Reconciliation::Applied {
                created: 0,
                released: 0,
            };
        }
        log::debug!("Map provider ready, resuming reconciliation");
        self.reconcile()
    }

    /// Destroys every live annotation. Filters are kept.
    pub fn teardown(&mut self) {
        let count = self.markers.len();
        for (_, handle) in std::mem::take(&mut self.markers) {
            handle.destroy();
        }
        self.features.clear();
        self.applied_query = None;
        self.deferred = false;
        log::debug!("Tore down {count} annotations");
    }

    fn reconcile(&mut self) -> Reconciliation {
        if !self.provider.is_ready() {
            log::debug!("Map provider not ready, deferring reconciliation");
            self.deferred = true;
            return Reconciliation::Deferred;
        }

        let desired: BTreeMap<&str, &MapFeature> = self
            .features
            .iter()
            .filter(|f| self.filters.contains(f.tag))
            .map(|f| (f.id.as_str(), f))
            .collect();

        let stale: Vec<String> = self
            .markers
            .keys()
            .filter(|id| !desired.contains_key(id.as_str()))
            .cloned()
            .collect();
        let released = stale.len();
        for id in stale {
            if let Some(handle) = self.markers.remove(&id) {
                handle.destroy();
            }
        }

        let mut created = 0;
        for (id, feature) in desired {
            if self.markers.contains_key(id) {
                continue;
            }
            match self.provider.add_annotation(&Annotation::from(feature)) {
                Ok(handle) => {
                    self.markers.insert(id.to_string(), handle);
                    created += 1;
                }
                Err(MarkerError::MapProviderUnavailable) => {
                    log::debug!(
                        "Map provider became unavailable after {created} annotations, deferring"
                    );
                    self.deferred = true;
                    return Reconciliation::Deferred;
                }
                Err(e) => log::warn!("Skipping annotation {id}: {e}"),
            }
        }

        self.deferred = false;
        log::debug!(
            "Reconciled annotations: {created} created, {released} released, {} live",
            self.markers.len()
        );
        Reconciliation::Applied { created, released }
    }
}

impl<P: MapProvider> Drop for FilterableMarkerManager<P> {
    fn drop(&mut self) {
        if !self.markers.is_empty() {
            self.teardown();
        }
    }
}
