//! Embedder callbacks.

use std::fmt;

use location_insight_metrics_models::AggregateResult;
use location_insight_widget_models::PipelineError;

type LocationChangeFn = dyn Fn(&str, &AggregateResult) + Send + Sync;
type ErrorFn = dyn Fn(&PipelineError) + Send + Sync;

/// Callbacks fired when the current query settles.
///
/// Neither callback is invoked for a query that was superseded before its
/// hooks run. A submission that starts while a callback is already running
/// does not interrupt it.
#[derive(Default)]
pub struct WidgetHooks {
    on_location_change: Option<Box<LocationChangeFn>>,
    on_error: Option<Box<ErrorFn>>,
}

impl WidgetHooks {
    /// Hooks with no callbacks installed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the location text and its result on every `ready`
    /// transition.
    #[must_use]
    pub fn on_location_change(
        mut self,
        f: impl Fn(&str, &AggregateResult) + Send + Sync + 'static,
    ) -> Self {
        self.on_location_change = Some(Box::new(f));
        self
    }

    /// Called on every `error` transition.
    #[must_use]
    pub fn on_error(mut self, f: impl Fn(&PipelineError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub(crate) fn location_changed(&self, location: &str, result: &AggregateResult) {
        if let Some(f) = &self.on_location_change {
            f(location, result);
        }
    }

    pub(crate) fn failed(&self, error: &PipelineError) {
        if let Some(f) = &self.on_error {
            f(error);
        }
    }
}

impl fmt::Debug for WidgetHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetHooks")
            .field("on_location_change", &self.on_location_change.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
