#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the location insight toolchain.
//!
//! [`init_logger`] sets up `indicatif-log-bridge` so that `log::info!` and
//! friends are suspended while the [`PipelineStatus`] spinner redraws.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use location_insight_widget_models::{QueryState, WidgetSnapshot};

pub use indicatif::MultiProgress;

/// A spinner that follows one query through the pipeline.
pub struct PipelineStatus {
    bar: ProgressBar,
}

impl PipelineStatus {
    /// Adds a spinner to `multi`.
    #[must_use]
    pub fn spinner(multi: &MultiProgress) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self { bar }
    }

    /// Reflects `snapshot` in the spinner. Returns `true` once the query
    /// has settled and the spinner is gone.
    pub fn update(&self, snapshot: &WidgetSnapshot) -> bool {
        if let Some(message) = status_message(snapshot) {
            self.bar.set_message(message);
            false
        } else {
            self.bar.finish_and_clear();
            true
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Spinner text for an in-flight snapshot, or `None` once it has settled.
#[must_use]
pub fn status_message(snapshot: &WidgetSnapshot) -> Option<String> {
    let location = snapshot.location().unwrap_or_default();
    match snapshot.state {
        QueryState::Resolving => Some(format!("Finding '{location}'...")),
        QueryState::Aggregating => {
            let coordinates = snapshot
                .query
                .as_ref()
                .and_then(|q| q.coordinates)
                .map(|c| format!(" ({c})"))
                .unwrap_or_default();
            Some(format!("Scoring '{location}'{coordinates}..."))
        }
        QueryState::Idle | QueryState::Ready | QueryState::Error => None,
    }
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while progress bars redraw.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // Already set when called twice (e.g. in tests).
    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}
