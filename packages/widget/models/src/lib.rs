#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Widget configuration and the snapshot published to presentation layers.
//!
//! A [`WidgetSnapshot`] is the only thing a renderer ever reads. It is
//! replaced wholesale on every state transition, so a renderer never sees a
//! half-updated view.

pub mod config;

use chrono::{DateTime, Utc};
use location_insight_metrics_models::{AggregateResult, Coordinates, MetricCategory, QueryId};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use config::{ConfigError, Theme, WidgetConfig};

/// Pipeline state of the current query.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QueryState {
    /// No query, or the last submission was blank.
    #[default]
    Idle,
    /// Waiting on the geocoder.
    Resolving,
    /// Waiting on the metric backends.
    Aggregating,
    /// Results are available.
    Ready,
    /// The query failed.
    Error,
}

impl QueryState {
    /// Whether the current query still has work outstanding.
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Resolving | Self::Aggregating)
    }
}

/// One user submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub id: QueryId,
    /// Text as submitted, before trimming.
    pub raw_text: String,
    /// Set once the geocoder has answered.
    pub coordinates: Option<Coordinates>,
    pub created_at: DateTime<Utc>,
}

impl Query {
    #[must_use]
    pub fn new(id: QueryId, raw_text: impl Into<String>) -> Self {
        Self {
            id,
            raw_text: raw_text.into(),
            coordinates: None,
            created_at: Utc::now(),
        }
    }

    /// The submitted text with surrounding whitespace removed.
    #[must_use]
    pub fn location(&self) -> &str {
        self.raw_text.trim()
    }
}

/// Kinds of failure a presentation layer can be told about.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum PipelineErrorKind {
    /// The submitted location was blank.
    InvalidQuery,
    /// The geocoder found no match or could not be reached.
    GeocodeFailed,
    /// A backend answered with an error status or refused the request.
    SourceUnavailable,
    /// A backend missed its deadline.
    SourceTimeout,
    /// A backend's body did not match its schema.
    MalformedPayload,
    /// No backend produced a payload.
    AllSourcesFailed,
    /// The map engine was not ready for annotations.
    MapProviderUnavailable,
}

impl PipelineErrorKind {
    /// The single message shown to the user for this kind of failure.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::InvalidQuery => "Please enter a location to search.",
            Self::GeocodeFailed => "Could not find coordinates for this location.",
            Self::SourceUnavailable => "Location data is temporarily unavailable.",
            Self::SourceTimeout => "Location data took too long to load.",
            Self::MalformedPayload => "Location data could not be read.",
            Self::AllSourcesFailed => "Unable to load location data. Please try again.",
            Self::MapProviderUnavailable => "The map is still loading.",
        }
    }
}

/// A failure published in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineError {
    pub kind: PipelineErrorKind,
    /// Diagnostic detail for logs; not meant for end users.
    pub message: String,
    /// Category of the backend involved, when exactly one was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<MetricCategory>,
}

impl PipelineError {
    #[must_use]
    pub fn new(kind: PipelineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            category: None,
        }
    }

    #[must_use]
    pub const fn with_category(mut self, category: MetricCategory) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        self.kind.user_message()
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for PipelineError {}

/// Immutable view of the widget published after every transition.
///
/// `data` is only ever the result of the query identified by `query_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSnapshot {
    /// Id of the current query. Advances on every submission, including
    /// blank ones.
    pub query_id: QueryId,
    /// The current query, absent when idle.
    pub query: Option<Query>,
    pub state: QueryState,
    pub data: Option<AggregateResult>,
    pub error: Option<PipelineError>,
}

impl WidgetSnapshot {
    /// The location text of the current query.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.query.as_ref().map(Query::location)
    }

    /// Whether this snapshot describes the query identified by `id`.
    #[must_use]
    pub fn is_current(&self, id: QueryId) -> bool {
        self.query_id == id
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn every_error_kind_has_a_message() {
        for kind in [
            PipelineErrorKind::InvalidQuery,
            PipelineErrorKind::GeocodeFailed,
            PipelineErrorKind::SourceUnavailable,
            PipelineErrorKind::SourceTimeout,
            PipelineErrorKind::MalformedPayload,
            PipelineErrorKind::AllSourcesFailed,
            PipelineErrorKind::MapProviderUnavailable,
        ] {
            assert!(!kind.user_message().is_empty(), "{kind}");
        }
    }

    #[test]
    fn error_kind_serializes_camel_case() {
        let json = serde_json::to_string(&PipelineErrorKind::AllSourcesFailed).unwrap();
        assert_eq!(json, "\"allSourcesFailed\"");
        assert_eq!(PipelineErrorKind::GeocodeFailed.to_string(), "geocodeFailed");
    }

    #[test]
    fn query_location_is_trimmed() {
        let query = Query::new(QueryId::default().next(), "  Downtown Dubai ");
        assert_eq!(query.location(), "Downtown Dubai");
        assert!(query.coordinates.is_none());
    }

    #[test]
    fn loading_states() {
        assert!(QueryState::Resolving.is_loading());
        assert!(QueryState::Aggregating.is_loading());
        assert!(!QueryState::Ready.is_loading());
        assert!(!QueryState::Idle.is_loading());
    }

    #[test]
    fn default_snapshot_is_idle_and_empty() {
        let snapshot = WidgetSnapshot::default();
        assert_eq!(snapshot.state, QueryState::Idle);
        assert!(snapshot.location().is_none());
        assert!(snapshot.data.is_none());
        assert!(snapshot.is_current(QueryId::default()));
    }

    #[test]
    fn snapshot_serializes_for_hosts() {
        let id = QueryId::default().next();
        let snapshot = WidgetSnapshot {
            query_id: id,
            query: Some(Query::new(id, "Dubai Marina")),
            state: QueryState::Ready,
            data: Some(AggregateResult {
                query_id: id,
                coordinates: Coordinates::new(25.08, 55.14),
                records: Vec::new(),
                features: Vec::new(),
                partial_failures: BTreeSet::from([MetricCategory::Access]),
            }),
            error: None,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["state"], "ready");
        assert_eq!(value["query"]["rawText"], "Dubai Marina");
        assert_eq!(value["data"]["partialFailures"][0], "access");
    }
}
