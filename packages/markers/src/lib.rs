#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map annotations driven by the active feature filters.
//!
//! The map engine itself is an external collaborator behind [`MapProvider`]:
//! it receives a coordinate, a label, and a tag per annotation and hands
//! back an opaque [`AnnotationHandle`]. Everything about which annotations
//! should exist lives in [`FilterableMarkerManager`].

pub mod filter;
pub mod manager;

use location_insight_metrics_models::{Coordinates, FeatureTag, MapFeature};

pub use filter::FilterSet;
pub use manager::{FilterableMarkerManager, Reconciliation};

/// Errors reported by a [`MapProvider`].
#[derive(Debug, thiserror::Error)]
pub enum MarkerError {
    /// The provider has not finished initializing.
    #[error("Map provider is not initialized")]
    MapProviderUnavailable,

    /// The provider refused one annotation.
    #[error("Map provider rejected annotation '{label}': {message}")]
    Rejected {
        /// Label of the refused annotation.
        label: String,
        /// Provider's explanation.
        message: String,
    },
}

/// What the core hands to the map engine for each annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Where to place the annotation.
    pub coordinates: Coordinates,
    /// Text shown on or next to the annotation.
    pub label: String,
    /// Filter tag; providers may pick an icon from it.
    pub tag: FeatureTag,
}

impl From<&MapFeature> for Annotation {
    fn from(feature: &MapFeature) -> Self {
        Self {
            coordinates: feature.coordinates,
            label: feature.label.clone(),
            tag: feature.tag,
        }
    }
}

/// A live annotation on the map.
pub trait AnnotationHandle: Send {
    /// Removes the annotation from the map.
    fn destroy(self: Box<Self>);
}

/// Map engine boundary.
pub trait MapProvider: Send {
    /// Whether the engine can accept annotations yet.
    fn is_ready(&self) -> bool;

    /// Draws `annotation` and returns a handle that removes it again.
    ///
    /// # Errors
    ///
    /// Returns [`MarkerError::MapProviderUnavailable`] if the engine is not
    /// ready, or [`MarkerError::Rejected`] if it cannot draw this
    /// annotation.
    fn add_annotation(
        &mut self,
        annotation: &Annotation,
    ) -> Result<Box<dyn AnnotationHandle>, MarkerError>;
}
