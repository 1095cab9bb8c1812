//! Embedding configuration.
//!
//! Field names follow the embed options (`apiKey`, `showMap`, ...) so a
//! host page's options object and a TOML config file share one schema.

use std::path::Path;
use std::time::Duration;

use location_insight_metrics_models::{AbsentMetricPolicy, FeatureTag};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Default per-source deadline.
pub const DEFAULT_SOURCE_TIMEOUT_MS: u64 = 10_000;

/// Default inactivity window before typed text is submitted.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Errors produced while loading or validating a [`WidgetConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML or does not match the schema.
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// `apiKey` is empty.
    #[error("API key is required")]
    MissingApiKey,

    /// A tunable is outside its accepted range.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Option name as written in the config.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Colour scheme handed to the presentation layer.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    /// Light background.
    #[default]
    Light,
    /// Dark background.
    Dark,
}

/// Widget configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Key passed through to the geocoding service.
    pub api_key: String,
    /// Location queried as soon as the widget starts.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_true")]
    pub show_map: bool,
    #[serde(default = "default_true")]
    pub show_search: bool,
    #[serde(default = "default_true")]
    pub show_filters: bool,
    #[serde(default = "default_width")]
    pub width: String,
    #[serde(default = "default_height")]
    pub height: String,
    /// Deadline applied to each metric backend.
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,
    /// Inactivity window for typed input.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default)]
    pub absent_metric_policy: AbsentMetricPolicy,
    /// Feature tags shown on the map at start-up.
    #[serde(default = "default_filters")]
    pub initial_filters: Vec<FeatureTag>,
    /// Overrides the metric backend base URL.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Id of the geocoding service to use, enabled or not. Defaults to the
    /// highest-priority enabled service.
    #[serde(default)]
    pub geocoding_service: Option<String>,
}

const fn default_true() -> bool {
    true
}

fn default_width() -> String {
    "100%".to_string()
}

fn default_height() -> String {
    "500px".to_string()
}

const fn default_source_timeout_ms() -> u64 {
    DEFAULT_SOURCE_TIMEOUT_MS
}

const fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_filters() -> Vec<FeatureTag> {
    FeatureTag::DEFAULT_ACTIVE.to_vec()
}

impl WidgetConfig {
    /// Creates a config with every option at its default.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            location: None,
            theme: Theme::default(),
            show_map: true,
            show_search: true,
            show_filters: true,
            width: default_width(),
            height: default_height(),
            source_timeout_ms: DEFAULT_SOURCE_TIMEOUT_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            absent_metric_policy: AbsentMetricPolicy::default(),
            initial_filters: default_filters(),
            api_base_url: None,
            geocoding_service: None,
        }
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the document is malformed or
    /// `apiKey` is missing.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Checks the options that cannot be expressed in the schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] for a blank key and
    /// [`ConfigError::InvalidValue`] for a zero source timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.source_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sourceTimeoutMs",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub const fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
