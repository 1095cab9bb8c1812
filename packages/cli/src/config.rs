//! Config layering: TOML file, then environment, then flags.

use std::path::PathBuf;

use clap::Args;
use location_insight_metrics_models::AbsentMetricPolicy;
use location_insight_widget_models::{ConfigError, Theme, WidgetConfig};

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Path to a TOML widget config
    #[arg(long, global = true, env = "LOCATION_INSIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Geocoding API key
    #[arg(long, global = true, env = "LOCATION_INSIGHT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the metric backends (default: `http://localhost:8000/api`)
    #[arg(long, global = true, env = "LOCATION_INSIGHT_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Per-source deadline in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Report missing sub-metrics as zero instead of omitting them
    #[arg(long, global = true)]
    pub zero_absent: bool,

    /// Colour theme (`light` or `dark`)
    #[arg(long, global = true)]
    pub theme: Option<Theme>,

    /// Geocoding service id (see `services`)
    #[arg(long, global = true)]
    pub geocoding_service: Option<String>,
}

impl ConfigArgs {
    /// Builds the effective config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be loaded or the
    /// result fails validation.
    pub fn load(&self) -> Result<WidgetConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => {
                log::debug!("Loading config from {}", path.display());
                WidgetConfig::from_toml_file(path)?
            }
            None => WidgetConfig::new(""),
        };

        if let Some(api_key) = &self.api_key {
            config.api_key.clone_from(api_key);
        }
        if let Some(base_url) = &self.api_base_url {
            config.api_base_url = Some(base_url.clone());
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.source_timeout_ms = timeout_ms;
        }
        if self.zero_absent {
            config.absent_metric_policy = AbsentMetricPolicy::ZeroIfAbsent;
        }
        if let Some(theme) = self.theme {
            config.theme = theme;
        }
        if let Some(service) = &self.geocoding_service {
            config.geocoding_service = Some(service.clone());
        }

        config.validate()?;
        Ok(config)
    }
}
