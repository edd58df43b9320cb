// =============================================================================
// Runtime Configuration — server, provider and indicator settings
// =============================================================================
//
// Every tunable parameter of the dashboard backend lives here. The config is
// loaded once at start-up from JSON and can be re-read through the API.
//
// Persistence uses an atomic tmp + rename pattern. All fields carry a serde
// default so that adding new fields never breaks loading an older file.
//
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::IndicatorParams;
use crate::market_data::ticker::DEFAULT_LOOKBACK_YEARS;
use crate::market_data::yahoo::DEFAULT_BASE_URL;

/// Env var overriding `bind_addr`.
pub const ENV_BIND_ADDR: &str = "STOCKSCOPE_BIND_ADDR";
/// Env var overriding `provider_url`.
pub const ENV_PROVIDER_URL: &str = "STOCKSCOPE_PROVIDER_URL";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_provider_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_lookback_years() -> u32 {
    DEFAULT_LOOKBACK_YEARS
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_forecast_horizon() -> usize {
    30
}

fn default_forecast_seed() -> u64 {
    crate::forecast::DEFAULT_SEED
}

fn default_true() -> bool {
    true
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Server -------------------------------------------------------------

    /// Address the HTTP API binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    // --- Price provider -----------------------------------------------------

    /// Base URL of the chart API.
    #[serde(default = "default_provider_url")]
    pub provider_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// History fetched when a request gives no start date.
    #[serde(default = "default_lookback_years")]
    pub lookback_years: u32,

    // --- Cache --------------------------------------------------------------

    /// How long an analysis result is reused for the same ticker and range.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    // --- Forecast -----------------------------------------------------------

    /// Attach a drift forecast to analysis reports.
    #[serde(default = "default_true")]
    pub enable_forecast: bool,

    /// Number of future days to project. 0 disables the forecast.
    #[serde(default = "default_forecast_horizon")]
    pub forecast_horizon: usize,

    #[serde(default = "default_forecast_seed")]
    pub forecast_seed: u64,

    // --- Indicators ---------------------------------------------------------

    #[serde(default)]
    pub indicators: IndicatorParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            provider_url: default_provider_url(),
            request_timeout_secs: default_request_timeout_secs(),
            lookback_years: default_lookback_years(),
            cache_ttl_secs: default_cache_ttl_secs(),
            enable_forecast: true,
            forecast_horizon: default_forecast_horizon(),
            forecast_seed: default_forecast_seed(),
            indicators: IndicatorParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            provider_url = %config.provider_url,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Apply `STOCKSCOPE_*` overrides from a variable lookup.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup(ENV_BIND_ADDR).filter(|v| !v.trim().is_empty()) {
            self.bind_addr = addr.trim().to_string();
        }
        if let Some(url) = lookup(ENV_PROVIDER_URL).filter(|v| !v.trim().is_empty()) {
            self.provider_url = url.trim().to_string();
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Horizon to forecast, or `None` when forecasting is off.
    pub fn forecast_horizon(&self) -> Option<usize> {
        (self.enable_forecast && self.forecast_horizon > 0).then_some(self.forecast_horizon)
    }
}
