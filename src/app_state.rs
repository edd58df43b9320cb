// =============================================================================
// Central Application State — StockScope backend
// =============================================================================
//
// Ties the price provider, the analysis pipeline, the optional forecaster and
// the memoization cache together for the HTTP handlers. Each request works on
// its own frame; the only shared mutable state is the cache and the recent
// error log, both behind parking_lot locks.
// =============================================================================

use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{CacheKey, TtlCache};
use crate::error::AnalysisError;
use crate::forecast::{DriftForecaster, Forecaster};
use crate::market_data::{clean_ticker, fetch_first_available, resolve_range, DateRange, PriceProvider};
use crate::pipeline::{AnalysisReport, Pipeline};
use crate::runtime_config::RuntimeConfig;

// =============================================================================
// Error Record
// =============================================================================

/// A recorded provider failure for the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub ticker: String,
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

// =============================================================================
// Analysis
// =============================================================================

/// One completed analysis request, as cached and served.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Cleaned ticker as requested.
    pub ticker: String,
    /// Provider symbol that produced the data (e.g. `AAPL.US`).
    pub symbol: String,
    pub range: DateRange,
    pub report: AnalysisReport,
}

// =============================================================================
// AppState
// =============================================================================

/// Shared across all handlers via `Arc<AppState>`.
pub struct AppState {
    pub runtime_config: RwLock<RuntimeConfig>,
    pub provider: Arc<dyn PriceProvider>,
    pub forecaster: Option<Arc<dyn Forecaster>>,
    pub pipeline: Pipeline,
    pub cache: TtlCache<CacheKey, Arc<Analysis>>,
    pub recent_errors: RwLock<Vec<ErrorRecord>>,
    /// Instant the server started. Used for uptime.
    pub start_time: Instant,
}

impl AppState {
    /// Build the state from `config`, with the seeded drift forecaster when
    /// forecasting is enabled.
    pub fn new(config: RuntimeConfig, provider: Arc<dyn PriceProvider>) -> Self {
        let forecaster: Option<Arc<dyn Forecaster>> = config
            .forecast_horizon()
            .map(|_| Arc::new(DriftForecaster::new(config.forecast_seed)) as Arc<dyn Forecaster>);
        Self::with_forecaster(config, provider, forecaster)
    }

    pub fn with_forecaster(
        config: RuntimeConfig,
        provider: Arc<dyn PriceProvider>,
        forecaster: Option<Arc<dyn Forecaster>>,
    ) -> Self {
        Self {
            pipeline: Pipeline::new(config.indicators.clone()),
            cache: TtlCache::new(config.cache_ttl()),
            runtime_config: RwLock::new(config),
            provider,
            forecaster,
            recent_errors: RwLock::new(Vec::new()),
            start_time: Instant::now(),
        }
    }

    /// Fetch, analyse and cache `ticker` over the requested dates.
    pub async fn analyze(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Arc<Analysis>, AnalysisError> {
        let (lookback_years, horizon) = {
            let config = self.runtime_config.read();
            (config.lookback_years, config.forecast_horizon().unwrap_or(0))
        };

        let cleaned = clean_ticker(ticker);
        let range = resolve_range(start, end, lookback_years, Utc::now())?;
        let key = CacheKey::new(cleaned.clone(), range.start, range.end);

        if let Some(hit) = self.cache.get(&key) {
            debug!(ticker = %cleaned, "analysis cache hit");
            return Ok(hit);
        }

        let (symbol, frame) = match fetch_first_available(self.provider.as_ref(), ticker, &range).await {
            Ok(found) => found,
            Err(e) => {
                if let AnalysisError::Provider(source) = &e {
                    self.push_error(&cleaned, format!("{source:#}"));
                }
                return Err(e);
            }
        };

        let report = self
            .pipeline
            .run_with_forecast(&frame, self.forecaster.as_deref(), horizon);

        info!(
            ticker = %cleaned,
            %symbol,
            bars = report.bars.len(),
            signal = ?report.latest_signal().map(|s| s.signal),
            "analysis complete"
        );

        let analysis = Arc::new(Analysis {
            ticker: cleaned,
            symbol,
            range,
            report,
        });
        self.cache.insert(key, analysis.clone());
        Ok(analysis)
    }

    /// Record a provider failure. Capped at [`MAX_RECENT_ERRORS`]; oldest
    /// entries are evicted first.
    pub fn push_error(&self, ticker: &str, message: String) {
        let record = ErrorRecord {
            ticker: ticker.to_string(),
            message,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PriceFrame;
    use crate::types::Bar;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves a rising series for any symbol ending in `.US`.
    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PriceProvider for CountingProvider {
        async fn fetch(&self, symbol: &str, range: &DateRange) -> anyhow::Result<PriceFrame> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("timeout");
            }
            if !symbol.ends_with(".US") {
                return Ok(PriceFrame::default());
            }
            let bars: Vec<Bar> = (0..30)
                .map(|i| {
                    let c = 50.0 + i as f64;
                    Bar::new(range.start + chrono::Days::new(i), c - 0.5, c + 1.0, c - 1.0, c, 500.0)
                })
                .collect();
            Ok(PriceFrame::from_bars(&bars)?)
        }
    }

    fn state(fail: bool) -> (AppState, Arc<CountingProvider>) {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail,
        });
        let state = AppState::new(RuntimeConfig::default(), provider.clone());
        (state, provider)
    }

    fn d(y: i32, m: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, day)
    }

    #[tokio::test]
    async fn analysis_is_cached() {
        let (state, provider) = state(false);
        let a = state.analyze("msft", d(2023, 1, 2), d(2023, 3, 1)).await.unwrap();
        assert_eq!(a.ticker, "MSFT");
        assert_eq!(a.symbol, "MSFT.US");
        assert_eq!(a.report.bars.len(), 30);
        assert!(a.report.forecast.is_some());
        // MSFT, MSFT.US
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

        let b = state.analyze("MSFT", d(2023, 1, 2), d(2023, 3, 1)).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn provider_failure_is_logged() {
        let (state, _) = state(true);
        let err = state.analyze("MSFT", d(2023, 1, 2), d(2023, 3, 1)).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Provider(_)));
        let errors = state.recent_errors.read();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].ticker, "MSFT");
        assert!(state.cache.is_empty());
    }

    #[tokio::test]
    async fn forecast_disabled_by_config() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let config = RuntimeConfig {
            enable_forecast: false,
            ..RuntimeConfig::default()
        };
        let state = AppState::new(config, provider);
        assert!(state.forecaster.is_none());
        let a = state.analyze("MSFT", d(2023, 1, 2), d(2023, 3, 1)).await.unwrap();
        assert!(a.report.forecast.is_none());
    }

    #[tokio::test]
    async fn expired_analyses_are_evicted() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let config = RuntimeConfig {
            cache_ttl_secs: 0,
            ..RuntimeConfig::default()
        };
        let state = AppState::new(config, provider);
        for month in 1..=4 {
            state.analyze("MSFT", d(2023, month, 1), d(2023, 6, 1)).await.unwrap();
        }
        assert_eq!(state.cache.len(), 1);
    }

    #[test]
    fn error_log_is_capped() {
        let (state, _) = state(false);
        for i in 0..(MAX_RECENT_ERRORS + 5) {
            state.push_error("X", format!("e{i}"));
        }
        let errors = state.recent_errors.read();
        assert_eq!(errors.len(), MAX_RECENT_ERRORS);
        assert_eq!(errors[0].message, "e5");
    }
}
