// =============================================================================
// Indicator Engine — all derived columns for one price series
// =============================================================================
//
// Builds every indicator column from a bar snapshot, then fills the leading
// look-back gaps so that each bar has a usable value in every column.
//
// Failure policy: the engine never returns an error. If the series cannot be
// processed at all (empty, no finite close) it logs a warning and hands back
// columns set to the neutral value 50, flagged as `degraded`, so later stages
// always see a complete frame.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::bollinger::bollinger_or_neutral;
use super::ema::calculate_ema;
use super::macd::calculate_macd;
use super::rolling::calculate_sma;
use super::rsi::{calculate_rsi, ZeroLossPolicy};
use super::stochastic::calculate_stochastic;
use crate::error::IndicatorError;
use crate::frame::{fill_gaps, Fallback};
use crate::types::Bar;

/// Value every column takes when the engine degrades.
pub const NEUTRAL_VALUE: f64 = 50.0;

/// Window of the short trend EMA (`EMA_20` column).
pub const EMA_SHORT_WINDOW: usize = 20;
/// Window of the long trend EMA (`EMA_50` column).
pub const EMA_LONG_WINDOW: usize = 50;

fn default_rsi_window() -> usize {
    14
}

fn default_sma_window() -> usize {
    9
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_bollinger_window() -> usize {
    20
}

fn default_bollinger_k() -> f64 {
    2.0
}

fn default_stoch_k_window() -> usize {
    14
}

fn default_stoch_d_window() -> usize {
    3
}

/// Tunable look-back windows for the indicator engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,

    #[serde(default)]
    pub rsi_zero_loss: ZeroLossPolicy,

    /// Window of the `SMA` column (also the trend reference for scoring).
    #[serde(default = "default_sma_window")]
    pub sma_window: usize,

    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    #[serde(default = "default_bollinger_window")]
    pub bollinger_window: usize,

    /// Band distance in standard deviations.
    #[serde(default = "default_bollinger_k")]
    pub bollinger_k: f64,

    #[serde(default = "default_stoch_k_window")]
    pub stoch_k_window: usize,

    #[serde(default = "default_stoch_d_window")]
    pub stoch_d_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_window: default_rsi_window(),
            rsi_zero_loss: ZeroLossPolicy::default(),
            sma_window: default_sma_window(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            bollinger_window: default_bollinger_window(),
            bollinger_k: default_bollinger_k(),
            stoch_k_window: default_stoch_k_window(),
            stoch_d_window: default_stoch_d_window(),
        }
    }
}

/// Derived indicator columns, each aligned 1:1 with the input bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorFrame {
    #[serde(rename = "RSI")]
    pub rsi: Vec<f64>,
    #[serde(rename = "SMA")]
    pub sma: Vec<f64>,
    #[serde(rename = "EMA_20")]
    pub ema_20: Vec<f64>,
    #[serde(rename = "EMA_50")]
    pub ema_50: Vec<f64>,
    #[serde(rename = "MACD")]
    pub macd: Vec<f64>,
    #[serde(rename = "MACD_Signal")]
    pub macd_signal: Vec<f64>,
    #[serde(rename = "MACD_Hist")]
    pub macd_hist: Vec<f64>,
    #[serde(rename = "BB_Upper")]
    pub bb_upper: Vec<f64>,
    #[serde(rename = "BB_Middle")]
    pub bb_middle: Vec<f64>,
    #[serde(rename = "BB_Lower")]
    pub bb_lower: Vec<f64>,
    #[serde(rename = "Stoch_K")]
    pub stoch_k: Vec<f64>,
    #[serde(rename = "Stoch_D")]
    pub stoch_d: Vec<f64>,
    /// True when the columns are the neutral fallback, not real indicators.
    pub degraded: bool,
}

impl IndicatorFrame {
    /// Every column set to `NEUTRAL_VALUE` for `len` bars.
    pub fn neutral(len: usize) -> Self {
        let col = vec![NEUTRAL_VALUE; len];
        Self {
            rsi: col.clone(),
            sma: col.clone(),
            ema_20: col.clone(),
            ema_50: col.clone(),
            macd: col.clone(),
            macd_signal: col.clone(),
            macd_hist: col.clone(),
            bb_upper: col.clone(),
            bb_middle: col.clone(),
            bb_lower: col.clone(),
            stoch_k: col.clone(),
            stoch_d: col,
            degraded: true,
        }
    }

    pub fn len(&self) -> usize {
        self.rsi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rsi.is_empty()
    }

    fn columns(&self) -> [(&'static str, &[f64]); 12] {
        [
            ("RSI", self.rsi.as_slice()),
            ("SMA", self.sma.as_slice()),
            ("EMA_20", self.ema_20.as_slice()),
            ("EMA_50", self.ema_50.as_slice()),
            ("MACD", self.macd.as_slice()),
            ("MACD_Signal", self.macd_signal.as_slice()),
            ("MACD_Hist", self.macd_hist.as_slice()),
            ("BB_Upper", self.bb_upper.as_slice()),
            ("BB_Middle", self.bb_middle.as_slice()),
            ("BB_Lower", self.bb_lower.as_slice()),
            ("Stoch_K", self.stoch_k.as_slice()),
            ("Stoch_D", self.stoch_d.as_slice()),
        ]
    }
}

/// Computes the full indicator frame for a bar series.
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    params: IndicatorParams,
}

impl IndicatorEngine {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    /// Compute all indicator columns. Never fails; see the module docs.
    pub fn compute(&self, bars: &[Bar]) -> IndicatorFrame {
        match self.try_compute(bars) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, bars = bars.len(), "indicator computation failed, using neutral columns");
                IndicatorFrame::neutral(bars.len())
            }
        }
    }

    fn try_compute(&self, bars: &[Bar]) -> Result<IndicatorFrame, IndicatorError> {
        if bars.is_empty() {
            return Err(IndicatorError::EmptySeries);
        }
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        if !closes.iter().any(|c| c.is_finite()) {
            return Err(IndicatorError::NoFiniteCloses);
        }

        let p = &self.params;
        let rsi = calculate_rsi(&closes, p.rsi_window, p.rsi_zero_loss);
        let sma = calculate_sma(&closes, p.sma_window);
        let ema_20 = calculate_ema(&closes, EMA_SHORT_WINDOW);
        let ema_50 = calculate_ema(&closes, EMA_LONG_WINDOW);
        let macd = calculate_macd(&closes, p.macd_fast, p.macd_slow, p.macd_signal);
        let bands = bollinger_or_neutral(&closes, p.bollinger_window, p.bollinger_k);
        let stoch = calculate_stochastic(bars, p.stoch_k_window, p.stoch_d_window);

        let price = Fallback::Reference(&closes);
        let frame = IndicatorFrame {
            rsi: fill_gaps(rsi, Fallback::Constant(NEUTRAL_VALUE)),
            sma: fill_gaps(sma, price),
            ema_20: fill_gaps(ema_20, price),
            ema_50: fill_gaps(ema_50, price),
            macd: fill_gaps(macd.macd, Fallback::Constant(0.0)),
            macd_signal: fill_gaps(macd.signal, Fallback::Constant(0.0)),
            macd_hist: fill_gaps(macd.histogram, Fallback::Constant(0.0)),
            bb_upper: fill_gaps(bands.upper, price),
            bb_middle: fill_gaps(bands.middle, price),
            bb_lower: fill_gaps(bands.lower, price),
            stoch_k: fill_gaps(stoch.k, Fallback::Constant(NEUTRAL_VALUE)),
            stoch_d: fill_gaps(stoch.d, Fallback::Constant(NEUTRAL_VALUE)),
            degraded: false,
        };

        for (name, column) in frame.columns() {
            if column.len() != bars.len() {
                return Err(IndicatorError::MisalignedOutput {
                    name,
                    expected: bars.len(),
                    actual: column.len(),
                });
            }
        }

        debug!(bars = bars.len(), "indicator columns computed");
        Ok(frame)
    }
}
