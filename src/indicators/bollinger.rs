// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the trailing sample standard
// deviation over the same window.
//
// Leading bars without a full window are forward/backward filled inside this
// module. An empty input cannot produce bands; `bollinger_or_neutral` turns
// that into flat bands at the series mean instead of an error.

use tracing::warn;

use super::rolling::{calculate_sma, rolling_std};
use crate::error::IndicatorError;
use crate::frame::{fill_gaps, Fallback};

/// Aligned Bollinger Band columns.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

impl BollingerBands {
    /// Flat bands at the mean of the finite closes (0 when there are none).
    pub fn flat(closes: &[f64]) -> Self {
        let finite: Vec<f64> = closes.iter().copied().filter(|v| v.is_finite()).collect();
        let mean = if finite.is_empty() {
            0.0
        } else {
            finite.iter().sum::<f64>() / finite.len() as f64
        };
        let band = vec![mean; closes.len()];
        Self {
            upper: band.clone(),
            middle: band.clone(),
            lower: band,
        }
    }
}

/// Calculate Bollinger Bands for the given closing prices.
///
/// Returns `Err(IndicatorError::EmptySeries)` for an empty input.
pub fn calculate_bollinger(
    closes: &[f64],
    period: usize,
    num_std: f64,
) -> Result<BollingerBands, IndicatorError> {
    if closes.is_empty() {
        return Err(IndicatorError::EmptySeries);
    }

    let middle = calculate_sma(closes, period);
    let std = rolling_std(closes, period);

    let upper: Vec<f64> = middle.iter().zip(&std).map(|(m, s)| m + num_std * s).collect();
    let lower: Vec<f64> = middle.iter().zip(&std).map(|(m, s)| m - num_std * s).collect();

    Ok(BollingerBands {
        upper: fill_gaps(upper, Fallback::Reference(closes)),
        middle: fill_gaps(middle, Fallback::Reference(closes)),
        lower: fill_gaps(lower, Fallback::Reference(closes)),
    })
}

/// Bollinger Bands that never fail: on error, all three bands collapse to the
/// series mean.
pub fn bollinger_or_neutral(closes: &[f64], period: usize, num_std: f64) -> BollingerBands {
    match calculate_bollinger(closes, period, num_std) {
        Ok(bands) => bands,
        Err(e) => {
            warn!(error = %e, "Bollinger Bands unavailable, using flat bands at the mean");
            BollingerBands::flat(closes)
        }
    }
}
