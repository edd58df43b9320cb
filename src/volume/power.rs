// =============================================================================
// Volume Power — buying vs. selling pressure per bar
// =============================================================================
//
// Built from the attributed buy/sell buckets:
//
//   Net_Volume        = buy - sell
//   Buy_Sell_Ratio    = buy / sell'
//   Volume_Power      = (buy - sell) / (buy + sell')
//   Volume_Power_10d  = 10-bar mean of Volume_Power
//   Buy_Momentum      = 5-bar mean of buy  / 20-bar mean of buy
//   Sell_Momentum     = 5-bar mean of sell / 20-bar mean of sell
//
// where sell' is sell with 0 replaced by `ZERO_SUBSTITUTE`. Every position
// that is undefined (short window, 0/0, x/0) reads 0.
// =============================================================================

use serde::Serialize;

use crate::indicators::rolling::calculate_sma;

/// Stand-in for a zero sell volume in a denominator.
pub const ZERO_SUBSTITUTE: f64 = 0.00001;

pub const POWER_TREND_WINDOW: usize = 10;
pub const MOMENTUM_SHORT_WINDOW: usize = 5;
pub const MOMENTUM_LONG_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumePower {
    #[serde(rename = "Net_Volume")]
    pub net_volume: Vec<f64>,
    #[serde(rename = "Buy_Sell_Ratio")]
    pub buy_sell_ratio: Vec<f64>,
    #[serde(rename = "Volume_Power")]
    pub volume_power: Vec<f64>,
    #[serde(rename = "Volume_Power_10d")]
    pub volume_power_10d: Vec<f64>,
    #[serde(rename = "Buy_Momentum")]
    pub buy_momentum: Vec<f64>,
    #[serde(rename = "Sell_Momentum")]
    pub sell_momentum: Vec<f64>,
    /// Mean of `Buy_Sell_Ratio` over the whole series.
    pub avg_ratio: f64,
}

impl VolumePower {
    pub fn zeros(len: usize) -> Self {
        Self {
            net_volume: vec![0.0; len],
            buy_sell_ratio: vec![0.0; len],
            volume_power: vec![0.0; len],
            volume_power_10d: vec![0.0; len],
            buy_momentum: vec![0.0; len],
            sell_momentum: vec![0.0; len],
            avg_ratio: 0.0,
        }
    }

    /// Derive every column from aligned buy and sell buckets.
    pub fn from_buckets(buy: &[f64], sell: &[f64]) -> Self {
        let net_volume: Vec<f64> = buy.iter().zip(sell).map(|(b, s)| b - s).collect();
        let buy_sell_ratio: Vec<f64> = buy
            .iter()
            .zip(sell)
            .map(|(&b, &s)| finite_or_zero(b / substitute_zero(s)))
            .collect();
        let volume_power: Vec<f64> = buy
            .iter()
            .zip(sell)
            .map(|(&b, &s)| finite_or_zero((b - s) / (b + substitute_zero(s))))
            .collect();

        let volume_power_10d = zero_filled(calculate_sma(&volume_power, POWER_TREND_WINDOW));
        let buy_momentum = momentum(buy);
        let sell_momentum = momentum(sell);

        let avg_ratio = if buy_sell_ratio.is_empty() {
            0.0
        } else {
            buy_sell_ratio.iter().sum::<f64>() / buy_sell_ratio.len() as f64
        };

        Self {
            net_volume,
            buy_sell_ratio,
            volume_power,
            volume_power_10d,
            buy_momentum,
            sell_momentum,
            avg_ratio,
        }
    }

    pub fn len(&self) -> usize {
        self.volume_power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volume_power.is_empty()
    }
}

fn substitute_zero(x: f64) -> f64 {
    if x == 0.0 {
        ZERO_SUBSTITUTE
    } else {
        x
    }
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

fn zero_filled(values: Vec<f64>) -> Vec<f64> {
    values.into_iter().map(finite_or_zero).collect()
}

/// Short-window mean over long-window mean.
fn momentum(values: &[f64]) -> Vec<f64> {
    let short = calculate_sma(values, MOMENTUM_SHORT_WINDOW);
    let long = calculate_sma(values, MOMENTUM_LONG_WINDOW);
    short
        .iter()
        .zip(&long)
        .map(|(s, l)| finite_or_zero(s / l))
        .collect()
}
