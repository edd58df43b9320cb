// =============================================================================
// Forecast — future price trajectory with uncertainty bounds
// =============================================================================
//
// The pipeline only depends on the `Forecaster` trait and the `Forecast`
// output contract. `DriftForecaster` is the dashboard's built-in collaborator:
// a seeded random walk with drift over daily percent returns.
//
//   r_t      = mean(returns) + N(0, std(returns))
//   p_t      = p_{t-1} * (1 + r_t)
//   bound_i  = min((i + 1) * std * 0.5, 0.5)
//   lower/upper = p_i * (1 -/+ bound_i)
// =============================================================================

use anyhow::{ensure, Context, Result};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::Bar;

/// Seed used by the dashboard so repeated requests draw the same path.
pub const DEFAULT_SEED: u64 = 42;

/// Widest band the drift forecaster draws, as a fraction of the price.
pub const MAX_BOUND_FRACTION: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub future_dates: Vec<NaiveDate>,
    pub y_pred_future: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_pred_lower: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_pred_upper: Option<Vec<f64>>,
    /// Per-step confidence the dashboard displays next to the path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction_accuracy: Option<Vec<f64>>,
}

impl Forecast {
    pub fn horizon(&self) -> usize {
        self.future_dates.len()
    }

    /// Check that every present list runs parallel to `future_dates` and that
    /// the dates are strictly ascending.
    pub fn validate(&self) -> Result<()> {
        let n = self.future_dates.len();
        ensure!(
            self.y_pred_future.len() == n,
            "forecast has {} dates but {} predictions",
            n,
            self.y_pred_future.len()
        );
        for (name, bound) in [
            ("y_pred_lower", &self.y_pred_lower),
            ("y_pred_upper", &self.y_pred_upper),
            ("prediction_accuracy", &self.prediction_accuracy),
        ] {
            if let Some(values) = bound {
                ensure!(values.len() == n, "{name} has {} entries, expected {n}", values.len());
            }
        }
        ensure!(
            self.future_dates.windows(2).all(|w| w[0] < w[1]),
            "forecast dates are not strictly ascending"
        );
        Ok(())
    }
}

/// Produces a forecast from the trailing price history.
pub trait Forecaster: Send + Sync {
    fn forecast(&self, history: &[Bar], horizon: usize) -> Result<Forecast>;
}

/// Seeded random walk with drift.
#[derive(Debug, Clone)]
pub struct DriftForecaster {
    seed: u64,
}

impl Default for DriftForecaster {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl DriftForecaster {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Forecaster for DriftForecaster {
    fn forecast(&self, history: &[Bar], horizon: usize) -> Result<Forecast> {
        let last = history
            .iter()
            .rev()
            .find(|b| b.close.is_finite())
            .context("history has no finite close")?;

        let returns = daily_returns(history);
        ensure!(
            returns.len() >= 2,
            "need at least two daily returns to estimate volatility, got {}",
            returns.len()
        );
        let drift = returns.iter().sum::<f64>() / returns.len() as f64;
        let volatility = sample_std(&returns, drift);

        let shocks = Normal::new(0.0, volatility)
            .with_context(|| format!("invalid return volatility {volatility}"))?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut future_dates = Vec::with_capacity(horizon);
        let mut y_pred_future = Vec::with_capacity(horizon);
        let mut price = last.close;
        let mut date = last.date;
        for _ in 0..horizon {
            date = date.succ_opt().context("forecast date overflow")?;
            price *= 1.0 + drift + shocks.sample(&mut rng);
            future_dates.push(date);
            y_pred_future.push(price);
        }

        let bound = |i: usize| ((i + 1) as f64 * volatility * 0.5).min(MAX_BOUND_FRACTION);
        let y_pred_lower = y_pred_future
            .iter()
            .enumerate()
            .map(|(i, p)| p * (1.0 - bound(i)))
            .collect();
        let y_pred_upper = y_pred_future
            .iter()
            .enumerate()
            .map(|(i, p)| p * (1.0 + bound(i)))
            .collect();
        let prediction_accuracy = (0..horizon)
            .map(|i| (0.8 - i as f64 * 0.05).clamp(0.5, 0.9))
            .collect();

        debug!(horizon, drift, volatility, "drift forecast generated");
        Ok(Forecast {
            future_dates,
            y_pred_future,
            y_pred_lower: Some(y_pred_lower),
            y_pred_upper: Some(y_pred_upper),
            prediction_accuracy: Some(prediction_accuracy),
        })
    }
}

/// Percent change between consecutive finite closes.
fn daily_returns(history: &[Bar]) -> Vec<f64> {
    let closes: Vec<f64> = history.iter().map(|b| b.close).filter(|c| c.is_finite()).collect();
    closes
        .windows(2)
        .map(|w| w[1] / w[0] - 1.0)
        .filter(|r| r.is_finite())
        .collect()
}

fn sample_std(values: &[f64], mean: f64) -> f64 {
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
