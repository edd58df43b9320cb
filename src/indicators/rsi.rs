// =============================================================================
// Relative Strength Index (RSI) — rolling-mean variant
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive closes. The first
//          bar has no delta; non-finite deltas count as no movement.
// Step 2 — gains = positive deltas, losses = negated negative deltas.
// Step 3 — Average each over a trailing `window`, dividing by however many
//          bars are available while the window is still filling.
// Step 4 — RS  = avg_gain / avg_loss        (only where avg_loss != 0)
//          RSI = 100 - 100 / (1 + RS), clipped to [0, 100].
//
// Bars with avg_loss == 0 are resolved by `ZeroLossPolicy`.
//
// Thresholds:  RSI > 70 => OVERBOUGHT,  RSI < 30 => OVERSOLD.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::rolling::expanding_mean;

/// Neutral RSI used wherever a value cannot be computed.
pub const NEUTRAL_RSI: f64 = 50.0;

/// How to score a bar whose average loss is exactly zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroLossPolicy {
    /// RSI = 100 whenever avg_loss is zero, including flat stretches where
    /// avg_gain is zero too. This is the dashboard's historical behaviour.
    #[default]
    Saturate,
    /// Leave RS at 0, which makes RSI = 0 on those bars.
    ZeroRatio,
    /// RSI = 100 when there were gains, 50 when there was no movement at all.
    Conventional,
}

/// Compute the RSI series for `closes`, one value per close.
///
/// # Edge cases
/// - Empty input => empty vec
/// - `window == 0` => every bar is `NEUTRAL_RSI`
/// - Output is always within [0, 100].
pub fn calculate_rsi(closes: &[f64], window: usize, policy: ZeroLossPolicy) -> Vec<f64> {
    if window == 0 {
        return vec![NEUTRAL_RSI; closes.len()];
    }

    // --- Gains / losses ------------------------------------------------------
    let mut gains = vec![0.0_f64; closes.len()];
    let mut losses = vec![0.0_f64; closes.len()];
    for i in 1..closes.len() {
        let delta = closes[i] - closes[i - 1];
        if delta > 0.0 {
            gains[i] = delta;
        } else if delta < 0.0 {
            losses[i] = -delta;
        }
    }

    // --- Averages ------------------------------------------------------------
    let avg_gain = expanding_mean(&gains, window, 1);
    let avg_loss = expanding_mean(&losses, window, 1);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(&g, &l)| rsi_from_averages(g, l, policy))
        .collect()
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64, policy: ZeroLossPolicy) -> f64 {
    let rsi = if avg_loss != 0.0 && avg_loss.is_finite() && avg_gain.is_finite() {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    } else {
        match policy {
            ZeroLossPolicy::Saturate => 100.0,
            ZeroLossPolicy::ZeroRatio => 0.0,
            ZeroLossPolicy::Conventional if avg_gain > 0.0 => 100.0,
            ZeroLossPolicy::Conventional => NEUTRAL_RSI,
        }
    };

    if rsi.is_finite() {
        rsi.clamp(0.0, 100.0)
    } else {
        NEUTRAL_RSI
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: ZeroLossPolicy = ZeroLossPolicy::Saturate;

    #[test]
    fn rsi_empty_input() {
        assert!(calculate_rsi(&[], 14, POLICY).is_empty());
    }

    #[test]
    fn rsi_window_zero_is_neutral() {
        assert_eq!(calculate_rsi(&[1.0, 2.0, 3.0], 0, POLICY), vec![50.0; 3]);
    }

    #[test]
    fn rsi_is_aligned_with_input() {
        let closes: Vec<f64> = (1..=5).map(|x| x as f64).collect();
        assert_eq!(calculate_rsi(&closes, 14, POLICY).len(), 5);
    }

    #[test]
    fn rsi_all_gains_saturates() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        for &v in &calculate_rsi(&closes, 14, POLICY) {
            assert!((v - 100.0).abs() < 1e-10, "expected 100.0, got {v}");
        }
    }

    #[test]
    fn rsi_all_losses() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        let series = calculate_rsi(&closes, 14, POLICY);
        // The first bar has no delta, so avg_loss is 0 there.
        assert!((series[0] - 100.0).abs() < 1e-10);
        for &v in &series[1..] {
            assert!(v.abs() < 1e-10, "expected 0.0, got {v}");
        }
    }

    #[test]
    fn rsi_expanding_window_before_fill() {
        // deltas: -, +2, -1  => avg_gain = 2/3, avg_loss = 1/3 at bar 2
        let series = calculate_rsi(&[10.0, 12.0, 11.0], 14, POLICY);
        let rs: f64 = 2.0;
        assert!((series[2] - (100.0 - 100.0 / (1.0 + rs))).abs() < 1e-10);
    }

    #[test]
    fn rsi_zero_loss_policies() {
        let flat = vec![100.0; 5];
        assert_eq!(calculate_rsi(&flat, 3, ZeroLossPolicy::Saturate), vec![100.0; 5]);
        assert_eq!(calculate_rsi(&flat, 3, ZeroLossPolicy::ZeroRatio), vec![0.0; 5]);
        assert_eq!(calculate_rsi(&flat, 3, ZeroLossPolicy::Conventional), vec![50.0; 5]);

        let rising = [1.0, 2.0, 3.0];
        assert_eq!(calculate_rsi(&rising, 3, ZeroLossPolicy::Conventional)[2], 100.0);
    }

    #[test]
    fn rsi_range_check() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        for policy in [
            ZeroLossPolicy::Saturate,
            ZeroLossPolicy::ZeroRatio,
            ZeroLossPolicy::Conventional,
        ] {
            for &v in &calculate_rsi(&closes, 14, policy) {
                assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
            }
        }
    }

    #[test]
    fn rsi_ignores_nan_closes() {
        let series = calculate_rsi(&[10.0, f64::NAN, 11.0, 10.5], 14, POLICY);
        assert!(series.iter().all(|v| v.is_finite()));
    }
}
