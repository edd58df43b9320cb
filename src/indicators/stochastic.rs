// =============================================================================
// Stochastic Oscillator (%K / %D)
// =============================================================================
//
//   %K = 100 * (close - lowest_low) / (highest_high - lowest_low)
//   %D = SMA(%K, d_window)
//
// lowest_low / highest_high are taken over the trailing `k_window` bars.
// A zero-range window (highest == lowest) leaves %K undefined at that bar.

use super::rolling::{calculate_sma, rolling_max, rolling_min};
use crate::types::Bar;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

pub fn calculate_stochastic(bars: &[Bar], k_window: usize, d_window: usize) -> StochasticSeries {
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();

    let low_min = rolling_min(&lows, k_window);
    let high_max = rolling_max(&highs, k_window);

    let k: Vec<f64> = bars
        .iter()
        .zip(low_min.iter().zip(&high_max))
        .map(|(bar, (&lo, &hi))| {
            let v = 100.0 * (bar.close - lo) / (hi - lo);
            if v.is_finite() {
                v
            } else {
                f64::NAN
            }
        })
        .collect();
    let d = calculate_sma(&k, d_window);

    StochasticSeries { k, d }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(start + chrono::Days::new(i as u64), c, c + 1.0, c - 1.0, c, 1.0))
            .collect()
    }

    #[test]
    fn k_is_undefined_until_window_fills() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let s = calculate_stochastic(&bars(&closes), 14, 3);
        assert!(s.k[12].is_nan());
        assert!(s.k[13].is_finite());
        assert!(s.d[14].is_nan());
        assert!(s.d[15].is_finite());
    }

    #[test]
    fn k_near_top_in_uptrend() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let s = calculate_stochastic(&bars(&closes), 14, 3);
        // close 20, low_min 6, high_max 21 => 14/15
        assert!((s.k[19] - 100.0 * 14.0 / 15.0).abs() < 1e-10);
        assert!((0.0..=100.0).contains(&s.d[19]));
    }

    #[test]
    fn zero_range_is_undefined() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let flat: Vec<Bar> = (0..5)
            .map(|i| Bar::new(start + chrono::Days::new(i), 5.0, 5.0, 5.0, 5.0, 1.0))
            .collect();
        let s = calculate_stochastic(&flat, 3, 2);
        assert!(s.k.iter().all(|v| v.is_nan()));
    }
}
