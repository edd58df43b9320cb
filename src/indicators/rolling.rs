// =============================================================================
// Trailing-window statistics
// =============================================================================
//
// Every function here returns a vector aligned 1:1 with its input. Positions
// where the window is not yet full (or holds a non-finite value) are `NaN`;
// the indicator engine fills those gaps once all columns are built.
//
// Simple Moving Average:
//   SMA_t = mean(x_{t-w+1} .. x_t)          defined for t >= w - 1
// =============================================================================

/// Trailing arithmetic mean over exactly `window` values.
///
/// # Edge cases
/// - `window == 0` => all `NaN`
/// - Any non-finite value inside the window => `NaN` at that position.
pub fn calculate_sma(values: &[f64], window: usize) -> Vec<f64> {
    map_full_windows(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Trailing mean that divides by however many finite values are available,
/// as long as at least `min_periods` of them are present.
///
/// With `min_periods == 1` the first `window - 1` positions are an expanding
/// average of everything seen so far.
pub fn expanding_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    if window == 0 {
        return vec![f64::NAN; values.len()];
    }
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let (sum, count) = values[start..=i]
                .iter()
                .filter(|v| v.is_finite())
                .fold((0.0_f64, 0_usize), |(s, c), &v| (s + v, c + 1));
            if count > 0 && count >= min_periods {
                sum / count as f64
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Trailing sample standard deviation (n - 1 denominator).
///
/// A one-value window has no sample deviation and yields `NaN`.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    map_full_windows(values, window, |w| {
        if w.len() < 2 {
            return f64::NAN;
        }
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let var = w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (w.len() - 1) as f64;
        var.sqrt()
    })
}

pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    map_full_windows(values, window, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    map_full_windows(values, window, |w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Apply `f` to every full, all-finite trailing window.
fn map_full_windows<F>(values: &[f64], window: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    for (i, w) in values.windows(window).enumerate() {
        if w.iter().all(|v| v.is_finite()) {
            out[i + window - 1] = f(w);
        }
    }
    out
}
