// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = value_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The recurrence is seeded with the first finite value itself (no SMA warm-up
// and no bias adjustment), so the output is defined from that bar onward.
// =============================================================================

/// Compute the EMA series for `values` with look-back `period`.
///
/// The result has the same length as the input.
///
/// # Edge cases
/// - `period == 0` => all `NaN`
/// - Leading non-finite values stay `NaN` until the first finite value seeds
///   the recurrence.
/// - A non-finite value after the seed carries the previous EMA forward
///   without updating it.
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; values.len()];
    }

    let multiplier = 2.0 / (period + 1) as f64;
    let mut result = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for &value in values {
        let next = match (prev, value.is_finite()) {
            (None, true) => Some(value),
            (None, false) => None,
            (Some(p), true) => Some(value * multiplier + p * (1.0 - multiplier)),
            (Some(p), false) => Some(p),
        };
        result.push(next.unwrap_or(f64::NAN));
        prev = next;
    }

    result
}
