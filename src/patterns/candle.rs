// =============================================================================
// Candle window — the three bars a pattern rule looks at
// =============================================================================

use crate::types::Bar;

/// The current bar plus the two before it, with the derived body and shadow
/// measurements the pattern rules compare against each other.
#[derive(Debug, Clone, Copy)]
pub struct CandleWindow {
    pub prev2: Bar,
    pub prev: Bar,
    pub current: Bar,
    pub body: f64,
    pub prev_body: f64,
    pub upper_shadow: f64,
    pub lower_shadow: f64,
    /// Mean body size of the three bars.
    pub avg_body: f64,
}

impl CandleWindow {
    /// Build the window ending at `index`.
    ///
    /// Returns `None` when `index < 2` or when any of the three bars carries a
    /// non-finite price.
    pub fn at(bars: &[Bar], index: usize) -> Option<Self> {
        if index < 2 {
            return None;
        }
        let current = *bars.get(index)?;
        let prev = bars[index - 1];
        let prev2 = bars[index - 2];

        if !(current.has_finite_prices() && prev.has_finite_prices() && prev2.has_finite_prices()) {
            return None;
        }

        let body = current.body();
        let prev_body = prev.body();
        Some(Self {
            prev2,
            prev,
            current,
            body,
            prev_body,
            upper_shadow: current.upper_shadow(),
            lower_shadow: current.lower_shadow(),
            avg_body: (body + prev_body + prev2.body()) / 3.0,
        })
    }

    /// Midpoint of the previous bar's body.
    pub fn prev_midpoint(&self) -> f64 {
        (self.prev.open + self.prev.close) / 2.0
    }
}
