// =============================================================================
// Candlestick Pattern Classifier
// =============================================================================
//
// Labels each bar with at most one pattern using the bar and its two
// predecessors. Rules are a fixed priority chain; the first match wins.
//
// Bullish bar (close > open):
//   1. Bullish Marubozu      both shadows < 10% of body
//   2. Bullish Hammer        lower shadow > 2x body, upper shadow < 0.5x body
//   3. Morning Star          prev bearish, prev2 bullish, prev body < 0.5x avg
//                            body, body > 1.5x prev body
//   4. Bullish Engulfing     prev bearish, open < prev close, close > prev open
//   5. Piercing Line         prev bearish, open < prev low, close > prev mid
//   6. Three White Soldiers  prev and prev2 bullish, closes strictly rising
//
// Any other bar (bearish or flat) gets the mirrored chain: Bearish Marubozu,
// Bearish Hanging Man, Evening Star, Bearish Engulfing, Dark Cloud Cover,
// Three Black Crows.
//
// The first `WARMUP_BARS` bars are never labelled. Bars whose window holds a
// non-numeric price are skipped without affecting the rest of the series.
// =============================================================================

use serde::Serialize;
use tracing::debug;

use super::candle::CandleWindow;
use crate::types::{Bar, Pattern, PatternType};

/// Bars at the start of the series that are never classified.
pub const WARMUP_BARS: usize = 3;

/// A detected pattern and its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatternLabel {
    #[serde(rename = "Pattern")]
    pub pattern: Pattern,
    #[serde(rename = "Pattern_Type")]
    pub pattern_type: PatternType,
}

impl From<Pattern> for PatternLabel {
    fn from(pattern: Pattern) -> Self {
        Self {
            pattern,
            pattern_type: pattern.pattern_type(),
        }
    }
}

/// Classify every bar. The output is aligned 1:1 with `bars`.
pub fn detect_patterns(bars: &[Bar]) -> Vec<Option<PatternLabel>> {
    let mut skipped = 0usize;
    let labels = (0..bars.len())
        .map(|i| {
            if i < WARMUP_BARS {
                return None;
            }
            match CandleWindow::at(bars, i) {
                Some(window) => classify(&window).map(PatternLabel::from),
                None => {
                    skipped += 1;
                    None
                }
            }
        })
        .collect();

    if skipped > 0 {
        debug!(skipped, "bars with non-numeric prices skipped during pattern detection");
    }
    labels
}

/// Apply the priority chain to one window.
pub fn classify(w: &CandleWindow) -> Option<Pattern> {
    if w.current.is_bullish() {
        classify_bullish(w)
    } else {
        classify_bearish(w)
    }
}

fn classify_bullish(w: &CandleWindow) -> Option<Pattern> {
    let cur = &w.current;
    let prev = &w.prev;
    let prev_bullish = prev.is_bullish();
    let prev2_bullish = w.prev2.is_bullish();

    if w.upper_shadow < w.body * 0.1 && w.lower_shadow < w.body * 0.1 {
        Some(Pattern::BullishMarubozu)
    } else if w.lower_shadow > w.body * 2.0 && w.upper_shadow < w.body * 0.5 {
        Some(Pattern::BullishHammer)
    } else if !prev_bullish
        && prev2_bullish
        && w.prev_body < w.avg_body * 0.5
        && w.body > w.prev_body * 1.5
    {
        Some(Pattern::MorningStar)
    } else if !prev_bullish && cur.open < prev.close && cur.close > prev.open {
        Some(Pattern::BullishEngulfing)
    } else if !prev_bullish && cur.open < prev.low && cur.close > w.prev_midpoint() {
        Some(Pattern::PiercingLine)
    } else if prev_bullish
        && prev2_bullish
        && cur.close > prev.close
        && prev.close > w.prev2.close
    {
        Some(Pattern::ThreeWhiteSoldiers)
    } else {
        None
    }
}

fn classify_bearish(w: &CandleWindow) -> Option<Pattern> {
    let cur = &w.current;
    let prev = &w.prev;
    let prev_bullish = prev.is_bullish();
    let prev2_bullish = w.prev2.is_bullish();

    if w.upper_shadow < w.body * 0.1 && w.lower_shadow < w.body * 0.1 {
        Some(Pattern::BearishMarubozu)
    } else if w.upper_shadow > w.body * 2.0 && w.lower_shadow < w.body * 0.5 {
        Some(Pattern::BearishHangingMan)
    } else if prev_bullish
        && !prev2_bullish
        && w.prev_body < w.avg_body * 0.5
        && w.body > w.prev_body * 1.5
    {
        Some(Pattern::EveningStar)
    } else if prev_bullish && cur.open > prev.close && cur.close < prev.open {
        Some(Pattern::BearishEngulfing)
    } else if prev_bullish && cur.open > prev.high && cur.close < w.prev_midpoint() {
        Some(Pattern::DarkCloudCover)
    } else if !prev_bullish
        && !prev2_bullish
        && cur.close < prev.close
        && prev.close < w.prev2.close
    {
        Some(Pattern::ThreeBlackCrows)
    } else {
        None
    }
}
