// =============================================================================
// Signals Module
// =============================================================================
//
// Turns indicator columns into the per-bar signal table:
// - Weighted vote scoring (RSI, price vs. moving averages, MACD)
// - Reason splitting and display helpers
// - Indicator interpretation labels

pub mod interpret;
pub mod reasons;
pub mod weighted_score;

pub use reasons::split_reasons;
pub use weighted_score::{ScoringView, SignalRow, SignalScorer};
