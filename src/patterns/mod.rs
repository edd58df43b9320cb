// =============================================================================
// Candlestick Patterns Module
// =============================================================================

pub mod candle;
pub mod classifier;

pub use candle::CandleWindow;
pub use classifier::{detect_patterns, PatternLabel};
