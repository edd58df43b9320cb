// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the technical indicators behind
// the dashboard. Every series function returns a vector aligned 1:1 with its
// input, using `NaN` for bars that lack enough look-back; `engine` assembles
// the columns and fills those gaps.

pub mod bollinger;
pub mod ema;
pub mod engine;
pub mod macd;
pub mod rolling;
pub mod rsi;
pub mod stochastic;

pub use engine::{IndicatorEngine, IndicatorFrame, IndicatorParams};
pub use rsi::ZeroLossPolicy;
