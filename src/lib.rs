// =============================================================================
// StockScope — technical analysis backend for the stock dashboard
// =============================================================================
//
// Fetches daily price history, derives indicators, candlestick patterns,
// buyer/seller volume and a weighted Buy/Sell/Neutral signal per bar, and
// serves the result over a small REST API.
// =============================================================================

pub mod api;
pub mod app_state;
pub mod cache;
pub mod error;
pub mod forecast;
pub mod frame;
pub mod indicators;
pub mod market_data;
pub mod patterns;
pub mod pipeline;
pub mod runtime_config;
pub mod signals;
pub mod types;
pub mod volume;
