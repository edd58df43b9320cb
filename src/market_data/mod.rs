// =============================================================================
// Market Data Module
// =============================================================================
//
// Price Series Provider abstraction, the Yahoo chart implementation and the
// ticker / date-range helpers used to build a request.

pub mod provider;
pub mod ticker;
pub mod yahoo;

use tracing::{debug, info, warn};

pub use provider::{DateRange, PriceProvider};
pub use ticker::{clean_ticker, resolve_range, ticker_variants};
pub use yahoo::YahooClient;

use crate::error::AnalysisError;
use crate::frame::PriceFrame;

/// Clean `ticker` and try each of its variants until one yields bars.
///
/// Returns the symbol that produced data alongside the frame. When every
/// variant failed outright the last provider error is returned; when at least
/// one answered with nothing the result is `NoData`.
pub async fn fetch_first_available(
    provider: &dyn PriceProvider,
    ticker: &str,
    range: &DateRange,
) -> Result<(String, PriceFrame), AnalysisError> {
    let cleaned = clean_ticker(ticker);
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return Err(AnalysisError::InvalidTicker(ticker.to_string()));
    }

    let variants = ticker_variants(&cleaned);
    let mut last_error = None;
    let mut answered = false;

    for symbol in variants {
        match provider.fetch(&symbol, range).await {
            Ok(frame) if !frame.is_empty() => {
                info!(%symbol, bars = frame.len(), "price data fetched");
                return Ok((symbol, frame));
            }
            Ok(_) => {
                debug!(%symbol, "no data for variant");
                answered = true;
            }
            Err(e) => {
                warn!(%symbol, error = %e, "price fetch failed");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if !answered => Err(AnalysisError::Provider(e)),
        _ => Err(AnalysisError::NoData(cleaned)),
    }
}
