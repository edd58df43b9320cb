// =============================================================================
// Price Series Provider — the pipeline's data source
// =============================================================================

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::frame::PriceFrame;

/// Inclusive daily range to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Supplies an ordered daily OHLCV frame for one symbol.
///
/// An unknown symbol or a range with no trading days is not an error: the
/// provider returns an empty frame so that callers can try another variant.
/// `Err` is reserved for transport and decoding failures.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch(&self, symbol: &str, range: &DateRange) -> Result<PriceFrame>;
}
