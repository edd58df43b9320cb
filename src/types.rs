// =============================================================================
// Shared types used across the StockScope analysis pipeline
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data.
///
/// Expected (not enforced) shape: `low <= min(open, close) <= max(open, close) <= high`
/// and all values non-negative. Cells that could not be read as numbers are
/// carried as `NaN` so that downstream stages can skip them per bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// True when every price field is a finite number.
    pub fn has_finite_prices(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }

    /// Strictly bullish: close above open. A flat bar is not bullish.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn upper_shadow(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_shadow(&self) -> f64 {
        self.open.min(self.close) - self.low
    }
}

/// Per-bar trading verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    Buy,
    Sell,
    Neutral,
}

impl Default for SignalKind {
    fn default() -> Self {
        Self::Neutral
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "Buy"),
            Self::Sell => write!(f, "Sell"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Category tag attached to a detected candlestick pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternType {
    #[serde(rename = "Strong Bullish")]
    StrongBullish,
    #[serde(rename = "Strong Bearish")]
    StrongBearish,
    #[serde(rename = "Reversal Bullish")]
    ReversalBullish,
    #[serde(rename = "Reversal Bearish")]
    ReversalBearish,
    #[serde(rename = "Continuation Bullish")]
    ContinuationBullish,
    #[serde(rename = "Continuation Bearish")]
    ContinuationBearish,
}

impl PatternType {
    pub fn is_bullish(&self) -> bool {
        matches!(
            self,
            Self::StrongBullish | Self::ReversalBullish | Self::ContinuationBullish
        )
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::StrongBullish => "Strong Bullish",
            Self::StrongBearish => "Strong Bearish",
            Self::ReversalBullish => "Reversal Bullish",
            Self::ReversalBearish => "Reversal Bearish",
            Self::ContinuationBullish => "Continuation Bullish",
            Self::ContinuationBearish => "Continuation Bearish",
        };
        write!(f, "{s}")
    }
}

/// Named candlestick patterns recognised by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pattern {
    #[serde(rename = "Bullish Marubozu")]
    BullishMarubozu,
    #[serde(rename = "Bullish Hammer")]
    BullishHammer,
    #[serde(rename = "Morning Star")]
    MorningStar,
    #[serde(rename = "Bullish Engulfing")]
    BullishEngulfing,
    #[serde(rename = "Piercing Line")]
    PiercingLine,
    #[serde(rename = "Three White Soldiers")]
    ThreeWhiteSoldiers,
    #[serde(rename = "Bearish Marubozu")]
    BearishMarubozu,
    #[serde(rename = "Bearish Hanging Man")]
    BearishHangingMan,
    #[serde(rename = "Evening Star")]
    EveningStar,
    #[serde(rename = "Bearish Engulfing")]
    BearishEngulfing,
    #[serde(rename = "Dark Cloud Cover")]
    DarkCloudCover,
    #[serde(rename = "Three Black Crows")]
    ThreeBlackCrows,
}

impl Pattern {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BullishMarubozu => "Bullish Marubozu",
            Self::BullishHammer => "Bullish Hammer",
            Self::MorningStar => "Morning Star",
            Self::BullishEngulfing => "Bullish Engulfing",
            Self::PiercingLine => "Piercing Line",
            Self::ThreeWhiteSoldiers => "Three White Soldiers",
            Self::BearishMarubozu => "Bearish Marubozu",
            Self::BearishHangingMan => "Bearish Hanging Man",
            Self::EveningStar => "Evening Star",
            Self::BearishEngulfing => "Bearish Engulfing",
            Self::DarkCloudCover => "Dark Cloud Cover",
            Self::ThreeBlackCrows => "Three Black Crows",
        }
    }

    pub fn pattern_type(&self) -> PatternType {
        match self {
            Self::BullishMarubozu => PatternType::StrongBullish,
            Self::BearishMarubozu => PatternType::StrongBearish,
            Self::BullishHammer
            | Self::MorningStar
            | Self::BullishEngulfing
            | Self::PiercingLine => PatternType::ReversalBullish,
            Self::BearishHangingMan
            | Self::EveningStar
            | Self::BearishEngulfing
            | Self::DarkCloudCover => PatternType::ReversalBearish,
            Self::ThreeWhiteSoldiers => PatternType::ContinuationBullish,
            Self::ThreeBlackCrows => PatternType::ContinuationBearish,
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
