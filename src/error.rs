// =============================================================================
// Error types
// =============================================================================
//
// Only `FrameError` and `AnalysisError` ever reach a caller. Indicator and
// volume problems are recovered inside their stage and logged instead.

use chrono::NaiveDate;
use thiserror::Error;

use crate::frame::Column;

/// Structural problems with an input price frame. These cannot be repaired
/// with neutral defaults and are surfaced to the caller.
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("column {column} has {actual} rows but the date index has {expected}")]
    LengthMismatch {
        column: Column,
        expected: usize,
        actual: usize,
    },

    #[error("dates must be strictly ascending: {previous} is followed by {next}")]
    UnorderedDates { previous: NaiveDate, next: NaiveDate },
}

/// Reasons the indicator engine falls back to neutral columns.
#[derive(Debug, Error, PartialEq)]
pub enum IndicatorError {
    #[error("input series is empty")]
    EmptySeries,

    #[error("close column has no finite values")]
    NoFiniteCloses,

    #[error("{name} produced {actual} values for {expected} bars")]
    MisalignedOutput {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Failures of a full analysis request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid ticker symbol: {0:?}")]
    InvalidTicker(String),

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("no price data found for {0}")]
    NoData(String),

    #[error("malformed price frame: {0}")]
    Frame(#[from] FrameError),

    #[error("price provider failed: {0:#}")]
    Provider(#[source] anyhow::Error),
}
