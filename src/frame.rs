// =============================================================================
// Price Frame — column-oriented OHLCV input
// =============================================================================
//
// A provider hands the pipeline a date index plus whichever price columns it
// managed to read. Any column may be missing and any cell may be NaN; only
// structural problems (column length vs. index length, unordered dates) are
// rejected up front. Everything else is repaired by `bars()`:
//
//   missing Open/High/Low  => copy of Close (or 0 when Close is absent too)
//   missing Close          => 0
//   missing Volume         => 0
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FrameError;
use crate::types::Bar;

/// The raw OHLCV columns a frame may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::High => write!(f, "High"),
            Self::Low => write!(f, "Low"),
            Self::Close => write!(f, "Close"),
            Self::Volume => write!(f, "Volume"),
        }
    }
}

/// Date-indexed OHLCV table with optional columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceFrame {
    dates: Vec<NaiveDate>,
    open: Option<Vec<f64>>,
    high: Option<Vec<f64>>,
    low: Option<Vec<f64>>,
    close: Option<Vec<f64>>,
    volume: Option<Vec<f64>>,
}

impl PriceFrame {
    /// Create an empty-column frame over `dates`, which must be strictly
    /// ascending (no duplicates).
    pub fn new(dates: Vec<NaiveDate>) -> Result<Self, FrameError> {
        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(FrameError::UnorderedDates {
                previous: w[0],
                next: w[1],
            });
        }
        Ok(Self {
            dates,
            ..Self::default()
        })
    }

    /// Attach (or replace) a column. Its length must match the date index.
    pub fn with_column(mut self, column: Column, values: Vec<f64>) -> Result<Self, FrameError> {
        if values.len() != self.dates.len() {
            return Err(FrameError::LengthMismatch {
                column,
                expected: self.dates.len(),
                actual: values.len(),
            });
        }
        *self.slot_mut(column) = Some(values);
        Ok(self)
    }

    /// Build a frame carrying all five columns from a bar slice.
    pub fn from_bars(bars: &[Bar]) -> Result<Self, FrameError> {
        let dates = bars.iter().map(|b| b.date).collect();
        Self::new(dates)?
            .with_column(Column::Open, bars.iter().map(|b| b.open).collect())?
            .with_column(Column::High, bars.iter().map(|b| b.high).collect())?
            .with_column(Column::Low, bars.iter().map(|b| b.low).collect())?
            .with_column(Column::Close, bars.iter().map(|b| b.close).collect())?
            .with_column(Column::Volume, bars.iter().map(|b| b.volume).collect())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn column(&self, column: Column) -> Option<&[f64]> {
        self.slot(column).as_deref()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.slot(column).is_some()
    }

    /// Materialise the frame as bars, backfilling missing columns.
    pub fn bars(&self) -> Vec<Bar> {
        let n = self.len();
        let zeros = vec![0.0; n];

        if self.close.is_none() {
            warn!(column = %Column::Close, "missing price column, defaulting to 0");
        }
        let close = self.close.as_deref().unwrap_or(&zeros);

        let [open, high, low] = [Column::Open, Column::High, Column::Low].map(|column| {
            self.slot(column).as_deref().unwrap_or_else(|| {
                warn!(column = %column, "missing price column, defaulting to Close");
                close
            })
        });

        let volume = match self.volume.as_deref() {
            Some(values) => values,
            None => {
                warn!(column = %Column::Volume, "missing volume column, defaulting to 0");
                &zeros
            }
        };

        (0..n)
            .map(|i| Bar::new(self.dates[i], open[i], high[i], low[i], close[i], volume[i]))
            .collect()
    }

    fn slot(&self, column: Column) -> &Option<Vec<f64>> {
        match column {
            Column::Open => &self.open,
            Column::High => &self.high,
            Column::Low => &self.low,
            Column::Close => &self.close,
            Column::Volume => &self.volume,
        }
    }

    fn slot_mut(&mut self, column: Column) -> &mut Option<Vec<f64>> {
        match column {
            Column::Open => &mut self.open,
            Column::High => &mut self.high,
            Column::Low => &mut self.low,
            Column::Close => &mut self.close,
            Column::Volume => &mut self.volume,
        }
    }
}

// =============================================================================
// Gap filling
// =============================================================================

/// What to use for a column that has no finite value at all.
#[derive(Debug, Clone, Copy)]
pub enum Fallback<'a> {
    /// A fixed neutral value (e.g. 50 for oscillators).
    Constant(f64),
    /// A per-bar reference column (e.g. the close for price overlays).
    Reference(&'a [f64]),
}

/// Replace every non-finite entry with its nearest defined neighbour:
/// forward-fill first, then backward-fill the leading gap.
///
/// When no entry is finite the column is rebuilt from `fallback`.
pub fn fill_gaps(mut values: Vec<f64>, fallback: Fallback<'_>) -> Vec<f64> {
    let Some(first) = values.iter().position(|v| v.is_finite()) else {
        return match fallback {
            Fallback::Constant(c) => vec![c; values.len()],
            Fallback::Reference(reference) => (0..values.len())
                .map(|i| reference.get(i).copied().filter(|v| v.is_finite()).unwrap_or(0.0))
                .collect(),
        };
    };

    let mut last = values[first];
    for v in values.iter_mut().skip(first) {
        if v.is_finite() {
            last = *v;
        } else {
            *v = last;
        }
    }
    let seed = values[first];
    for v in values.iter_mut().take(first) {
        *v = seed;
    }
    values
}
