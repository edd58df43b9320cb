// =============================================================================
// Weighted Vote Scorer — per-bar Buy / Sell / Neutral verdicts
// =============================================================================
//
// For each bar past the warm-up, four checks cast weighted votes:
//
//   RSI          > 70 bearish 1.0 | < 30 bullish 1.0 | > 60 bearish 0.5 |
//                < 40 bullish 0.5 | otherwise neutral 1.0
//   Price/SMA    > 1.05x bearish 1.0 | < 0.95x bullish 1.0 | otherwise no vote
//   Price/EMA20  above bullish 0.5 | otherwise bearish 0.5
//   MACD         above signal bullish 1.0 | otherwise bearish 1.0, then
//                gap widened since previous bar bullish 0.5 | otherwise
//                bearish 0.5
//
// Each category's share of the total weight is its percentage. The verdict
// is the category with the largest share, ties going Buy, then Sell, then
// Neutral. Confidence is the winning share.
// =============================================================================

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::{debug, warn};

use crate::indicators::IndicatorFrame;
use crate::types::SignalKind;

/// Bars at the start of the series that never receive a vote.
pub const WARMUP_BARS: usize = 5;

pub const REASON_WARMUP: &str = "Initializing technical analysis";
pub const REASON_NO_VOTES: &str = "Insufficient technical signals";
pub const REASON_NO_DATA: &str = "No data available";

/// One row of the signal table.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub timestamp: NaiveDateTime,
    pub signal: SignalKind,
    /// Winning category's share of the vote, 0..=100.
    pub confidence: f64,
    /// Every reason appended while scoring this bar, in order.
    pub reasons: Vec<String>,
}

impl SignalRow {
    fn neutral(timestamp: NaiveDateTime, reason: &str) -> Self {
        Self {
            timestamp,
            signal: SignalKind::Neutral,
            confidence: 0.0,
            reasons: vec![reason.to_string()],
        }
    }

    /// Reasons joined with ", " (the `Reasoning` column).
    pub fn reasoning(&self) -> String {
        self.reasons.join(", ")
    }
}

impl Serialize for SignalRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_struct("SignalRow", 4)?;
        row.serialize_field("Date", &self.timestamp)?;
        row.serialize_field("Signal", &self.signal)?;
        row.serialize_field("Confidence", &self.confidence)?;
        row.serialize_field("Reasoning", &self.reasoning())?;
        row.end()
    }
}

/// The columns the scorer reads. Any indicator column may be absent, in
/// which case the checks that need it cast no vote.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringView<'a> {
    pub dates: &'a [NaiveDate],
    pub close: &'a [f64],
    pub rsi: Option<&'a [f64]>,
    pub sma: Option<&'a [f64]>,
    pub ema_20: Option<&'a [f64]>,
    pub macd: Option<&'a [f64]>,
    pub macd_signal: Option<&'a [f64]>,
}

impl<'a> ScoringView<'a> {
    /// View over a complete indicator frame.
    pub fn new(dates: &'a [NaiveDate], close: &'a [f64], indicators: &'a IndicatorFrame) -> Self {
        Self {
            dates,
            close,
            rsi: Some(indicators.rsi.as_slice()),
            sma: Some(indicators.sma.as_slice()),
            ema_20: Some(indicators.ema_20.as_slice()),
            macd: Some(indicators.macd.as_slice()),
            macd_signal: Some(indicators.macd_signal.as_slice()),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Accumulated votes for one bar.
#[derive(Debug, Clone, Default)]
struct Tally {
    bullish: f64,
    bearish: f64,
    neutral: f64,
    reasons: Vec<String>,
}

impl Tally {
    fn bullish(&mut self, weight: f64, reason: String) {
        self.bullish += weight;
        self.reasons.push(reason);
    }

    fn bearish(&mut self, weight: f64, reason: String) {
        self.bearish += weight;
        self.reasons.push(reason);
    }

    fn neutral(&mut self, weight: f64, reason: String) {
        self.neutral += weight;
        self.reasons.push(reason);
    }

    fn total(&self) -> f64 {
        self.bullish + self.bearish + self.neutral
    }

    /// (bullish%, bearish%, neutral%) of the total weight cast.
    fn shares(&self) -> Option<(f64, f64, f64)> {
        let total = self.total();
        if total <= 0.0 {
            return None;
        }
        Some((
            self.bullish / total * 100.0,
            self.bearish / total * 100.0,
            self.neutral / total * 100.0,
        ))
    }

    /// (verdict, confidence); `None` when no vote was cast.
    fn verdict(&self) -> Option<(SignalKind, f64)> {
        let (bull, bear, neutral) = self.shares()?;

        Some(if bull >= bear && bull >= neutral {
            (SignalKind::Buy, bull)
        } else if bear >= neutral {
            (SignalKind::Sell, bear)
        } else {
            (SignalKind::Neutral, neutral)
        })
    }
}

/// Stateless per-bar scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalScorer;

impl SignalScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score every bar. The output is aligned 1:1 with `view.dates`, except
    /// for an empty view, which yields a single synthetic row stamped now.
    pub fn score(&self, view: &ScoringView<'_>) -> Vec<SignalRow> {
        if view.is_empty() || view.close.len() != view.len() {
            warn!(
                dates = view.len(),
                closes = view.close.len(),
                "no usable data for signal scoring"
            );
            return vec![SignalRow::neutral(Utc::now().naive_utc(), REASON_NO_DATA)];
        }

        let rows: Vec<SignalRow> = view
            .dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                let timestamp = date.and_time(NaiveTime::MIN);
                if i < WARMUP_BARS {
                    return SignalRow::neutral(timestamp, REASON_WARMUP);
                }
                let tally = self.tally(view, i);
                match tally.verdict() {
                    Some((signal, confidence)) => SignalRow {
                        timestamp,
                        signal,
                        confidence,
                        reasons: tally.reasons,
                    },
                    None => SignalRow::neutral(timestamp, REASON_NO_VOTES),
                }
            })
            .collect();

        debug!(bars = rows.len(), "signals scored");
        rows
    }

    fn tally(&self, view: &ScoringView<'_>, i: usize) -> Tally {
        let mut tally = Tally::default();
        let price = view.close[i];

        if let Some(rsi) = value_at(view.rsi, i) {
            if rsi > 70.0 {
                tally.bearish(1.0, format!("RSI is overbought ({rsi:.1})"));
            } else if rsi < 30.0 {
                tally.bullish(1.0, format!("RSI is oversold ({rsi:.1})"));
            } else if rsi > 60.0 {
                tally.bearish(0.5, format!("RSI is neutral-bearish ({rsi:.1})"));
            } else if rsi < 40.0 {
                tally.bullish(0.5, format!("RSI is neutral-bullish ({rsi:.1})"));
            } else {
                tally.neutral(1.0, format!("RSI is neutral ({rsi:.1})"));
            }
        }

        if price.is_finite() {
            if let Some(sma) = value_at(view.sma, i) {
                if price > sma * 1.05 {
                    tally.bearish(
                        1.0,
                        format!("Price ({price:.2}) significantly above SMA ({sma:.2})"),
                    );
                } else if price < sma * 0.95 {
                    tally.bullish(
                        1.0,
                        format!("Price ({price:.2}) significantly below SMA ({sma:.2})"),
                    );
                }
            }

            if let Some(ema) = value_at(view.ema_20, i) {
                if price > ema {
                    tally.bullish(0.5, "Price above EMA20".to_string());
                } else {
                    tally.bearish(0.5, "Price below EMA20".to_string());
                }
            }
        }

        if let (Some(macd), Some(signal)) = (value_at(view.macd, i), value_at(view.macd_signal, i)) {
            if macd > signal {
                tally.bullish(1.0, "MACD above signal line".to_string());
            } else {
                tally.bearish(1.0, "MACD below signal line".to_string());
            }

            if let (Some(prev_macd), Some(prev_signal)) =
                (value_at(view.macd, i - 1), value_at(view.macd_signal, i - 1))
            {
                if macd - signal > prev_macd - prev_signal {
                    tally.bullish(0.5, "MACD histogram improving".to_string());
                } else {
                    tally.bearish(0.5, "MACD histogram deteriorating".to_string());
                }
            }
        }

        tally
    }
}

/// Finite value of an optional column at `i`.
fn value_at(column: Option<&[f64]>, i: usize) -> Option<f64> {
    column?.get(i).copied().filter(|v| v.is_finite())
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n).map(|i| start + chrono::Days::new(i as u64)).collect()
    }

    struct Columns {
        dates: Vec<NaiveDate>,
        close: Vec<f64>,
        rsi: Vec<f64>,
        sma: Vec<f64>,
        ema: Vec<f64>,
        macd: Vec<f64>,
        signal: Vec<f64>,
    }

    impl Columns {
        /// Flat, neutral market: every bar identical.
        fn flat(n: usize) -> Self {
            Self {
                dates: dates(n),
                close: vec![100.0; n],
                rsi: vec![50.0; n],
                sma: vec![100.0; n],
                ema: vec![100.0; n],
                macd: vec![0.0; n],
                signal: vec![0.0; n],
            }
        }

        fn view(&self) -> ScoringView<'_> {
            ScoringView {
                dates: &self.dates,
                close: &self.close,
                rsi: Some(self.rsi.as_slice()),
                sma: Some(self.sma.as_slice()),
                ema_20: Some(self.ema.as_slice()),
                macd: Some(self.macd.as_slice()),
                macd_signal: Some(self.signal.as_slice()),
            }
        }
    }

    #[test]
    fn warmup_bars_are_neutral() {
        let cols = Columns::flat(8);
        let rows = SignalScorer::new().score(&cols.view());
        assert_eq!(rows.len(), 8);
        for row in &rows[..WARMUP_BARS] {
            assert_eq!(row.signal, SignalKind::Neutral);
            assert_eq!(row.confidence, 0.0);
            assert_eq!(row.reasoning(), REASON_WARMUP);
        }
    }

    #[test]
    fn empty_input_yields_one_synthetic_row() {
        let rows = SignalScorer::new().score(&ScoringView::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].signal, SignalKind::Neutral);
        assert_eq!(rows[0].confidence, 0.0);
        assert_eq!(rows[0].reasoning(), REASON_NO_DATA);
    }

    #[test]
    fn no_columns_means_no_votes() {
        let d = dates(7);
        let close = vec![1.0; 7];
        let view = ScoringView {
            dates: &d,
            close: &close,
            ..ScoringView::default()
        };
        let rows = SignalScorer::new().score(&view);
        assert_eq!(rows[6].signal, SignalKind::Neutral);
        assert_eq!(rows[6].confidence, 0.0);
        assert_eq!(rows[6].reasoning(), REASON_NO_VOTES);
    }

    #[test]
    fn flat_market_votes() {
        // RSI neutral 1.0, price not above EMA => bearish 0.5,
        // MACD not above signal => bearish 1.0, gap unchanged => bearish 0.5.
        let cols = Columns::flat(6);
        let scorer = SignalScorer::new();
        let tally = scorer.tally(&cols.view(), 5);
        assert_eq!(tally.neutral, 1.0);
        assert_eq!(tally.bearish, 2.0);
        assert_eq!(tally.bullish, 0.0);
        assert_eq!(
            tally.reasons,
            vec![
                "RSI is neutral (50.0)",
                "Price below EMA20",
                "MACD below signal line",
                "MACD histogram deteriorating",
            ]
        );
        let row = &scorer.score(&cols.view())[5];
        assert_eq!(row.signal, SignalKind::Sell);
        assert!((row.confidence - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn oversold_and_cheap_is_buy() {
        let mut cols = Columns::flat(6);
        cols.rsi[5] = 22.0;
        cols.close[5] = 90.0;
        cols.ema[5] = 89.0;
        cols.macd[5] = 1.0;
        let row = &SignalScorer::new().score(&cols.view())[5];
        // bullish: 1.0 + 1.0 + 0.5 + 1.0 + 0.5 = 4.0, no bearish votes
        assert_eq!(row.signal, SignalKind::Buy);
        assert!((row.confidence - 100.0).abs() < 1e-9);
        assert_eq!(row.reasons[0], "RSI is oversold (22.0)");
        assert_eq!(row.reasons[1], "Price (90.00) significantly below SMA (100.00)");
    }

    #[test]
    fn rsi_bands() {
        let scorer = SignalScorer::new();
        for (rsi, bull, bear, neutral) in [
            (75.0, 0.0, 1.0, 0.0),
            (25.0, 1.0, 0.0, 0.0),
            (65.0, 0.0, 0.5, 0.0),
            (35.0, 0.5, 0.0, 0.0),
            (50.0, 0.0, 0.0, 1.0),
        ] {
            let d = dates(6);
            let close = vec![1.0; 6];
            let r = vec![rsi; 6];
            let view = ScoringView {
                dates: &d,
                close: &close,
                rsi: Some(r.as_slice()),
                ..ScoringView::default()
            };
            let t = scorer.tally(&view, 5);
            assert_eq!((t.bullish, t.bearish, t.neutral), (bull, bear, neutral), "rsi {rsi}");
        }
    }

    #[test]
    fn ties_favour_buy_then_sell() {
        let tie = Tally {
            bullish: 1.0,
            bearish: 1.0,
            ..Tally::default()
        };
        assert_eq!(tie.verdict(), Some((SignalKind::Buy, 50.0)));

        let tie = Tally {
            bearish: 1.0,
            neutral: 1.0,
            ..Tally::default()
        };
        assert_eq!(tie.verdict(), Some((SignalKind::Sell, 50.0)));

        assert_eq!(Tally::default().verdict(), None);
    }

    #[test]
    fn shares_sum_to_one_hundred_on_every_bar() {
        let n = 60;
        let mut cols = Columns::flat(n);
        for i in 0..n {
            let x = i as f64;
            cols.close[i] = 100.0 + 8.0 * (x * 0.4).sin();
            cols.rsi[i] = 50.0 + 35.0 * (x * 0.3).cos();
            cols.sma[i] = 100.0 + 2.0 * (x * 0.1).sin();
            cols.ema[i] = 100.0 + 3.0 * (x * 0.2).cos();
            cols.macd[i] = (x * 0.25).sin();
            cols.signal[i] = 0.5 * (x * 0.15).sin();
        }
        let scorer = SignalScorer::new();
        let view = cols.view();
        for i in WARMUP_BARS..n {
            let (bull, bear, neutral) = scorer.tally(&view, i).shares().unwrap();
            assert!((bull + bear + neutral - 100.0).abs() < 1e-9, "bar {i}");
            assert!([bull, bear, neutral].iter().all(|s| (0.0..=100.0).contains(s)));
        }
        let rows = scorer.score(&view);
        assert!(rows.iter().all(|r| (0.0..=100.0).contains(&r.confidence)));
    }

    #[test]
    fn non_finite_value_skips_only_its_check() {
        let mut cols = Columns::flat(6);
        cols.rsi[5] = f64::NAN;
        let tally = SignalScorer::new().tally(&cols.view(), 5);
        assert_eq!(tally.neutral, 0.0);
        assert_eq!(tally.bearish, 2.0);
    }

    #[test]
    fn serializes_reasoning_column() {
        let row = SignalRow {
            timestamp: dates(1)[0].and_time(NaiveTime::MIN),
            signal: SignalKind::Buy,
            confidence: 75.0,
            reasons: vec!["a".into(), "b".into()],
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["Signal"], "Buy");
        assert_eq!(json["Reasoning"], "a, b");
        assert_eq!(json["Confidence"], 75.0);
    }
}
