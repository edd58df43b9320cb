// =============================================================================
// Analysis Pipeline — indicators, patterns, volume and signals in one pass
// =============================================================================
//
//   PriceFrame ─► bars ─┬─► IndicatorEngine ──► SignalScorer ─┐
//                       ├─► detect_patterns ──────────────────┼─► AnalysisReport
//   PriceFrame ─────────┴─► attribute_volume ─────────────────┘
//
// Every stage reads the same bar snapshot and builds its own columns; the
// report assembles them at the end. No stage mutates the input, so running
// the pipeline twice on the same frame yields identical reports. An optional
// `Forecaster` can append a future trajectory; its failure only costs the
// forecast.
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::forecast::{Forecast, Forecaster};
use crate::frame::PriceFrame;
use crate::indicators::{IndicatorEngine, IndicatorFrame, IndicatorParams};
use crate::patterns::{detect_patterns, PatternLabel};
use crate::signals::interpret::{bollinger_label, macd_label, rsi_label};
use crate::signals::{split_reasons, ScoringView, SignalRow, SignalScorer};
use crate::types::{Bar, SignalKind};
use crate::volume::{attribute_volume, VolumeProfile};

/// Everything the dashboard renders for one ticker and range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub bars: Vec<Bar>,
    pub indicators: IndicatorFrame,
    pub patterns: Vec<Option<PatternLabel>>,
    pub volume: VolumeProfile,
    pub signals: Vec<SignalRow>,
    pub latest: Option<LatestSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Forecast>,
}

impl AnalysisReport {
    /// Most recent row of the signal table.
    pub fn latest_signal(&self) -> Option<&SignalRow> {
        self.signals.last()
    }
}

/// Headline figures for the most recent bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestSummary {
    pub date: NaiveDate,
    pub close: f64,
    pub signal: SignalKind,
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub display_class: &'static str,
    pub rsi: f64,
    pub rsi_label: &'static str,
    pub macd_diff: f64,
    pub macd_label: &'static str,
    pub bollinger_label: &'static str,
    pub pattern: Option<PatternLabel>,
    pub buyer_seller_ratio: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    engine: IndicatorEngine,
    scorer: SignalScorer,
}

impl Pipeline {
    pub fn new(params: IndicatorParams) -> Self {
        Self {
            engine: IndicatorEngine::new(params),
            scorer: SignalScorer::new(),
        }
    }

    pub fn params(&self) -> &IndicatorParams {
        self.engine.params()
    }

    /// Run every stage over `frame`. Never fails: each stage degrades to its
    /// neutral output on its own.
    pub fn run(&self, frame: &PriceFrame) -> AnalysisReport {
        let bars = frame.bars();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let indicators = self.engine.compute(&bars);
        let patterns = detect_patterns(&bars);
        let volume = attribute_volume(frame);
        let signals = self
            .scorer
            .score(&ScoringView::new(frame.dates(), &closes, &indicators));

        let latest = summarize_latest(&bars, &indicators, &patterns, &volume, &signals);
        debug!(
            bars = bars.len(),
            patterns = patterns.iter().flatten().count(),
            degraded = indicators.degraded,
            "analysis pipeline complete"
        );

        AnalysisReport {
            bars,
            indicators,
            patterns,
            volume,
            signals,
            latest,
            forecast: None,
        }
    }

    /// `run`, plus a forecast of `horizon` days when a forecaster is given.
    pub fn run_with_forecast(
        &self,
        frame: &PriceFrame,
        forecaster: Option<&dyn Forecaster>,
        horizon: usize,
    ) -> AnalysisReport {
        let mut report = self.run(frame);
        let Some(forecaster) = forecaster else {
            return report;
        };
        if horizon == 0 || report.bars.is_empty() {
            return report;
        }

        let forecast = forecaster
            .forecast(&report.bars, horizon)
            .and_then(|f| f.validate().map(|()| f));
        match forecast {
            Ok(f) => report.forecast = Some(f),
            Err(e) => warn!(error = %e, "forecast failed, returning historical analysis only"),
        }
        report
    }
}

fn summarize_latest(
    bars: &[Bar],
    indicators: &IndicatorFrame,
    patterns: &[Option<PatternLabel>],
    volume: &VolumeProfile,
    signals: &[SignalRow],
) -> Option<LatestSummary> {
    let bar = bars.last()?;
    let i = bars.len() - 1;
    let signal = signals.last()?;

    let rsi = *indicators.rsi.get(i)?;
    let macd_diff = indicators.macd.get(i)? - indicators.macd_signal.get(i)?;
    let upper = *indicators.bb_upper.get(i)?;
    let lower = *indicators.bb_lower.get(i)?;

    Some(LatestSummary {
        date: bar.date,
        close: bar.close,
        signal: signal.signal,
        confidence: signal.confidence,
        reasons: split_reasons(&signal.reasoning()),
        display_class: signal.signal.display_class(),
        rsi,
        rsi_label: rsi_label(rsi),
        macd_diff,
        macd_label: macd_label(macd_diff),
        bollinger_label: bollinger_label(bar.close, upper, lower),
        pattern: patterns.get(i).copied().flatten(),
        buyer_seller_ratio: volume.ratio,
    })
}
