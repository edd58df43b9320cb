// =============================================================================
// Yahoo Finance chart client — daily OHLCV over HTTP
// =============================================================================
//
// GET {base}/v8/finance/chart/{symbol}?period1=..&period2=..&interval=1d
//
// The response carries a `timestamp` array plus parallel `open/high/low/
// close/volume` arrays under `indicators.quote[0]`. Missing cells arrive as
// `null` and become NaN so the pipeline can skip them per bar. Timestamps are
// shifted by the exchange's `gmtoffset` before taking the calendar date.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::provider::{DateRange, PriceProvider};
use crate::frame::{Column, PriceFrame};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

const USER_AGENT: &str = "Mozilla/5.0 (compatible; stockscope/1.0)";

// -----------------------------------------------------------------------------
// Wire format
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

// -----------------------------------------------------------------------------
// Client
// -----------------------------------------------------------------------------

/// Daily bar downloader for the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client for YahooClient")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(%base_url, "YahooClient initialised");
        Ok(Self { base_url, client })
    }

    /// Re-use an existing HTTP client.
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl PriceProvider for YahooClient {
    #[instrument(skip(self, range), name = "yahoo::fetch", fields(start = %range.start, end = %range.end))]
    async fn fetch(&self, symbol: &str, range: &DateRange) -> Result<PriceFrame> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let period1 = unix_midnight(range.start);
        // period2 is exclusive
        let period2 = range.end.succ_opt().map_or(period1, unix_midnight);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("GET chart for {symbol}"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .with_context(|| format!("failed to read chart response for {symbol}"))?;

        let envelope: ChartEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(e).context("failed to parse chart response");
            }
            Err(_) => anyhow::bail!("chart API returned {}: {}", status, body),
        };

        if let Some(err) = envelope.chart.error {
            if err.code.eq_ignore_ascii_case("Not Found") {
                debug!(symbol, description = %err.description, "symbol not found");
                return Ok(PriceFrame::default());
            }
            anyhow::bail!("chart API returned {}: {} {}", status, err.code, err.description);
        }
        if !status.is_success() {
            anyhow::bail!("chart API returned {}: {}", status, body);
        }

        let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
            debug!(symbol, "chart response has no result");
            return Ok(PriceFrame::default());
        };

        let frame = build_frame(result, range)?;
        debug!(symbol, bars = frame.len(), "chart downloaded");
        Ok(frame)
    }
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

/// Turn the parallel arrays into a frame. Rows outside `range` and rows whose
/// date does not advance on the previous kept row are dropped.
fn build_frame(result: ChartResult, range: &DateRange) -> Result<PriceFrame> {
    let offset = result.meta.gmtoffset;
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut keep = Vec::with_capacity(result.timestamp.len());
    let mut dates: Vec<NaiveDate> = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Some(date) = DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        if !range.contains(date) || dates.last().is_some_and(|last| date <= *last) {
            continue;
        }
        keep.push(i);
        dates.push(date);
    }
    let dropped = result.timestamp.len() - keep.len();
    if dropped > 0 {
        debug!(dropped, "chart rows outside range or out of order dropped");
    }

    let mut frame = PriceFrame::new(dates)?;
    for (column, values) in [
        (Column::Open, quote.open),
        (Column::High, quote.high),
        (Column::Low, quote.low),
        (Column::Close, quote.close),
        (Column::Volume, quote.volume),
    ] {
        let Some(values) = values else {
            continue;
        };
        let picked = keep
            .iter()
            .map(|&i| values.get(i).copied().flatten().unwrap_or(f64::NAN))
            .collect();
        frame = frame.with_column(column, picked)?;
    }
    Ok(frame)
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn range() -> DateRange {
        DateRange::new(d(2024, 3, 1), d(2024, 3, 31))
    }

    fn client(server: &MockServer) -> YahooClient {
        YahooClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    /// 14:30 UTC on the given March 2024 day.
    fn ts(day: u32) -> i64 {
        d(2024, 3, day).and_hms_opt(14, 30, 0).unwrap().and_utc().timestamp()
    }

    #[tokio::test]
    async fn parses_chart_with_nulls() {
        let server = MockServer::start().await;
        let body = json!({
            "chart": {
                "result": [{
                    "meta": { "gmtoffset": -14400 },
                    "timestamp": [ts(4), ts(5), ts(6)],
                    "indicators": { "quote": [{
                        "open":   [10.0, 11.0, null],
                        "high":   [11.0, 12.0, 13.0],
                        "low":    [9.5, 10.5, 11.5],
                        "close":  [10.5, 11.5, 12.5],
                        "volume": [1000, 2000, 3000]
                    }]}
                }],
                "error": null
            }
        });
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .and(query_param("interval", "1d"))
            .and(query_param("period1", unix_midnight(d(2024, 3, 1)).to_string()))
            .and(query_param("period2", unix_midnight(d(2024, 4, 1)).to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let frame = client(&server).fetch("AAPL", &range()).await.unwrap();
        assert_eq!(frame.dates(), &[d(2024, 3, 4), d(2024, 3, 5), d(2024, 3, 6)]);
        let open = frame.column(Column::Open).unwrap();
        assert_eq!(open[1], 11.0);
        assert!(open[2].is_nan());
        assert_eq!(frame.column(Column::Volume).unwrap(), &[1000.0, 2000.0, 3000.0]);
    }

    #[tokio::test]
    async fn drops_out_of_range_and_duplicate_rows() {
        let server = MockServer::start().await;
        let body = json!({
            "chart": {
                "result": [{
                    "timestamp": [ts(4), ts(4), ts(5), ts(1) + 31 * 86_400],
                    "indicators": { "quote": [{
                        "close": [1.0, 2.0, 3.0, 4.0]
                    }]}
                }]
            }
        });
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/MSFT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let frame = client(&server).fetch("MSFT", &range()).await.unwrap();
        assert_eq!(frame.dates(), &[d(2024, 3, 4), d(2024, 3, 5)]);
        assert_eq!(frame.column(Column::Close).unwrap(), &[1.0, 3.0]);
        assert!(!frame.has_column(Column::Open));
    }

    #[tokio::test]
    async fn unknown_symbol_is_empty_not_error() {
        let server = MockServer::start().await;
        let body = json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        });
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/NOPE"))
            .respond_with(ResponseTemplate::new(404).set_body_json(body))
            .mount(&server)
            .await;

        let frame = client(&server).fetch("NOPE", &range()).await.unwrap();
        assert!(frame.is_empty());
    }

    #[tokio::test]
    async fn server_error_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let err = client(&server).fetch("AAPL", &range()).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
