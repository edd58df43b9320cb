// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`:
//
//   GET /api/v1/health                  liveness, uptime, recent provider errors
//   GET /api/v1/analysis/:ticker        full report (bars, indicators, patterns,
//                                       volume, signals, latest, forecast)
//   GET /api/v1/signals/:ticker         signal table and latest summary only
//   GET /api/v1/config                  active runtime config
//
// `start` / `end` query parameters take `YYYY-MM-DD`. Errors are JSON
// `{ "error": ... }` with 400 for bad input, 404 when no data exists and 502
// when the price provider fails.
//
// CORS is configured permissively for development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::app_state::{AppState, ErrorRecord};
use crate::error::AnalysisError;
use crate::pipeline::LatestSummary;
use crate::signals::SignalRow;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/analysis/:ticker", get(analysis))
        .route("/api/v1/signals/:ticker", get(signals))
        .route("/api/v1/config", get(config))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Analysis(AnalysisError),
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        Self::Analysis(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Analysis(e) => {
                let status = match &e {
                    AnalysisError::InvalidTicker(_) | AnalysisError::InvalidRange { .. } => {
                        StatusCode::BAD_REQUEST
                    }
                    AnalysisError::NoData(_) => StatusCode::NOT_FOUND,
                    AnalysisError::Frame(_) | AnalysisError::Provider(_) => StatusCode::BAD_GATEWAY,
                };
                (status, e.to_string())
            }
        };
        if status.is_server_error() {
            warn!(%status, error = %message, "request failed");
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// =============================================================================
// Query parsing
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct RangeQuery {
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
}

impl RangeQuery {
    fn dates(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), ApiError> {
        Ok((parse_date("start", &self.start)?, parse_date("end", &self.end)?))
    }
}

fn parse_date(name: &str, value: &Option<String>) -> Result<Option<NaiveDate>, ApiError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("{name} must be YYYY-MM-DD, got {raw:?}"))),
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: u64,
    cache_entries: usize,
    recent_errors: Vec<ErrorRecord>,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        uptime_seconds: state.uptime_secs(),
        cache_entries: state.cache.len(),
        recent_errors: state.recent_errors.read().clone(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Analysis
// =============================================================================

async fn analysis(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Response, ApiError> {
    let (start, end) = query.dates()?;
    let analysis = state.analyze(&ticker, start, end).await?;
    Ok(Json(analysis.as_ref()).into_response())
}

#[derive(Serialize)]
struct SignalsResponse<'a> {
    ticker: &'a str,
    symbol: &'a str,
    signals: &'a [SignalRow],
    latest: Option<&'a LatestSummary>,
}

async fn signals(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Response, ApiError> {
    let (start, end) = query.dates()?;
    let analysis = state.analyze(&ticker, start, end).await?;
    let resp = SignalsResponse {
        ticker: &analysis.ticker,
        symbol: &analysis.symbol,
        signals: &analysis.report.signals,
        latest: analysis.report.latest.as_ref(),
    };
    Ok(Json(resp).into_response())
}

// =============================================================================
// Config
// =============================================================================

async fn config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.runtime_config.read().clone();
    Json(config)
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PriceFrame;
    use crate::market_data::{DateRange, PriceProvider};
    use crate::runtime_config::RuntimeConfig;
    use crate::types::Bar;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    /// `GOOD` has 30 rising bars, `DOWN` fails, everything else is empty.
    struct StubProvider;

    #[async_trait]
    impl PriceProvider for StubProvider {
        async fn fetch(&self, symbol: &str, range: &DateRange) -> anyhow::Result<PriceFrame> {
            match symbol {
                "GOOD" => {
                    let bars: Vec<Bar> = (0..30)
                        .map(|i| {
                            let close = 10.0 + 2.0 * i as f64;
                            let open = if i == 0 { close } else { close - 2.0 };
                            Bar::new(range.start + chrono::Days::new(i), open, close, open, close, 1000.0)
                        })
                        .collect();
                    Ok(PriceFrame::from_bars(&bars)?)
                }
                "DOWN" | "DOWN.US" => anyhow::bail!("connection reset"),
                _ => Ok(PriceFrame::default()),
            }
        }
    }

    fn app() -> Router {
        router(Arc::new(AppState::new(RuntimeConfig::default(), Arc::new(StubProvider))))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = get_json(app(), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cache_entries"], 0);
    }

    #[tokio::test]
    async fn analysis_returns_full_report() {
        let (status, body) =
            get_json(app(), "/api/v1/analysis/good?start=2023-01-02&end=2023-03-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ticker"], "GOOD");
        assert_eq!(body["symbol"], "GOOD");
        let report = &body["report"];
        assert_eq!(report["bars"].as_array().unwrap().len(), 30);
        assert_eq!(report["indicators"]["RSI"].as_array().unwrap().len(), 30);
        assert_eq!(report["volume"]["ratio"], 5.0);
        assert_eq!(report["latest"]["signal"], "Sell");
        assert_eq!(report["signals"][29]["Signal"], "Sell");
        assert!(report["forecast"]["y_pred_future"].is_array());
    }

    #[tokio::test]
    async fn signals_endpoint_is_compact() {
        let (status, body) =
            get_json(app(), "/api/v1/signals/GOOD?start=2023-01-02&end=2023-03-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["signals"].as_array().unwrap().len(), 30);
        assert_eq!(body["latest"]["display_class"], "signal-box-sell");
        assert!(body.get("report").is_none());
    }

    #[tokio::test]
    async fn bad_date_is_400() {
        let (status, body) = get_json(app(), "/api/v1/analysis/GOOD?start=01/02/2023").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("start"));
    }

    #[tokio::test]
    async fn inverted_range_is_400() {
        let (status, _) =
            get_json(app(), "/api/v1/analysis/GOOD?start=2023-03-01&end=2023-01-01").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_ticker_is_404() {
        let (status, body) =
            get_json(app(), "/api/v1/analysis/NONE?start=2023-01-02&end=2023-03-01").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("NONE"));
    }

    #[tokio::test]
    async fn provider_failure_is_502() {
        let (status, _) =
            get_json(app(), "/api/v1/analysis/DOWN?start=2023-01-02&end=2023-03-01").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn config_is_served() {
        let (status, body) = get_json(app(), "/api/v1/config").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["indicators"]["rsi_window"], 14);
        assert_eq!(body["lookback_years"], 3);
    }
}
