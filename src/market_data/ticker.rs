// =============================================================================
// Ticker and date-range normalisation
// =============================================================================
//
// Users type tickers in many shapes (" aapl", "('A','A','P','L')", "brk.b").
// `clean_ticker` keeps only letters, digits and dots, upper-cased. Each cleaned
// ticker expands to the exchange variants tried in order:
//
//   AAPL         => AAPL, AAPL.US
//   RELIANCE.NS  => RELIANCE.NS, RELIANCE
//   BRK.B        => BRK.B
// =============================================================================

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc, Weekday};

use super::provider::DateRange;
use crate::error::AnalysisError;

/// Default history length when no start date is given.
pub const DEFAULT_LOOKBACK_YEARS: u32 = 3;

/// Offset of US Eastern time from UTC (standard time, no DST).
const US_MARKET_UTC_OFFSET_HOURS: i64 = 5;

pub fn clean_ticker(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Exchange variants of an already cleaned ticker, most specific first.
pub fn ticker_variants(cleaned: &str) -> Vec<String> {
    let mut variants = vec![cleaned.to_string()];
    if !cleaned.contains('.') {
        variants.push(format!("{cleaned}.US"));
    } else if let Some(base) = cleaned.strip_suffix(".NS") {
        if !base.is_empty() {
            variants.push(base.to_string());
        }
    }
    variants
}

/// True while the US market is open: weekdays 09:30–16:00 Eastern.
pub fn is_us_market_open(now: DateTime<Utc>) -> bool {
    let eastern = now.naive_utc() - Duration::hours(US_MARKET_UTC_OFFSET_HOURS);
    if matches!(eastern.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }
    let (Some(open), Some(close)) = (
        NaiveTime::from_hms_opt(9, 30, 0),
        NaiveTime::from_hms_opt(16, 0, 0),
    ) else {
        return false;
    };
    let time = eastern.time();
    open <= time && time <= close
}

/// Resolve the requested dates into the range to download.
///
/// Start defaults to `lookback_years` before today; end defaults to today and
/// is clamped to today. While the market is open today's bar is incomplete,
/// so the download stops at yesterday.
pub fn resolve_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    lookback_years: u32,
    now: DateTime<Utc>,
) -> Result<DateRange, AnalysisError> {
    let today = now.date_naive();
    let start = start.unwrap_or_else(|| {
        today
            .checked_sub_months(Months::new(lookback_years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN)
    });
    let mut end = end.map_or(today, |e| e.min(today));
    if is_us_market_open(now) {
        end = end.min(today.pred_opt().unwrap_or(today));
    }

    if start > end {
        return Err(AnalysisError::InvalidRange { start, end });
    }
    Ok(DateRange::new(start, end))
}
