// =============================================================================
// Indicator interpretation labels for the latest-bar summary
// =============================================================================

pub fn rsi_label(rsi: f64) -> &'static str {
    if rsi > 70.0 {
        "Overbought"
    } else if rsi < 30.0 {
        "Oversold"
    } else {
        "Neutral"
    }
}

/// Label for `MACD - MACD_Signal`.
pub fn macd_label(diff: f64) -> &'static str {
    if diff > 0.5 {
        "Strong Bullish"
    } else if diff > 0.0 {
        "Bullish"
    } else if diff < -0.5 {
        "Strong Bearish"
    } else {
        "Bearish"
    }
}

/// Where `price` sits relative to the Bollinger Bands.
pub fn bollinger_label(price: f64, upper: f64, lower: f64) -> &'static str {
    if price > upper {
        return "Overbought";
    }
    if price < lower {
        return "Oversold";
    }
    let width = upper - lower;
    if width <= 0.0 {
        return "Middle Range";
    }
    let percent = (price - lower) / width * 100.0;
    if percent > 80.0 {
        "Near Upper Band"
    } else if percent < 20.0 {
        "Near Lower Band"
    } else {
        "Middle Range"
    }
}
