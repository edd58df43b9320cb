// =============================================================================
// Signal presentation helpers
// =============================================================================

use crate::types::SignalKind;

pub const NO_REASONS: &str = "No specific reasons available";

/// Split a comma-joined `Reasoning` cell into trimmed, non-empty items.
pub fn split_reasons(reasoning: &str) -> Vec<String> {
    let items: Vec<String> = reasoning
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        vec![NO_REASONS.to_string()]
    } else {
        items
    }
}

impl SignalKind {
    /// CSS class of the dashboard box that displays this verdict.
    pub fn display_class(&self) -> &'static str {
        match self {
            Self::Buy => "signal-box-buy",
            Self::Sell => "signal-box-sell",
            Self::Neutral => "signal-box-neutral",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims() {
        assert_eq!(
            split_reasons("RSI is neutral (50.0), Price above EMA20 ,MACD above signal line"),
            vec!["RSI is neutral (50.0)", "Price above EMA20", "MACD above signal line"]
        );
    }

    #[test]
    fn empty_reasoning_gets_placeholder() {
        assert_eq!(split_reasons(""), vec![NO_REASONS]);
        assert_eq!(split_reasons(" , ,"), vec![NO_REASONS]);
    }

    #[test]
    fn display_classes() {
        assert_eq!(SignalKind::Buy.display_class(), "signal-box-buy");
        assert_eq!(SignalKind::Sell.display_class(), "signal-box-sell");
        assert_eq!(SignalKind::Neutral.display_class(), "signal-box-neutral");
    }
}
