//! Market valuations scraped from the valuation source.

use serde::Serialize;
use std::fmt;

/// A parsed monetary amount, e.g. `€120.5M` → 120 500 000 EUR.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketValue {
    /// Amount in whole currency units.
    pub amount: f64,
    /// ISO code when the source showed a symbol or code.
    pub currency: Option<String>,
}

impl MarketValue {
    pub fn new(amount: f64, currency: Option<&str>) -> Self {
        Self {
            amount,
            currency: currency.map(str::to_string),
        }
    }

    /// Parse display text such as `€120.5M`, `£45m`, `$1.2bn`, `EUR 500k`
    /// or `€15,000,000`. Returns `None` for text without a usable number.
    pub fn parse(text: &str) -> Option<Self> {
        let mut rest = text.trim();
        let mut currency = None;

        for (symbol, code) in [("€", "EUR"), ("£", "GBP"), ("$", "USD")] {
            if let Some(stripped) = rest.strip_prefix(symbol) {
                currency = Some(code);
                rest = stripped.trim_start();
                break;
            }
        }
        if currency.is_none() {
            for code in ["EUR", "GBP", "USD"] {
                if let Some(stripped) = rest.strip_prefix(code) {
                    currency = Some(code);
                    rest = stripped.trim_start();
                    break;
                }
                if let Some(stripped) = rest.strip_suffix(code) {
                    currency = Some(code);
                    rest = stripped.trim_end();
                    break;
                }
            }
        }

        let lowered = rest.to_lowercase();
        let mut number = lowered.trim();
        let mut multiplier = 1.0;
        for (suffix, factor) in [
            ("bn", 1e9),
            ("b", 1e9),
            ("mln", 1e6),
            ("m", 1e6),
            ("th.", 1e3),
            ("k", 1e3),
        ] {
            if let Some(stripped) = number.strip_suffix(suffix) {
                multiplier = factor;
                number = stripped.trim_end();
                break;
            }
        }

        let normalized = match (number.contains(','), number.contains('.')) {
            (true, true) => number.replace(',', ""),
            // "1,5m" uses a decimal comma; "15,000,000" groups thousands
            (true, false) if multiplier > 1.0 && number.matches(',').count() == 1 => {
                number.replace(',', ".")
            }
            (true, false) => number.replace(',', ""),
            _ => number.to_string(),
        };

        let value: f64 = normalized.parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Some(Self::new((value * multiplier).round(), currency))
    }
}

impl fmt::Display for MarketValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (scaled, suffix) = if self.amount >= 1e9 {
            (self.amount / 1e9, "bn")
        } else if self.amount >= 1e6 {
            (self.amount / 1e6, "M")
        } else if self.amount >= 1e3 {
            (self.amount / 1e3, "k")
        } else {
            (self.amount, "")
        };
        match &self.currency {
            Some(code) => write!(f, "{code} {scaled:.1}{suffix}"),
            None => write!(f, "{scaled:.1}{suffix}"),
        }
    }
}

/// Outcome of looking a player up on the valuation source.
///
/// `Unavailable` is the sentinel for "known to be absent": the page had no
/// match, the value field was missing or unreadable, or reconciliation
/// refused to guess.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValuationLookupResult {
    Available(MarketValue),
    Unavailable,
}

impl ValuationLookupResult {
    pub fn is_available(&self) -> bool {
        matches!(self, ValuationLookupResult::Available(_))
    }

    pub fn value(&self) -> Option<&MarketValue> {
        match self {
            ValuationLookupResult::Available(v) => Some(v),
            ValuationLookupResult::Unavailable => None,
        }
    }
}

impl fmt::Display for ValuationLookupResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuationLookupResult::Available(v) => write!(f, "{v}"),
            ValuationLookupResult::Unavailable => f.write_str("N/a"),
        }
    }
}

/// One player entry found on a valuation page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationCandidate {
    pub name: String,
    pub club: Option<String>,
    pub value: ValuationLookupResult,
    pub profile_url: Option<String>,
}

impl ValuationCandidate {
    pub fn new(name: impl Into<String>, club: Option<&str>, value: ValuationLookupResult) -> Self {
        Self {
            name: name.into(),
            club: club.map(str::to_string),
            value,
            profile_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbol_and_suffix() {
        assert_eq!(
            MarketValue::parse("€120.5M"),
            Some(MarketValue::new(120_500_000.0, Some("EUR")))
        );
        assert_eq!(
            MarketValue::parse("£45m"),
            Some(MarketValue::new(45_000_000.0, Some("GBP")))
        );
        assert_eq!(
            MarketValue::parse("$1.2bn"),
            Some(MarketValue::new(1_200_000_000.0, Some("USD")))
        );
        assert_eq!(
            MarketValue::parse("€ 500k"),
            Some(MarketValue::new(500_000.0, Some("EUR")))
        );
    }

    #[test]
    fn test_parse_codes_and_separators() {
        assert_eq!(
            MarketValue::parse("EUR 12M"),
            Some(MarketValue::new(12_000_000.0, Some("EUR")))
        );
        assert_eq!(
            MarketValue::parse("15,000,000 GBP"),
            Some(MarketValue::new(15_000_000.0, Some("GBP")))
        );
        assert_eq!(
            MarketValue::parse("€1,5m"),
            Some(MarketValue::new(1_500_000.0, Some("EUR")))
        );
        assert_eq!(
            MarketValue::parse("2500000"),
            Some(MarketValue::new(2_500_000.0, None))
        );
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert_eq!(MarketValue::parse(""), None);
        assert_eq!(MarketValue::parse("-"), None);
        assert_eq!(MarketValue::parse("€ N/A"), None);
        assert_eq!(MarketValue::parse("unknown"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            MarketValue::new(120_500_000.0, Some("EUR")).to_string(),
            "EUR 120.5M"
        );
        assert_eq!(ValuationLookupResult::Unavailable.to_string(), "N/a");
    }

    #[test]
    fn test_lookup_result_serializes_with_status_tag() {
        let available =
            ValuationLookupResult::Available(MarketValue::new(1e6, Some("EUR")));
        let json = serde_json::to_value(&available).unwrap();
        assert_eq!(json["status"], "available");
        assert_eq!(json["amount"], 1e6);

        let json = serde_json::to_value(ValuationLookupResult::Unavailable).unwrap();
        assert_eq!(json["status"], "unavailable");
    }
}
