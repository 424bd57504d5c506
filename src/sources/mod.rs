//! Source parsers
//!
//! One parser per remote site, each turning a fetched [`HtmlDocument`] into
//! structured rows for that site's schema:
//! - `fbref`: per-club "Standard Stats" tables → [`PlayerStatRecord`]s
//! - `transfers`: player profile and result-list pages → [`ValuationCandidate`]s
//!
//! Parsers know nothing about persistence or reconciliation.
//!
//! [`HtmlDocument`]: crate::core::HtmlDocument
//! [`PlayerStatRecord`]: crate::models::PlayerStatRecord
//! [`ValuationCandidate`]: crate::models::ValuationCandidate

pub mod fbref;
pub mod transfers;

use scraper::{ElementRef, Selector};

pub use fbref::{StatisticsParser, StatsPage};
pub use transfers::ValuationParser;

/// Compile a selector known at build time.
pub(crate) fn css(selector: &'static str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|_| unreachable!("invalid static selector {selector}"))
}

/// Trimmed, whitespace-collapsed text content of an element.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
