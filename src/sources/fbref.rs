//! FBref squad "Standard Stats" parser.
//!
//! Each squad page carries one per-player standard statistics table whose id
//! starts with `stats_standard` (e.g. `stats_standard_9` for the Premier
//! League). Cells are addressed by FBref's `data-stat` attribute, so column
//! reordering or extra columns on the page do not matter.
//!
//! FBref sometimes ships tables inside HTML comments and renders them with
//! JavaScript. When the table is not part of the live DOM, comment nodes are
//! searched and the first one containing the table is parsed on its own.

use scraper::{ElementRef, Html};
use std::sync::LazyLock;
use tracing::debug;

use super::{css, element_text};
use crate::core::HtmlDocument;
use crate::error::ParseError;
use crate::models::{Metric, PlayerStatRecord, StatMetrics};
use crate::Season;

const TABLE_ID_PREFIX: &str = "stats_standard";

static STATS_TABLE: LazyLock<scraper::Selector> =
    LazyLock::new(|| css("table[id^=\"stats_standard\"]"));
static BODY_ROWS: LazyLock<scraper::Selector> = LazyLock::new(|| css("tbody > tr"));
static CELLS: LazyLock<scraper::Selector> = LazyLock::new(|| css("th[data-stat], td[data-stat]"));

const SKIPPED_ROW_CLASSES: &[&str] = &["thead", "over_header", "spacer"];
const AGGREGATE_ROWS: &[&str] = &["Squad Total", "Opponent Total"];

/// Records parsed from one club page plus what was dropped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsPage {
    pub club: String,
    /// Kept rows, in table order.
    pub records: Vec<PlayerStatRecord>,
    /// Rows with missing minutes or minutes at/below the threshold.
    pub dropped_for_minutes: usize,
    /// Rows that could not be read (e.g. no player name).
    pub malformed_rows: usize,
}

/// Parser for FBref squad statistics pages.
#[derive(Debug, Clone, Copy)]
pub struct StatisticsParser {
    season: Season,
    min_minutes: u32,
}

impl StatisticsParser {
    pub fn new(season: Season, min_minutes: u32) -> Self {
        Self {
            season,
            min_minutes,
        }
    }

    pub fn season(&self) -> Season {
        self.season
    }

    pub fn min_minutes(&self) -> u32 {
        self.min_minutes
    }

    /// Parse one club's squad page.
    ///
    /// # Errors
    ///
    /// [`ParseError::MissingTable`] when no standard stats table exists in the
    /// DOM or in any comment. Individual bad rows never fail the page.
    pub fn parse(&self, doc: &HtmlDocument, club: &str) -> Result<StatsPage, ParseError> {
        self.parse_html(&doc.body, club)
    }

    pub fn parse_html(&self, html: &str, club: &str) -> Result<StatsPage, ParseError> {
        let document = Html::parse_document(html);
        if let Some(table) = document.select(&STATS_TABLE).next() {
            return Ok(self.parse_table(table, club));
        }

        for markup in commented_tables(&document) {
            let fragment = Html::parse_fragment(markup);
            if let Some(table) = fragment.select(&STATS_TABLE).next() {
                return Ok(self.parse_table(table, club));
            }
        }
        Err(ParseError::MissingTable {
            expected: TABLE_ID_PREFIX.to_string(),
        })
    }

    fn parse_table(&self, table: ElementRef<'_>, club: &str) -> StatsPage {
        let mut page = StatsPage {
            club: club.to_string(),
            records: Vec::new(),
            dropped_for_minutes: 0,
            malformed_rows: 0,
        };

        for (index, row) in table.select(&BODY_ROWS).enumerate() {
            if is_filler_row(&row) {
                continue;
            }
            match self.parse_row(row, club, index + 1) {
                Ok(Some(record)) => page.records.push(record),
                Ok(None) => page.dropped_for_minutes += 1,
                Err(RowSkip::Aggregate) => {}
                Err(RowSkip::Malformed(err)) => {
                    debug!(club, %err, "skipping row");
                    page.malformed_rows += 1;
                }
            }
        }

        debug!(
            club,
            kept = page.records.len(),
            dropped = page.dropped_for_minutes,
            malformed = page.malformed_rows,
            "parsed standard stats table"
        );
        page
    }

    /// `Ok(None)` when the row is valid but fails the minutes filter.
    fn parse_row(
        &self,
        row: ElementRef<'_>,
        club: &str,
        row_number: usize,
    ) -> Result<Option<PlayerStatRecord>, RowSkip> {
        let cells = RowCells::new(row);

        let player = cells.text("player").filter(|name| !name.is_empty()).ok_or_else(|| {
            RowSkip::Malformed(ParseError::MalformedRow {
                row: row_number,
                reason: "missing player name".to_string(),
            })
        })?;
        if AGGREGATE_ROWS.iter().any(|agg| player.starts_with(agg)) {
            return Err(RowSkip::Aggregate);
        }

        let Some(minutes) = cells.text("minutes").as_deref().and_then(parse_count) else {
            return Ok(None);
        };
        if minutes <= self.min_minutes {
            return Ok(None);
        }

        let mut metrics = StatMetrics::new();
        for metric in Metric::ALL {
            metrics.set(metric, cells.text(metric.data_stat()).as_deref().and_then(parse_metric));
        }

        Ok(Some(PlayerStatRecord {
            player,
            club: club.to_string(),
            season: self.season,
            position: cells.text("position").filter(|p| !p.is_empty()),
            nation: cells.text("nationality").and_then(|n| parse_nation(&n)),
            age: cells.text("age").as_deref().and_then(parse_age),
            minutes,
            metrics,
        }))
    }
}

enum RowSkip {
    Aggregate,
    Malformed(ParseError),
}

/// Cells of one row keyed by `data-stat`.
struct RowCells<'a> {
    cells: Vec<(&'a str, ElementRef<'a>)>,
}

impl<'a> RowCells<'a> {
    fn new(row: ElementRef<'a>) -> Self {
        let cells = row
            .select(&CELLS)
            .filter_map(|cell| cell.value().attr("data-stat").map(|stat| (stat, cell)))
            .collect();
        Self { cells }
    }

    fn text(&self, data_stat: &str) -> Option<String> {
        self.cells
            .iter()
            .find(|(stat, _)| *stat == data_stat)
            .map(|(_, cell)| element_text(cell))
    }
}

fn is_filler_row(row: &ElementRef<'_>) -> bool {
    row.value()
        .classes()
        .any(|class| SKIPPED_ROW_CLASSES.contains(&class))
}

/// Comments that might hold the stats table, in document order.
fn commented_tables(document: &Html) -> impl Iterator<Item = &str> + '_ {
    document.tree.nodes().filter_map(|node| {
        let text: &str = node.value().as_comment()?;
        (text.contains("<table") && text.contains(TABLE_ID_PREFIX)).then_some(text)
    })
}

/// Integer counts such as `2,500`.
fn parse_count(text: &str) -> Option<u32> {
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse().ok()
}

/// Metric cells: empty or non-numeric becomes `None`, never zero.
fn parse_metric(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    let value: f64 = cleaned.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// FBref renders nationality as a flag code plus the country code: `no NOR`.
fn parse_nation(text: &str) -> Option<String> {
    text.split_whitespace()
        .last()
        .filter(|code| code.chars().all(|c| c.is_ascii_uppercase()))
        .map(str::to_string)
}

/// Ages appear as `24` or `24-056` (years-days).
fn parse_age(text: &str) -> Option<u8> {
    text.split('-').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAN_CITY: &str = include_str!("../../tests/fixtures/fbref_manchester_city.html");
    const COMMENTED: &str = include_str!("../../tests/fixtures/fbref_commented_table.html");

    fn parser() -> StatisticsParser {
        StatisticsParser::new(Season::new(2024), 90)
    }

    #[test]
    fn test_parse_keeps_rows_above_threshold_in_order() {
        let page = parser().parse_html(MAN_CITY, "Manchester City").unwrap();
        let names: Vec<_> = page.records.iter().map(|r| r.player.as_str()).collect();
        assert_eq!(
            names,
            vec!["Erling Haaland", "Rodri", "Rúben Dias", "Bernardo Silva", "Fringe Player"]
        );
    }

    #[test]
    fn test_parse_extracts_fields() {
        let page = parser().parse_html(MAN_CITY, "Manchester City").unwrap();
        let haaland = &page.records[0];

        assert_eq!(haaland.club, "Manchester City");
        assert_eq!(haaland.season, Season::new(2024));
        assert_eq!(haaland.minutes, 2500);
        assert_eq!(haaland.position.as_deref(), Some("FW"));
        assert_eq!(haaland.nation.as_deref(), Some("NOR"));
        assert_eq!(haaland.age, Some(24));
        assert_eq!(haaland.metrics.get(Metric::Goals), Some(27.0));
        assert_eq!(haaland.metrics.get(Metric::ExpectedGoals), Some(24.6));
        assert_eq!(haaland.metrics.get(Metric::MatchesPlayed), Some(31.0));
    }

    #[test]
    fn test_minutes_threshold_boundary() {
        // fixture holds one row at exactly 90 minutes and one at 91
        let page = parser().parse_html(MAN_CITY, "Manchester City").unwrap();
        assert!(page.records.iter().all(|r| r.minutes > 90));
        assert!(page.records.iter().any(|r| r.minutes == 91));
        assert!(!page.records.iter().any(|r| r.player == "Boundary Player"));
        assert!(!page.records.iter().any(|r| r.player == "Cameo Player"));
        // 45 minutes, exactly 90, and a blank minutes cell
        assert_eq!(page.dropped_for_minutes, 3);
    }

    #[test]
    fn test_missing_and_zero_metrics_are_distinct() {
        let page = parser().parse_html(MAN_CITY, "Manchester City").unwrap();
        let rodri = page.records.iter().find(|r| r.player == "Rodri").unwrap();
        assert_eq!(rodri.metrics.get(Metric::Goals), Some(0.0));
        assert_eq!(rodri.metrics.get(Metric::ExpectedGoals), None);
        assert_eq!(rodri.metrics.get(Metric::ExpectedAssists), None);
    }

    #[test]
    fn test_header_aggregate_and_malformed_rows() {
        let page = parser().parse_html(MAN_CITY, "Manchester City").unwrap();
        assert!(!page.records.iter().any(|r| r.player.contains("Total")));
        assert!(!page.records.iter().any(|r| r.player == "Player"));
        assert_eq!(page.malformed_rows, 1);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let page = StatisticsParser::new(Season::new(2024), 2000)
            .parse_html(MAN_CITY, "Manchester City")
            .unwrap();
        let names: Vec<_> = page.records.iter().map(|r| r.player.as_str()).collect();
        assert_eq!(names, vec!["Erling Haaland", "Rodri", "Bernardo Silva"]);
    }

    #[test]
    fn test_table_inside_comment() {
        let page = parser().parse_html(COMMENTED, "Arsenal").unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].player, "Bukayo Saka");
        assert_eq!(page.records[0].club, "Arsenal");
    }

    #[test]
    fn test_comment_without_table_does_not_hide_later_one() {
        let html = COMMENTED.replacen(
            "<body>",
            "<body><!-- stats_standard switcher: <table> layout toggles -->",
            1,
        );
        let page = parser().parse_html(&html, "Arsenal").unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[1].player, "Declan Rice");
    }

    #[test]
    fn test_missing_table() {
        let err = parser()
            .parse_html("<html><body><p>Rate limited</p></body></html>", "Arsenal")
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingTable {
                expected: "stats_standard".to_string()
            }
        );
    }

    #[test]
    fn test_value_helpers() {
        assert_eq!(parse_count("2,500"), Some(2500));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_metric("0.0"), Some(0.0));
        assert_eq!(parse_metric(""), None);
        assert_eq!(parse_metric("—"), None);
        assert_eq!(parse_nation("eng ENG"), Some("ENG".to_string()));
        assert_eq!(parse_nation(""), None);
        assert_eq!(parse_age("24-056"), Some(24));
        assert_eq!(parse_age("31"), Some(31));
    }
}
