//! FootballTransfers valuation parser.
//!
//! Two page layouts carry valuations:
//! - a player profile: one player, name in the page `h1`, value in
//!   `div.player-info__value` (older pages use `div.player-head__value`)
//! - a result list: one `.player-list__item` per player, each with its own
//!   name link, club and value
//!
//! Anything else (a "no results" page, a layout change, a value field that is
//! not a number) yields no candidates or an unavailable value. This module
//! never returns an error.

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use super::{css, element_text};
use crate::core::HtmlDocument;
use crate::models::{MarketValue, ValuationCandidate, ValuationLookupResult};
use crate::reconcile::{reconcile, Identity};

static PROFILE_VALUE: LazyLock<Selector> = LazyLock::new(|| css("div.player-info__value"));
static PROFILE_HEAD_VALUE: LazyLock<Selector> = LazyLock::new(|| css("div.player-head__value"));
static PROFILE_NAME: LazyLock<Selector> = LazyLock::new(|| css("h1"));
static PROFILE_CLUB: LazyLock<Selector> =
    LazyLock::new(|| css(".player-head__club, .player-info__club"));

static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| css(".player-list .player-list__item"));
static LIST_NAME: LazyLock<Selector> = LazyLock::new(|| css(".player-list__name"));
static LIST_LINK: LazyLock<Selector> = LazyLock::new(|| css("a[href]"));
static LIST_CLUB: LazyLock<Selector> = LazyLock::new(|| css(".player-list__club"));
static LIST_VALUE: LazyLock<Selector> = LazyLock::new(|| css(".player-list__value"));

static NO_RESULTS: LazyLock<Selector> = LazyLock::new(|| css(".no-results, .search-empty"));

/// Which layout a valuation page turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLayout {
    Profile,
    ResultList,
    NoMatch,
    Unrecognized,
}

/// Stateless parser for valuation pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuationParser;

impl ValuationParser {
    pub fn new() -> Self {
        Self
    }

    pub fn layout(&self, doc: &HtmlDocument) -> PageLayout {
        detect_layout(&Html::parse_document(&doc.body))
    }

    /// Every player entry on the page, in page order.
    pub fn parse_candidates(&self, doc: &HtmlDocument) -> Vec<ValuationCandidate> {
        let html = Html::parse_document(&doc.body);
        match detect_layout(&html) {
            PageLayout::Profile => profile_candidate(&html, &doc.url).into_iter().collect(),
            PageLayout::ResultList => list_candidates(&html, &doc.url),
            PageLayout::NoMatch | PageLayout::Unrecognized => Vec::new(),
        }
    }

    /// Value for `candidate_name` on this page.
    ///
    /// The page's candidates go through [`reconcile`] without a club, so a
    /// lone profile still needs a compatible name and duplicate names are
    /// refused. Everything else is [`ValuationLookupResult::Unavailable`].
    pub fn parse(&self, doc: &HtmlDocument, candidate_name: &str) -> ValuationLookupResult {
        let candidates = self.parse_candidates(doc);
        reconcile(Identity::new(candidate_name, None), &candidates).valuation()
    }
}

fn detect_layout(html: &Html) -> PageLayout {
    if html.select(&NO_RESULTS).next().is_some() {
        return PageLayout::NoMatch;
    }
    if html.select(&PROFILE_VALUE).next().is_some()
        || html.select(&PROFILE_HEAD_VALUE).next().is_some()
    {
        return PageLayout::Profile;
    }
    if html.select(&LIST_ITEM).next().is_some() {
        return PageLayout::ResultList;
    }
    PageLayout::Unrecognized
}

fn profile_candidate(html: &Html, page_url: &str) -> Option<ValuationCandidate> {
    let name = html
        .select(&PROFILE_NAME)
        .map(|h1| element_text(&h1))
        .find(|name| !name.is_empty())?;
    let club = first_text(html.root_element(), &PROFILE_CLUB);
    let value_text = html
        .select(&PROFILE_VALUE)
        .next()
        .or_else(|| html.select(&PROFILE_HEAD_VALUE).next())
        .map(|node| element_text(&node));

    let mut candidate = ValuationCandidate::new(name, club.as_deref(), lookup_value(value_text));
    candidate.profile_url = Some(page_url.to_string());
    Some(candidate)
}

fn list_candidates(html: &Html, page_url: &str) -> Vec<ValuationCandidate> {
    html.select(&LIST_ITEM)
        .filter_map(|item| {
            let name_node = item.select(&LIST_NAME).next()?;
            let name = element_text(&name_node);
            if name.is_empty() {
                return None;
            }
            let href = name_node
                .value()
                .attr("href")
                .or_else(|| name_node.select(&LIST_LINK).next()?.value().attr("href"));
            let club = first_text(item, &LIST_CLUB);
            let value = lookup_value(first_text(item, &LIST_VALUE));

            let mut candidate = ValuationCandidate::new(name, club.as_deref(), value);
            candidate.profile_url = href.and_then(|h| absolute_url(page_url, h));
            Some(candidate)
        })
        .collect()
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .map(|node| element_text(&node))
        .find(|text| !text.is_empty())
}

fn lookup_value(text: Option<String>) -> ValuationLookupResult {
    text.as_deref()
        .and_then(MarketValue::parse)
        .map_or(ValuationLookupResult::Unavailable, ValuationLookupResult::Available)
}

fn absolute_url(page_url: &str, href: &str) -> Option<String> {
    Url::parse(page_url)
        .and_then(|base| base.join(href))
        .ok()
        .map(String::from)
}
