//! Cross-source player identity matching
//!
//! The statistics and valuation sites share no player id, so candidates from
//! a valuation page are matched to a stored player by name, with the club as
//! a tie-breaker. Matching is tiered:
//!
//! 1. **Exact**: normalized names are equal (case, diacritics, punctuation and
//!    generational suffixes ignored).
//! 2. **Compatible**: only consulted when nothing matched exactly. Names with
//!    the same tokens in another order, or the same family name with given
//!    names that are equal or initials of each other (`E. Haaland`).
//!
//! When the best tier holds more than one candidate, only those whose club
//! agrees with the player's survive. Anything other than a single survivor is
//! refused rather than guessed.

use serde::Serialize;
use std::fmt;

use crate::core::text::{clubs_agree, name_tokens};
use crate::models::{PlayerStatRecord, ValuationCandidate, ValuationLookupResult};
use crate::storage::StoredPlayer;


/// The player side of a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity<'a> {
    pub name: &'a str,
    pub club: Option<&'a str>,
}

impl<'a> Identity<'a> {
    pub fn new(name: &'a str, club: Option<&'a str>) -> Self {
        Self { name, club }
    }
}

impl<'a> From<&'a PlayerStatRecord> for Identity<'a> {
    fn from(record: &'a PlayerStatRecord) -> Self {
        Self::new(&record.player, Some(&record.club))
    }
}

impl<'a> From<&'a StoredPlayer> for Identity<'a> {
    fn from(player: &'a StoredPlayer) -> Self {
        Self::new(&player.player, Some(&player.club))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Compatible,
}

/// A successful match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciled<'c> {
    pub candidate: &'c ValuationCandidate,
    pub tier: MatchTier,
    /// Whether the club had to be consulted to pick this candidate.
    pub club_tie_break: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMatchReason {
    NoCandidates,
    NoNameMatch,
    /// Several candidates were equally good and the club did not settle it.
    Ambiguous { remaining: usize },
}

impl fmt::Display for NoMatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoMatchReason::NoCandidates => f.write_str("no candidates"),
            NoMatchReason::NoNameMatch => f.write_str("no candidate name matched"),
            NoMatchReason::Ambiguous { remaining } => {
                write!(f, "ambiguous ({remaining} candidates left after club tie-break)")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReconcileOutcome<'c> {
    Matched(Reconciled<'c>),
    NoMatch(NoMatchReason),
}

impl<'c> ReconcileOutcome<'c> {
    pub fn matched(&self) -> Option<&Reconciled<'c>> {
        match self {
            ReconcileOutcome::Matched(m) => Some(m),
            ReconcileOutcome::NoMatch(_) => None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.matched().is_some()
    }

    /// Value to persist: the matched candidate's, or the unavailable sentinel.
    pub fn valuation(&self) -> ValuationLookupResult {
        self.matched()
            .map_or(ValuationLookupResult::Unavailable, |m| m.candidate.value.clone())
    }
}

/// Pick the candidate that is `player`, if exactly one plausibly is.
pub fn reconcile<'a, 'c>(
    player: impl Into<Identity<'a>>,
    candidates: &'c [ValuationCandidate],
) -> ReconcileOutcome<'c> {
    let player = player.into();
    if candidates.is_empty() {
        return ReconcileOutcome::NoMatch(NoMatchReason::NoCandidates);
    }

    let wanted = name_tokens(player.name);
    let scored: Vec<(MatchTier, &ValuationCandidate)> = candidates
        .iter()
        .filter_map(|c| name_tier(&wanted, &name_tokens(&c.name)).map(|tier| (tier, c)))
        .collect();

    let Some(best) = scored.iter().map(|(tier, _)| *tier).min() else {
        return ReconcileOutcome::NoMatch(NoMatchReason::NoNameMatch);
    };
    let tier_candidates: Vec<&ValuationCandidate> = scored
        .iter()
        .filter(|(tier, _)| *tier == best)
        .map(|(_, c)| *c)
        .collect();

    if let Some(only) = single_distinct(&tier_candidates) {
        return ReconcileOutcome::Matched(Reconciled {
            candidate: only,
            tier: best,
            club_tie_break: false,
        });
    }

    let same_club: Vec<&ValuationCandidate> = match player.club {
        Some(club) => tier_candidates
            .iter()
            .copied()
            .filter(|c| c.club.as_deref().is_some_and(|cc| clubs_agree(club, cc)))
            .collect(),
        None => Vec::new(),
    };

    match single_distinct(&same_club) {
        Some(only) => ReconcileOutcome::Matched(Reconciled {
            candidate: only,
            tier: best,
            club_tie_break: true,
        }),
        None => ReconcileOutcome::NoMatch(NoMatchReason::Ambiguous {
            remaining: same_club.len(),
        }),
    }
}

/// The first candidate when every entry is identical (a page listing the same
/// player twice), `None` for zero or several distinct entries.
fn single_distinct<'c>(candidates: &[&'c ValuationCandidate]) -> Option<&'c ValuationCandidate> {
    let (first, rest) = candidates.split_first()?;
    rest.iter().all(|c| *c == *first).then_some(*first)
}

fn name_tier(wanted: &[String], candidate: &[String]) -> Option<MatchTier> {
    if wanted.is_empty() || candidate.is_empty() {
        return None;
    }
    if wanted == candidate {
        return Some(MatchTier::Exact);
    }
    compatible_names(wanted, candidate).then_some(MatchTier::Compatible)
}

fn compatible_names(a: &[String], b: &[String]) -> bool {
    let mut sorted_a = a.to_vec();
    let mut sorted_b = b.to_vec();
    sorted_a.sort();
    sorted_b.sort();
    if sorted_a == sorted_b {
        return true;
    }

    let (Some((family_a, given_a)), Some((family_b, given_b))) = (a.split_last(), b.split_last())
    else {
        return false;
    };
    if family_a != family_b || given_a.is_empty() || given_b.is_empty() {
        return false;
    }
    given_a
        .iter()
        .zip(given_b)
        .all(|(x, y)| x == y || is_initial_of(x, y) || is_initial_of(y, x))
}

fn is_initial_of(short: &str, long: &str) -> bool {
    short.chars().count() == 1 && long.starts_with(short)
}
