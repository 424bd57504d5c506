//! Collection orchestrator
//!
//! A run walks `Idle → FetchingStats → PersistingStats → FetchingValuations →
//! Done`, or ends in `Failed` from any of the middle states:
//!
//! 1. every configured club page is fetched and parsed, at most
//!    `concurrency` at a time; a club that cannot be fetched or parsed is
//!    skipped and recorded
//! 2. each club's records are committed as one transaction, on this task
//! 3. every stored player of the season is looked up on the valuation site,
//!    reconciled, and its value (or the unavailable sentinel) committed
//!
//! Cancellation is checked before each fetch starts. Club pages already
//! fetched are still committed, so a cancelled run never leaves a club
//! half-written.

mod summary;


pub use summary::{
    CancelFlag, ClubOutcome, ClubStatus, FailureReason, PlayerOutcome, PlayerValuationStatus,
    RunCounters, RunState, RunSummary,
};

use futures_util::{stream, StreamExt};
use tracing::{debug, info, warn};

use crate::config::{ClubTarget, RunConfig};
use crate::core::text::slugify;
use crate::core::{FetchClient, MemoryCache};
use crate::error::Result;
use crate::models::{ValuationCandidate, ValuationLookupResult};
use crate::reconcile::{reconcile, ReconcileOutcome};
use crate::sources::{StatisticsParser, StatsPage, ValuationParser};
use crate::storage::{PlayerDatabase, StoredPlayer};

const VALUATION_CACHE_CAPACITY: usize = 1024;

/// A parsed club page and the retries its fetch needed.
struct ClubPage {
    page: StatsPage,
    retries: usize,
}

/// A fetched valuation page, cached by URL for the rest of the run.
#[derive(Debug, Clone)]
struct ValuationPage {
    url: String,
    candidates: Vec<ValuationCandidate>,
}

enum ValuationFetch {
    Page { page: ValuationPage, cached: bool },
    Failed(String),
    Cancelled,
}

pub struct Collector {
    client: FetchClient,
    stats_parser: StatisticsParser,
    valuation_parser: ValuationParser,
    config: RunConfig,
    skip_valuations: bool,
    valuation_pages: MemoryCache<String, ValuationPage>,
}

impl Collector {
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        let client = FetchClient::new(config.fetch.clone())?;
        Ok(Self {
            client,
            stats_parser: StatisticsParser::new(config.season, config.min_minutes),
            valuation_parser: ValuationParser::new(),
            config,
            skip_valuations: false,
            valuation_pages: MemoryCache::new(VALUATION_CACHE_CAPACITY),
        })
    }

    /// End the run once statistics are committed.
    pub fn skip_valuations(mut self, skip: bool) -> Self {
        self.skip_valuations = skip;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run the whole pipeline against `db`.
    ///
    /// Failures end up in the summary's state rather than in an `Err`;
    /// everything committed before a failure stays committed.
    pub async fn run(&self, db: &mut PlayerDatabase, cancel: &CancelFlag) -> RunSummary {
        let mut summary = RunSummary::new();
        info!(
            season = %self.config.season,
            clubs = self.config.clubs.len(),
            min_minutes = self.config.min_minutes,
            "starting collection run"
        );

        transition(&mut summary, RunState::FetchingStats);
        let pages = self.fetch_all_stats(cancel).await;

        transition(&mut summary, RunState::PersistingStats);
        if let Err(reason) = persist_stats(db, pages, &mut summary) {
            transition(&mut summary, RunState::Failed(reason));
            return summary;
        }
        if cancel.is_cancelled() {
            transition(&mut summary, RunState::Failed(FailureReason::Cancelled));
            return summary;
        }
        if summary.counters.clubs_committed == 0 {
            transition(&mut summary, RunState::Failed(FailureReason::AllClubsFailed));
            return summary;
        }

        if !self.skip_valuations {
            transition(&mut summary, RunState::FetchingValuations);
            if let Err(reason) = self.collect_valuations(db, cancel, &mut summary).await {
                transition(&mut summary, RunState::Failed(reason));
                return summary;
            }
        }

        transition(&mut summary, RunState::Done);
        info!(
            players = summary.counters.players_committed,
            valued = summary.counters.valuations_available,
            unavailable = summary.counters.valuations_unavailable,
            "collection run finished"
        );
        summary
    }

    async fn fetch_all_stats(
        &self,
        cancel: &CancelFlag,
    ) -> Vec<(ClubTarget, Option<Result<ClubPage>>)> {
        let mut fetched: Vec<(usize, ClubTarget, Option<Result<ClubPage>>)> =
            stream::iter(self.config.clubs.iter().cloned().enumerate())
                .map(|(index, club)| async move {
                    if cancel.is_cancelled() {
                        return (index, club, None);
                    }
                    let result = self.fetch_club(&club).await;
                    (index, club, Some(result))
                })
                .buffer_unordered(self.config.concurrency)
                .collect()
                .await;

        // commit in configuration order regardless of completion order
        fetched.sort_by_key(|(index, _, _)| *index);
        fetched
            .into_iter()
            .map(|(_, club, result)| (club, result))
            .collect()
    }

    async fn fetch_club(&self, club: &ClubTarget) -> Result<ClubPage> {
        let url = club.stats_url(&self.config.stats_base_url, self.config.season);
        debug!(club = %club.name, %url, "fetching club statistics");
        let doc = self.client.fetch(&url).await?;
        let page = self.stats_parser.parse(&doc, &club.name)?;
        Ok(ClubPage {
            page,
            retries: doc.retries(),
        })
    }

    async fn collect_valuations(
        &self,
        db: &mut PlayerDatabase,
        cancel: &CancelFlag,
        summary: &mut RunSummary,
    ) -> std::result::Result<(), FailureReason> {
        let players: Vec<StoredPlayer> = db
            .players_for_season(self.config.season)
            .map_err(|err| FailureReason::Storage(format!("{err:#}")))?
            .into_iter()
            .filter(|p| self.config.clubs.iter().any(|c| c.name == p.club))
            .collect();
        info!(players = players.len(), "looking up valuations");

        let mut lookups = stream::iter(players)
            .map(|player| async move {
                if cancel.is_cancelled() {
                    return (player, ValuationFetch::Cancelled);
                }
                let fetch = self.lookup(&player).await;
                (player, fetch)
            })
            .buffer_unordered(self.config.concurrency);

        let mut cancelled = false;
        while let Some((player, fetch)) = lookups.next().await {
            let (result, source_url, status) = match fetch {
                ValuationFetch::Cancelled => {
                    cancelled = true;
                    continue;
                }
                ValuationFetch::Failed(reason) => {
                    warn!(player = %player.player, club = %player.club, %reason, "valuation lookup failed");
                    (
                        ValuationLookupResult::Unavailable,
                        None,
                        PlayerValuationStatus::Unavailable { reason },
                    )
                }
                ValuationFetch::Page { page, cached } => {
                    if cached {
                        summary.counters.valuation_cache_hits += 1;
                    }
                    self.settle(&player, &page)
                }
            };

            db.upsert_valuation(player.key, &result, source_url.as_deref())
                .map_err(|err| {
                    warn!(player = %player.player, error = %err, "valuation commit failed");
                    FailureReason::CommitFailed(err.to_string())
                })?;

            if result.is_available() {
                summary.counters.valuations_available += 1;
            } else {
                summary.counters.valuations_unavailable += 1;
            }
            summary.players.push(PlayerOutcome {
                key: player.key,
                player: player.player,
                club: player.club,
                status,
            });
        }

        summary.players.sort_by_key(|p| p.key);
        if cancelled {
            return Err(FailureReason::Cancelled);
        }
        Ok(())
    }

    /// Reconcile one player against a fetched page.
    fn settle(
        &self,
        player: &StoredPlayer,
        page: &ValuationPage,
    ) -> (ValuationLookupResult, Option<String>, PlayerValuationStatus) {
        match reconcile(player, &page.candidates) {
            ReconcileOutcome::Matched(matched) => {
                let source_url = matched
                    .candidate
                    .profile_url
                    .clone()
                    .unwrap_or_else(|| page.url.clone());
                let status = match &matched.candidate.value {
                    ValuationLookupResult::Available(value) => PlayerValuationStatus::Valued {
                        value: value.clone(),
                        tier: matched.tier,
                        club_tie_break: matched.club_tie_break,
                    },
                    ValuationLookupResult::Unavailable => PlayerValuationStatus::Unavailable {
                        reason: "matched entry has no readable value".to_string(),
                    },
                };
                (matched.candidate.value.clone(), Some(source_url), status)
            }
            ReconcileOutcome::NoMatch(reason) => {
                debug!(player = %player.player, club = %player.club, %reason, "no valuation match");
                (
                    ValuationLookupResult::Unavailable,
                    Some(page.url.clone()),
                    PlayerValuationStatus::Unavailable {
                        reason: reason.to_string(),
                    },
                )
            }
        }
    }

    /// Find the valuation page for a stored player.
    ///
    /// Candidate URLs are tried in order until one lists an entry that
    /// reconciles with the player. Without a match, the first page that
    /// listed anyone is returned so the summary can say why.
    async fn lookup(&self, player: &StoredPlayer) -> ValuationFetch {
        let slug = slugify(&player.player);
        if slug.is_empty() {
            return ValuationFetch::Failed(format!("no usable slug for {:?}", player.player));
        }

        let mut fallback: Option<(ValuationPage, bool)> = None;
        let mut last_error: Option<String> = None;
        for url in self.valuation_urls(&slug) {
            let (page, cached) = match self.valuation_pages.get(&url) {
                Some(page) => (page, true),
                None => match self.client.fetch(&url).await {
                    Ok(doc) => {
                        let page = ValuationPage {
                            url: url.clone(),
                            candidates: self.valuation_parser.parse_candidates(&doc),
                        };
                        self.valuation_pages.put(url, page.clone());
                        (page, false)
                    }
                    Err(err) => {
                        debug!(%url, error = %err, "valuation url failed");
                        last_error = Some(err.to_string());
                        continue;
                    }
                },
            };

            if reconcile(player, &page.candidates).is_match() {
                return ValuationFetch::Page { page, cached };
            }
            let listed_someone = matches!(&fallback, Some((kept, _)) if !kept.candidates.is_empty());
            if !listed_someone {
                fallback = Some((page, cached));
            }
        }

        match (fallback, last_error) {
            (Some((page, cached)), _) => ValuationFetch::Page { page, cached },
            (None, Some(err)) => ValuationFetch::Failed(err),
            (None, None) => ValuationFetch::Failed("no valuation urls".to_string()),
        }
    }

    fn valuation_urls(&self, slug: &str) -> [String; 2] {
        let base = self.config.valuation_base_url.trim_end_matches('/');
        [
            format!("{base}/en/players/{slug}"),
            format!("{base}/en/players/{slug}/profile"),
        ]
    }
}

fn persist_stats(
    db: &mut PlayerDatabase,
    pages: Vec<(ClubTarget, Option<Result<ClubPage>>)>,
    summary: &mut RunSummary,
) -> std::result::Result<(), FailureReason> {
    let mut pages = pages.into_iter();
    while let Some((club, result)) = pages.next() {
        let ClubPage { page, retries } = match result {
            None => {
                summary.clubs.push(ClubOutcome {
                    club: club.name,
                    status: ClubStatus::Cancelled,
                });
                continue;
            }
            Some(Err(err)) => {
                warn!(club = %club.name, error = %err, "skipping club");
                summary.counters.clubs_skipped += 1;
                summary.clubs.push(ClubOutcome {
                    club: club.name,
                    status: ClubStatus::Skipped {
                        reason: err.to_string(),
                    },
                });
                continue;
            }
            Some(Ok(club_page)) => club_page,
        };

        let keys = match db.upsert_stats(&page.records) {
            Ok(keys) => keys,
            Err(err) => {
                warn!(club = %club.name, error = %err, "club commit failed");
                let reason = err.to_string();
                summary.clubs.push(ClubOutcome {
                    club: club.name,
                    status: ClubStatus::CommitFailed {
                        reason: reason.clone(),
                    },
                });
                summary
                    .clubs
                    .extend(pages.by_ref().map(|(club, _)| ClubOutcome {
                        club: club.name,
                        status: ClubStatus::NotCommitted,
                    }));
                return Err(FailureReason::CommitFailed(reason));
            }
        };

        info!(
            club = %club.name,
            players = keys.len(),
            dropped = page.dropped_for_minutes,
            "committed club statistics"
        );
        summary.counters.clubs_committed += 1;
        summary.counters.players_committed += keys.len();
        summary.counters.rows_dropped_for_minutes += page.dropped_for_minutes;
        summary.counters.malformed_rows += page.malformed_rows;
        summary.counters.fetch_retries += retries;
        summary.clubs.push(ClubOutcome {
            club: club.name,
            status: ClubStatus::Committed {
                players: keys.len(),
                dropped_for_minutes: page.dropped_for_minutes,
                malformed_rows: page.malformed_rows,
                retries,
            },
        });
    }
    Ok(())
}

fn transition(summary: &mut RunSummary, next: RunState) {
    debug!(from = %summary.state, to = %next, "run state");
    summary.state = next;
}
