//! Run state and the summary a run returns

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::models::MarketValue;
use crate::reconcile::MatchTier;
use crate::PlayerKey;

/// Shared cancellation flag, checked before each stage item starts.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    AllClubsFailed,
    CommitFailed(String),
    Cancelled,
    Storage(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::AllClubsFailed => f.write_str("every club failed to fetch or parse"),
            FailureReason::CommitFailed(msg) => write!(f, "commit failed: {msg}"),
            FailureReason::Cancelled => f.write_str("cancelled"),
            FailureReason::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum RunState {
    Idle,
    FetchingStats,
    PersistingStats,
    FetchingValuations,
    Done,
    Failed(FailureReason),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed(_))
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => f.write_str("idle"),
            RunState::FetchingStats => f.write_str("fetching stats"),
            RunState::PersistingStats => f.write_str("persisting stats"),
            RunState::FetchingValuations => f.write_str("fetching valuations"),
            RunState::Done => f.write_str("done"),
            RunState::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClubStatus {
    Committed {
        players: usize,
        dropped_for_minutes: usize,
        malformed_rows: usize,
        retries: usize,
    },
    Skipped {
        reason: String,
    },
    /// The club's batch was rolled back, which ends the run.
    CommitFailed {
        reason: String,
    },
    /// Fetched, but the run failed before this club's turn to commit.
    NotCommitted,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClubOutcome {
    pub club: String,
    pub status: ClubStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlayerValuationStatus {
    Valued {
        value: MarketValue,
        tier: MatchTier,
        club_tie_break: bool,
    },
    Unavailable {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerOutcome {
    pub key: PlayerKey,
    pub player: String,
    pub club: String,
    pub status: PlayerValuationStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    pub clubs_committed: usize,
    pub clubs_skipped: usize,
    pub players_committed: usize,
    pub rows_dropped_for_minutes: usize,
    pub malformed_rows: usize,
    pub fetch_retries: usize,
    pub valuations_available: usize,
    pub valuations_unavailable: usize,
    pub valuation_cache_hits: usize,
}

/// Result value of one collection run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub state: RunState,
    pub clubs: Vec<ClubOutcome>,
    pub players: Vec<PlayerOutcome>,
    pub counters: RunCounters,
}

impl RunSummary {
    pub(crate) fn new() -> Self {
        Self {
            state: RunState::Idle,
            clubs: Vec::new(),
            players: Vec::new(),
            counters: RunCounters::default(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.state == RunState::Done
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.state {
            RunState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}
