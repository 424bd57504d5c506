//! Data models for the storage layer

use crate::models::{PlayerStatRecord, ValuationLookupResult};
use crate::{PlayerKey, Season};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;

/// A persisted statistics row's identity, as walked by the valuation stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredPlayer {
    pub key: PlayerKey,
    pub player: String,
    pub club: String,
    pub season: Season,
}

/// Current valuation row for one stored player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerValuationRecord {
    pub player: PlayerKey,
    pub valuation: ValuationLookupResult,
    pub source_url: Option<String>,
    pub collected_at: u64,
}

/// Read-contract row: statistics joined with the current valuation.
///
/// A player with no valuation row yet reads as
/// [`ValuationLookupResult::Unavailable`], with `valued_at` left empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRecord {
    pub key: PlayerKey,
    pub stats: PlayerStatRecord,
    pub valuation: ValuationLookupResult,
    pub valuation_source_url: Option<String>,
    pub valued_at: Option<u64>,
}

/// Row counts for summaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub players: usize,
    pub valuations: usize,
    pub available_valuations: usize,
}

impl ToSql for Season {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Season {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

impl ToSql for PlayerKey {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_i64()))
    }
}

impl FromSql for PlayerKey {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_i64().map(PlayerKey::new)
    }
}
