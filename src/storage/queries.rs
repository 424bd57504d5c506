//! Upserts and the read contract

use super::{models::*, schema::PlayerDatabase};
use crate::error::PersistenceError;
use crate::models::{MarketValue, Metric, PlayerStatRecord, StatMetrics, ValuationLookupResult};
use crate::{PlayerKey, Season};
use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Columns written for a statistics row, in bind order.
fn stat_columns() -> Vec<&'static str> {
    let mut columns = vec!["player", "club", "season", "position", "nation", "age", "minutes"];
    columns.extend(Metric::ALL.iter().map(|m| m.column()));
    columns
}

static UPSERT_STATS_SQL: LazyLock<String> = LazyLock::new(|| {
    let columns = stat_columns();
    let count = columns.len();
    let placeholders: Vec<String> = (1..=count + 2).map(|i| format!("?{i}")).collect();
    let updates: Vec<String> = columns
        .iter()
        .skip(3)
        .map(|c| format!("{c} = excluded.{c}"))
        .collect();
    format!(
        "INSERT INTO player_stats ({}, created_at, updated_at)
         VALUES ({})
         ON CONFLICT(player, club, season) DO UPDATE SET
            {},
            updated_at = excluded.updated_at
         RETURNING id",
        columns.join(", "),
        placeholders.join(", "),
        updates.join(",\n            ")
    )
});

/// SELECT list shared by every read-contract query; see `row_to_record`.
static RECORD_SELECT_SQL: LazyLock<String> = LazyLock::new(|| {
    let metrics: Vec<String> = Metric::ALL
        .iter()
        .map(|m| format!("s.{}", m.column()))
        .collect();
    format!(
        "SELECT s.id, s.player, s.club, s.season, s.position, s.nation, s.age, s.minutes,
                {},
                v.status, v.amount, v.currency, v.source_url, v.collected_at
         FROM player_stats s
         LEFT JOIN player_valuations v ON v.player_id = s.id",
        metrics.join(", ")
    )
});

const FIRST_METRIC_COLUMN: usize = 8;
const VALUATION_COLUMN: usize = FIRST_METRIC_COLUMN + Metric::COUNT;

fn now_secs() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

fn stat_values(record: &PlayerStatRecord, now: u64) -> Vec<Value> {
    let mut values = vec![
        Value::from(record.player.clone()),
        Value::from(record.club.clone()),
        Value::from(record.season.to_string()),
        Value::from(record.position.clone()),
        Value::from(record.nation.clone()),
        Value::from(record.age),
        Value::from(record.minutes),
    ];
    values.extend(record.metrics.iter().map(|(_, v)| Value::from(v)));
    // created_at only applies on first insert; the upsert never updates it
    values.push(Value::Integer(now as i64));
    values.push(Value::Integer(now as i64));
    values
}

impl PlayerDatabase {
    /// Insert or update one club's records as a single transaction.
    ///
    /// Rows are keyed by `(player, club, season)`; an existing row keeps its
    /// id and `created_at`. Returns the storage key of every record in input
    /// order. Any failure rolls back the whole batch.
    pub fn upsert_stats(
        &mut self,
        records: &[PlayerStatRecord],
    ) -> std::result::Result<Vec<PlayerKey>, PersistenceError> {
        let batch = batch_label(records);
        self.write_stats_batch(records)
            .map_err(|err| PersistenceError::CommitFailed {
                batch,
                message: format!("{err:#}"),
            })
    }

    fn write_stats_batch(&mut self, records: &[PlayerStatRecord]) -> Result<Vec<PlayerKey>> {
        let now = now_secs()?;
        let tx = self.conn.transaction()?;
        let mut keys = Vec::with_capacity(records.len());
        {
            let mut stmt = tx.prepare_cached(&UPSERT_STATS_SQL)?;
            for record in records {
                let id: i64 =
                    stmt.query_row(params_from_iter(stat_values(record, now)), |row| row.get(0))?;
                keys.push(PlayerKey::new(id));
            }
        }
        tx.commit()?;
        Ok(keys)
    }

    /// Write the current valuation for a stored player, replacing any earlier one.
    ///
    /// Fails with `CommitFailed` when `player` does not exist.
    pub fn upsert_valuation(
        &mut self,
        player: PlayerKey,
        result: &ValuationLookupResult,
        source_url: Option<&str>,
    ) -> std::result::Result<(), PersistenceError> {
        self.write_valuation(player, result, source_url)
            .map_err(|err| PersistenceError::CommitFailed {
                batch: format!("valuation of player {player}"),
                message: format!("{err:#}"),
            })
    }

    fn write_valuation(
        &mut self,
        player: PlayerKey,
        result: &ValuationLookupResult,
        source_url: Option<&str>,
    ) -> Result<()> {
        let now = now_secs()?;
        let (status, amount, currency) = match result {
            ValuationLookupResult::Available(value) => {
                ("available", Some(value.amount), value.currency.as_deref())
            }
            ValuationLookupResult::Unavailable => ("unavailable", None, None),
        };
        self.conn.execute(
            "INSERT INTO player_valuations (player_id, status, amount, currency, source_url, collected_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(player_id) DO UPDATE SET
                status = excluded.status,
                amount = excluded.amount,
                currency = excluded.currency,
                source_url = excluded.source_url,
                collected_at = excluded.collected_at",
            params![player, status, amount, currency, source_url, now],
        )?;
        Ok(())
    }

    /// Current valuation row, if one was ever written
    pub fn get_valuation(&self, player: PlayerKey) -> Result<Option<PlayerValuationRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT player_id, status, amount, currency, source_url, collected_at
                 FROM player_valuations WHERE player_id = ?",
                params![player],
                |row| {
                    Ok(PlayerValuationRecord {
                        player: row.get(0)?,
                        valuation: valuation_from_columns(
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                        ),
                        source_url: row.get(4)?,
                        collected_at: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Every stored player of a season, in insertion order
    pub fn players_for_season(&self, season: Season) -> Result<Vec<StoredPlayer>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, player, club, season FROM player_stats
             WHERE season = ? ORDER BY id",
        )?;
        let rows = stmt.query_map(params![season], |row| {
            Ok(StoredPlayer {
                key: row.get(0)?,
                player: row.get(1)?,
                club: row.get(2)?,
                season: row.get(3)?,
            })
        })?;
        let mut players = Vec::new();
        for player in rows {
            players.push(player?);
        }
        Ok(players)
    }

    /// All stored records joined with their valuation
    pub fn read_all(&self) -> Result<Vec<PlayerRecord>> {
        self.query_records("", params![])
    }

    /// Records of one season joined with their valuation
    pub fn read_season(&self, season: Season) -> Result<Vec<PlayerRecord>> {
        self.query_records("WHERE s.season = ?", params![season])
    }

    /// Case-insensitive exact player name lookup
    pub fn find_by_name(&self, name: &str) -> Result<Vec<PlayerRecord>> {
        self.query_records("WHERE LOWER(s.player) = LOWER(?)", params![name.trim()])
    }

    /// Case-insensitive exact club lookup
    pub fn find_by_club(&self, club: &str) -> Result<Vec<PlayerRecord>> {
        self.query_records("WHERE LOWER(s.club) = LOWER(?)", params![club.trim()])
    }

    fn query_records(&self, filter: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<PlayerRecord>> {
        let sql = format!(
            "{} {filter} ORDER BY s.season, s.club, s.id",
            RECORD_SELECT_SQL.as_str()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, row_to_record)?;
        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    pub fn counts(&self) -> Result<StoreCounts> {
        let players: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM player_stats", [], |row| row.get(0))?;
        let (valuations, available): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(status = 'available'), 0) FROM player_valuations",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(StoreCounts {
            players: players as usize,
            valuations: valuations as usize,
            available_valuations: available as usize,
        })
    }

    /// Delete a season's statistics and their valuations; returns rows removed
    pub fn clear_season(&mut self, season: Season) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM player_valuations
             WHERE player_id IN (SELECT id FROM player_stats WHERE season = ?)",
            params![season],
        )?;
        let removed = tx.execute("DELETE FROM player_stats WHERE season = ?", params![season])?;
        tx.commit()?;
        Ok(removed)
    }
}

fn batch_label(records: &[PlayerStatRecord]) -> String {
    match records.first() {
        Some(first) => first.club.clone(),
        None => "empty batch".to_string(),
    }
}

fn valuation_from_columns(
    status: Option<String>,
    amount: Option<f64>,
    currency: Option<String>,
) -> ValuationLookupResult {
    match (status.as_deref(), amount) {
        (Some("available"), Some(amount)) => {
            ValuationLookupResult::Available(MarketValue { amount, currency })
        }
        _ => ValuationLookupResult::Unavailable,
    }
}

fn row_to_record(row: &Row) -> rusqlite::Result<PlayerRecord> {
    let mut metrics = StatMetrics::new();
    for (offset, metric) in Metric::ALL.iter().enumerate() {
        metrics.set(*metric, row.get(FIRST_METRIC_COLUMN + offset)?);
    }

    let stats = PlayerStatRecord {
        player: row.get(1)?,
        club: row.get(2)?,
        season: row.get(3)?,
        position: row.get(4)?,
        nation: row.get(5)?,
        age: row.get(6)?,
        minutes: row.get(7)?,
        metrics,
    };

    Ok(PlayerRecord {
        key: row.get(0)?,
        stats,
        valuation: valuation_from_columns(
            row.get(VALUATION_COLUMN)?,
            row.get(VALUATION_COLUMN + 1)?,
            row.get(VALUATION_COLUMN + 2)?,
        ),
        valuation_source_url: row.get(VALUATION_COLUMN + 3)?,
        valued_at: row.get(VALUATION_COLUMN + 4)?,
    })
}
