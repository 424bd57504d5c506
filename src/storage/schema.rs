//! Database schema and connection management

use crate::config::resolve_database_path;
use crate::models::Metric;
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Database connection manager for collected player data
pub struct PlayerDatabase {
    pub(crate) conn: Connection,
}

impl PlayerDatabase {
    /// Open the database at the resolved default location and ensure tables exist
    pub fn new() -> Result<Self> {
        let db_path = resolve_database_path(None)?;
        Self::open(&db_path)
    }

    /// Open (or create) the database file at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("opening database {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// Fresh in-memory database, used by tests and dry runs
    pub fn new_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize the database schema
    pub(crate) fn initialize_schema(&mut self) -> Result<()> {
        let metric_columns: String = Metric::ALL
            .iter()
            .map(|m| format!("{} REAL,\n", m.column()))
            .collect();

        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS player_stats (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    player TEXT NOT NULL,
                    club TEXT NOT NULL,
                    season TEXT NOT NULL,
                    position TEXT,
                    nation TEXT,
                    age INTEGER,
                    minutes INTEGER NOT NULL CHECK (minutes >= 0),
                    {metric_columns}
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    UNIQUE (player, club, season)
                )"
            ),
            [],
        )?;

        // One current valuation per stored player
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS player_valuations (
                player_id INTEGER PRIMARY KEY,
                status TEXT NOT NULL CHECK (status IN ('available', 'unavailable')),
                amount REAL,
                currency TEXT,
                source_url TEXT,
                collected_at INTEGER NOT NULL,
                FOREIGN KEY (player_id) REFERENCES player_stats(id) ON DELETE CASCADE
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_player_stats_season_club
             ON player_stats(season, club)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_player_stats_player_lower
             ON player_stats(LOWER(player))",
            [],
        )?;

        Ok(())
    }
}
