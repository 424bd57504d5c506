//! Premier League statistics and market value collector
//!
//! Scrapes per-player season statistics from FBref squad pages, looks each
//! player up on FootballTransfers for a market valuation, reconciles the two
//! identities and stores the merged result in SQLite.
//!
//! ## Pipeline
//!
//! - **Fetching** ([`core::FetchClient`]): politeness delay, browser
//!   `User-Agent`, exponential backoff on 429/5xx/network errors
//! - **Parsing** ([`sources`]): FBref "Standard Stats" tables and
//!   FootballTransfers profile or result-list pages
//! - **Reconciliation** ([`reconcile`]): tiered name matching with a club
//!   tie-break
//! - **Storage** ([`storage::PlayerDatabase`]): atomic per-club upserts and a
//!   read contract where a missing valuation reads as "N/a"
//! - **Orchestration** ([`collector::Collector`]): bounded-concurrency stages
//!   and a [`collector::RunSummary`] per run
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pl_collector::{collector::{CancelFlag, Collector}, config::RunConfig, storage::PlayerDatabase};
//!
//! # async fn example() -> pl_collector::Result<()> {
//! let mut db = PlayerDatabase::new_in_memory()?;
//! let collector = Collector::new(RunConfig::default())?;
//! let summary = collector.run(&mut db, &CancelFlag::new()).await;
//! println!("{}", summary.state);
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Configuration
//!
//! Point the CLI at a database without passing `--db` every time:
//! ```bash
//! export PL_COLLECTOR_DB=$HOME/football/players.db
//! ```

pub mod cli;
pub mod collector;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod sources;
pub mod storage;

// Re-export commonly used types
pub use cli::types::{ids::PlayerKey, time::Season};
pub use error::{CollectorError, Result};

pub const DB_PATH_ENV_VAR: &str = "PL_COLLECTOR_DB";
