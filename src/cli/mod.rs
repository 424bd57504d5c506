//! CLI argument definitions and parsing.

pub mod types;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use types::Season;

/// Arguments for a collection run. Flags override values from `--config`.
#[derive(Debug, Default, Args)]
pub struct CollectArgs {
    /// Season to collect (e.g. 2024-2025, 2024/25 or 2024).
    #[clap(long, short)]
    pub season: Option<Season>,

    /// Keep only players with strictly more minutes than this (default 90).
    #[clap(long)]
    pub min_minutes: Option<u32>,

    /// JSON run configuration file.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// SQLite database path (or set `PL_COLLECTOR_DB` env var).
    #[clap(long)]
    pub db: Option<PathBuf>,

    /// Maximum in-flight fetches per stage.
    #[clap(long)]
    pub concurrency: Option<usize>,

    /// Only collect these clubs (repeatable): `--club Arsenal --club Chelsea`.
    #[clap(long = "club")]
    pub clubs: Vec<String>,

    /// Stop after statistics are committed.
    #[clap(long)]
    pub skip_valuations: bool,

    /// Delete the season's stored rows before collecting.
    #[clap(long)]
    pub clear: bool,

    /// Print the run summary as JSON instead of text lines.
    #[clap(long)]
    pub json: bool,
}

/// Arguments for reading the local store.
#[derive(Debug, Default, Args)]
pub struct ShowArgs {
    /// Player name (case-insensitive exact match).
    #[clap(long, short = 'n', conflicts_with = "club")]
    pub name: Option<String>,

    /// Club name (case-insensitive exact match).
    #[clap(long, short = 'c')]
    pub club: Option<String>,

    /// Only rows of this season.
    #[clap(long, short)]
    pub season: Option<Season>,

    /// Output results as JSON instead of text lines.
    #[clap(long)]
    pub json: bool,

    /// Also write the results to `<dir>/<query>.json`.
    #[clap(long)]
    pub export_dir: Option<PathBuf>,

    /// SQLite database path (or set `PL_COLLECTOR_DB` env var).
    #[clap(long)]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Parser)]
#[clap(
    name = "pl-collector",
    about = "Premier League statistics and market value collector"
)]
pub struct PlCollector {
    /// Log filter, e.g. `debug` or `pl_collector=trace` (default: `RUST_LOG`, else info).
    #[clap(long, global = true)]
    pub log_level: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scrape club statistics, then market values, into the local store.
    Collect {
        #[clap(flatten)]
        args: CollectArgs,
    },

    /// Print stored players with their valuation.
    Show {
        #[clap(flatten)]
        args: ShowArgs,
    },
}
