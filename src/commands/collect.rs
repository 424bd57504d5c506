//! `collect`: run the pipeline and print its summary.

use tracing::info;

use super::common::open_database;
use crate::{
    cli::CollectArgs,
    collector::{CancelFlag, ClubStatus, Collector, PlayerValuationStatus, RunSummary},
    config::RunConfig,
    error::CollectorError,
    Result,
};

/// Build the run configuration: file (or defaults), then CLI overrides.
pub fn build_run_config(args: &CollectArgs) -> Result<RunConfig> {
    let mut config = RunConfig::load(args.config.as_deref())?;

    if let Some(season) = args.season {
        config.season = season;
    }
    if let Some(min_minutes) = args.min_minutes {
        config.min_minutes = min_minutes;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }

    if !args.clubs.is_empty() {
        let mut selected = Vec::with_capacity(args.clubs.len());
        for wanted in &args.clubs {
            let club = config
                .clubs
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(wanted.trim()))
                .ok_or_else(|| CollectorError::Config {
                    message: format!("unknown club '{wanted}'"),
                })?;
            if !selected.contains(club) {
                selected.push(club.clone());
            }
        }
        config.clubs = selected;
    }

    config.validate()?;
    Ok(config)
}

/// Run a collection and return its summary; the caller decides the exit code.
pub async fn handle_collect(args: CollectArgs, cancel: CancelFlag) -> Result<RunSummary> {
    let config = build_run_config(&args)?;
    let mut db = open_database(args.db.clone())?;

    if args.clear {
        let removed = db.clear_season(config.season)?;
        info!(season = %config.season, removed, "cleared stored season");
    }

    let collector = Collector::new(config)?.skip_valuations(args.skip_valuations);
    let summary = collector.run(&mut db, &cancel).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in summary_lines(&summary) {
            println!("{line}");
        }
    }
    Ok(summary)
}

/// Human-readable run summary.
pub fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let mut lines = Vec::new();
    for club in &summary.clubs {
        let detail = match &club.status {
            ClubStatus::Committed {
                players,
                dropped_for_minutes,
                malformed_rows,
                retries,
            } => format!(
                "✓ {players} players ({dropped_for_minutes} under minutes, {malformed_rows} malformed, {retries} retries)"
            ),
            ClubStatus::Skipped { reason } => format!("✗ skipped: {reason}"),
            ClubStatus::CommitFailed { reason } => format!("✗ commit failed: {reason}"),
            ClubStatus::NotCommitted => "- not committed".to_string(),
            ClubStatus::Cancelled => "- cancelled".to_string(),
        };
        lines.push(format!("{:<26} {detail}", club.club));
    }

    let unmatched = summary
        .players
        .iter()
        .filter(|p| matches!(p.status, PlayerValuationStatus::Unavailable { .. }))
        .count();
    let c = &summary.counters;
    lines.push(format!(
        "Clubs: {} committed, {} skipped | Players: {} | Valuations: {} available, {} unavailable ({} lookups unmatched, {} cache hits)",
        c.clubs_committed,
        c.clubs_skipped,
        c.players_committed,
        c.valuations_available,
        c.valuations_unavailable,
        unmatched,
        c.valuation_cache_hits,
    ));
    lines.push(format!("Run {}", summary.state));
    lines
}
