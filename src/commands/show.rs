//! `show`: read stored players back through the read contract.

use std::path::{Path, PathBuf};

use super::common::{open_database, sanitize_key};
use crate::{
    cli::ShowArgs,
    core::write_string,
    models::Metric,
    storage::{PlayerDatabase, PlayerRecord},
    Result,
};

/// Query the store according to `args`.
pub fn select_records(db: &PlayerDatabase, args: &ShowArgs) -> Result<Vec<PlayerRecord>> {
    let mut records = match (&args.name, &args.club, args.season) {
        (Some(name), _, _) => db.find_by_name(name)?,
        (None, Some(club), _) => db.find_by_club(club)?,
        (None, None, Some(season)) => db.read_season(season)?,
        (None, None, None) => db.read_all()?,
    };
    if let Some(season) = args.season {
        records.retain(|r| r.stats.season == season);
    }
    Ok(records)
}

pub fn handle_show(args: ShowArgs) -> Result<()> {
    let db = open_database(args.db.clone())?;
    let records = select_records(&db, &args)?;

    if let Some(dir) = &args.export_dir {
        let path = export_path(dir, &args);
        write_string(&path, &serde_json::to_string_pretty(&records)?)?;
        println!("Wrote {} records to {}", records.len(), path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No players found.");
        return Ok(());
    }
    for record in &records {
        println!("{}", format_record(record));
    }
    Ok(())
}

/// Export file for a query, named after the query key.
pub fn export_path(dir: &Path, args: &ShowArgs) -> PathBuf {
    let key = args
        .name
        .as_deref()
        .or(args.club.as_deref())
        .unwrap_or("all");
    let file = match args.season {
        Some(season) => format!("{}_{}.json", sanitize_key(key), season),
        None => format!("{}.json", sanitize_key(key)),
    };
    dir.join(file)
}

/// One text line per player.
pub fn format_record(record: &PlayerRecord) -> String {
    let stats = &record.stats;
    let metric = |m: Metric| match stats.metrics.get(m) {
        Some(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => format!("{v:.1}"),
        None => "-".to_string(),
    };
    format!(
        "{} ({}, {}) {} {} min | G {} A {} xG {} xAG {} | value: {}",
        stats.player,
        stats.club,
        stats.season,
        stats.position.as_deref().unwrap_or("?"),
        stats.minutes,
        metric(Metric::Goals),
        metric(Metric::Assists),
        metric(Metric::ExpectedGoals),
        metric(Metric::ExpectedAssists),
        record.valuation,
    )
}
