//! Integration tests for the persistence layer

use pl_collector::{
    models::{MarketValue, Metric, PlayerStatRecord, ValuationLookupResult},
    storage::*,
    Season,
};

fn record(player: &str, club: &str, minutes: u32) -> PlayerStatRecord {
    PlayerStatRecord::new(player, club, Season::new(2024), minutes)
}

fn club_batch(club: &str) -> Vec<PlayerStatRecord> {
    (1..=5)
        .map(|i| record(&format!("Player {i}"), club, 1000 + i))
        .collect()
}

#[test]
fn test_file_database_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("players.db");

    let key = {
        let mut db = PlayerDatabase::open(&path).unwrap();
        let haaland = record("Erling Haaland", "Manchester City", 2500)
            .with_metric(Metric::Goals, 27.0);
        let key = db.upsert_stats(&[haaland]).unwrap()[0];
        db.upsert_valuation(
            key,
            &ValuationLookupResult::Available(MarketValue::new(1.8e8, Some("EUR"))),
            Some("https://www.footballtransfers.com/en/players/erling-haaland"),
        )
        .unwrap();
        key
    };

    let db = PlayerDatabase::open(&path).unwrap();
    let records = db.find_by_name("erling haaland").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key, key);
    assert_eq!(records[0].stats.minutes, 2500);
    assert_eq!(records[0].stats.metrics.get(Metric::Goals), Some(27.0));
    assert_eq!(records[0].valuation.to_string(), "EUR 180.0M");
}

#[test]
fn test_failing_row_rolls_back_its_club_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("players.db");

    let mut db = PlayerDatabase::open(&path).unwrap();
    db.upsert_stats(&club_batch("Arsenal")).unwrap();

    // a second connection installs a trigger that rejects the third Chelsea row
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_row BEFORE INSERT ON player_stats
         WHEN NEW.club = 'Chelsea' AND NEW.player = 'Player 3'
         BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
    )
    .unwrap();
    drop(conn);

    let err = db.upsert_stats(&club_batch("Chelsea")).unwrap_err();
    assert!(err.to_string().contains("Chelsea"));

    assert!(db.find_by_club("Chelsea").unwrap().is_empty());
    assert_eq!(db.find_by_club("Arsenal").unwrap().len(), 5);
    assert_eq!(db.counts().unwrap().players, 5);
}

#[test]
fn test_rerun_leaves_single_row_per_natural_key() {
    let mut db = PlayerDatabase::new_in_memory().unwrap();
    for _ in 0..3 {
        db.upsert_stats(&club_batch("Fulham")).unwrap();
    }
    let season = db.players_for_season(Season::new(2024)).unwrap();
    assert_eq!(season.len(), 5);
    assert_eq!(season[0].club, "Fulham");
}

#[test]
fn test_read_contract_defaults_to_unavailable() {
    let mut db = PlayerDatabase::new_in_memory().unwrap();
    db.upsert_stats(&club_batch("Everton")).unwrap();

    for record in db.read_all().unwrap() {
        assert_eq!(record.valuation, ValuationLookupResult::Unavailable);
        assert_eq!(record.valuation.to_string(), "N/a");
        assert!(record.valuation_source_url.is_none());
    }
}
