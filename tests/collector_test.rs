//! End-to-end collection runs against mocked sources

use pl_collector::{
    collector::{CancelFlag, ClubStatus, Collector, PlayerValuationStatus, RunState},
    config::{ClubTarget, FetchConfig, RunConfig},
    models::{MarketValue, ValuationLookupResult},
    storage::PlayerDatabase,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const MAN_CITY: &str = include_str!("fixtures/fbref_manchester_city.html");
const ARSENAL: &str = include_str!("fixtures/fbref_commented_table.html");
const HAALAND_RESULTS: &str = include_str!("fixtures/transfers_results_haaland.html");
const NO_RESULTS: &str = include_str!("fixtures/transfers_no_results.html");

const MAN_CITY_PATH: &str = "/en/squads/b8fd03ef/2024-2025/Manchester-City-Stats";
const ARSENAL_PATH: &str = "/en/squads/18bb7c10/2024-2025/Arsenal-Stats";

fn config_for(server: &MockServer) -> RunConfig {
    RunConfig {
        clubs: vec![
            ClubTarget::new("Arsenal", "18bb7c10"),
            ClubTarget::new("Manchester City", "b8fd03ef"),
        ],
        stats_base_url: server.uri(),
        valuation_base_url: server.uri(),
        fetch: FetchConfig {
            backoff_base_ms: 5,
            backoff_cap_ms: Some(20),
            ..FetchConfig::immediate()
        },
        ..RunConfig::default()
    }
}

async fn mount(server: &MockServer, page_path: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_season_run_with_retries_and_club_tie_break() {
    let server = MockServer::start().await;

    // Arsenal's page is rate limited once before it loads
    Mock::given(method("GET"))
        .and(path(ARSENAL_PATH))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount(&server, ARSENAL_PATH, 200, ARSENAL).await;
    mount(&server, MAN_CITY_PATH, 200, MAN_CITY).await;

    // the slug page lists two Erling Haalands; only the club can tell them apart
    mount(&server, "/en/players/erling-haaland", 200, HAALAND_RESULTS).await;
    mount(&server, "/en/players/rodri", 200, NO_RESULTS).await;
    mount(&server, "/en/players/rodri/profile", 200, NO_RESULTS).await;

    let mut db = PlayerDatabase::new_in_memory().unwrap();
    let collector = Collector::new(config_for(&server)).unwrap();
    let summary = collector.run(&mut db, &CancelFlag::new()).await;

    assert_eq!(summary.state, RunState::Done);
    assert_eq!(summary.counters.clubs_committed, 2);
    assert_eq!(summary.counters.players_committed, 7);
    assert_eq!(summary.counters.fetch_retries, 1);
    assert!(matches!(
        summary.clubs[0].status,
        ClubStatus::Committed { retries: 1, players: 2, .. }
    ));

    let haaland = summary
        .players
        .iter()
        .find(|p| p.player == "Erling Haaland")
        .unwrap();
    let PlayerValuationStatus::Valued {
        value,
        club_tie_break,
        ..
    } = &haaland.status
    else {
        panic!("expected a valuation for Haaland, got {:?}", haaland.status);
    };
    assert!(*club_tie_break);
    assert_eq!(*value, MarketValue::new(180_000_000.0, Some("EUR")));

    let stored = &db.find_by_name("Erling Haaland").unwrap()[0];
    assert_eq!(
        stored.valuation_source_url,
        Some(format!("{}/en/players/erling-haaland", server.uri()))
    );

    let rodri = &db.find_by_name("Rodri").unwrap()[0];
    assert_eq!(rodri.valuation, ValuationLookupResult::Unavailable);

    // every stored player got exactly one valuation row
    let counts = db.counts().unwrap();
    assert_eq!(counts.players, 7);
    assert_eq!(counts.valuations, 7);
    assert_eq!(counts.available_valuations, 1);
}

#[tokio::test]
async fn test_second_run_updates_in_place() {
    let server = MockServer::start().await;
    mount(&server, ARSENAL_PATH, 200, ARSENAL).await;
    mount(&server, MAN_CITY_PATH, 200, MAN_CITY).await;

    let mut db = PlayerDatabase::new_in_memory().unwrap();
    let collector = Collector::new(config_for(&server))
        .unwrap()
        .skip_valuations(true);

    let first = collector.run(&mut db, &CancelFlag::new()).await;
    let before = db.read_all().unwrap();
    let second = collector.run(&mut db, &CancelFlag::new()).await;
    let after = db.read_all().unwrap();

    assert_eq!(first.state, RunState::Done);
    assert_eq!(second.state, RunState::Done);
    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(&after) {
        assert_eq!(a.key, b.key);
        assert_eq!(a.stats, b.stats);
    }
}

#[tokio::test]
async fn test_server_errors_on_one_club_do_not_block_others() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ARSENAL_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;
    mount(&server, MAN_CITY_PATH, 200, MAN_CITY).await;

    let mut db = PlayerDatabase::new_in_memory().unwrap();
    let collector = Collector::new(config_for(&server))
        .unwrap()
        .skip_valuations(true);
    let summary = collector.run(&mut db, &CancelFlag::new()).await;

    assert_eq!(summary.state, RunState::Done);
    let ClubStatus::Skipped { reason } = &summary.clubs[0].status else {
        panic!("expected Arsenal to be skipped");
    };
    assert!(reason.contains("retry budget exhausted"));
    assert!(db.find_by_club("Arsenal").unwrap().is_empty());
    assert_eq!(db.find_by_club("Manchester City").unwrap().len(), 5);
}
