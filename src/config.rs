//! Run configuration.
//!
//! Everything a collection run needs is carried in an explicit [`RunConfig`]
//! value: the target season, the minutes threshold, the clubs to walk, and the
//! [`FetchConfig`] handed to the HTTP client at construction. Values come from
//! an optional JSON file (every field has a default) and are then overridden by
//! command-line flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::try_read_to_string;
use crate::error::{CollectorError, Result};
use crate::{Season, DB_PATH_ENV_VAR};

pub const FBREF_BASE_URL: &str = "https://fbref.com";
pub const FOOTBALL_TRANSFERS_BASE_URL: &str = "https://www.footballtransfers.com";

/// Desktop Chrome identity sent on every request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0 Safari/537.36";

/// Politeness and retry policy for the resilient fetch client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Lower bound of the randomized pre-request delay.
    pub min_delay_ms: u64,
    /// Upper bound of the randomized pre-request delay.
    pub max_delay_ms: u64,
    /// Backoff before retry `n` is `backoff_base_ms * 2^n`.
    pub backoff_base_ms: u64,
    /// Optional ceiling for a single backoff sleep.
    pub backoff_cap_ms: Option<u64>,
    /// Total attempts per URL, including the first one.
    pub max_attempts: u32,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 1_000,
            max_delay_ms: 3_000,
            backoff_base_ms: 1_500,
            backoff_cap_ms: Some(30_000),
            max_attempts: 3,
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    /// Zero-delay policy for tests against a local mock server.
    pub fn immediate() -> Self {
        Self {
            min_delay_ms: 0,
            max_delay_ms: 0,
            backoff_base_ms: 1,
            backoff_cap_ms: Some(20),
            max_attempts: 3,
            timeout_secs: 5,
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backoff slept before retrying after failed attempt number `after_attempt` (1-based).
    pub fn backoff_for(&self, after_attempt: u32) -> Duration {
        let exp = after_attempt.saturating_sub(1).min(32);
        let raw = self.backoff_base_ms.saturating_mul(1u64 << exp);
        let capped = match self.backoff_cap_ms {
            Some(cap) => raw.min(cap),
            None => raw,
        };
        Duration::from_millis(capped)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(CollectorError::Config {
                message: "max_attempts must be at least 1".to_string(),
            });
        }
        if self.min_delay_ms > self.max_delay_ms {
            return Err(CollectorError::Config {
                message: format!(
                    "min_delay_ms ({}) exceeds max_delay_ms ({})",
                    self.min_delay_ms, self.max_delay_ms
                ),
            });
        }
        Ok(())
    }
}

/// One club to collect statistics for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubTarget {
    /// Club name as stored with every statistics row.
    pub name: String,
    /// FBref squad identifier (the hex segment of the squad URL).
    pub squad_id: String,
}

impl ClubTarget {
    pub fn new(name: impl Into<String>, squad_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            squad_id: squad_id.into(),
        }
    }

    /// URL path segment FBref uses for the squad page, e.g. `Manchester-City`.
    pub fn url_slug(&self) -> String {
        self.name
            .split_whitespace()
            .map(|part| part.replace('\'', ""))
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn stats_url(&self, base_url: &str, season: Season) -> String {
        format!(
            "{}/en/squads/{}/{}/{}-Stats",
            base_url.trim_end_matches('/'),
            self.squad_id,
            season,
            self.url_slug()
        )
    }
}

/// Premier League clubs of the default season.
pub fn default_clubs() -> Vec<ClubTarget> {
    [
        ("Arsenal", "18bb7c10"),
        ("Aston Villa", "8602292d"),
        ("Bournemouth", "4ba7cbea"),
        ("Brentford", "cd051869"),
        ("Brighton and Hove Albion", "d07537b9"),
        ("Chelsea", "cff3d9bb"),
        ("Crystal Palace", "47c64c55"),
        ("Everton", "d3fd31cc"),
        ("Fulham", "fd962109"),
        ("Ipswich Town", "b74092de"),
        ("Leicester City", "a2d435b3"),
        ("Liverpool", "822bd0ba"),
        ("Manchester City", "b8fd03ef"),
        ("Manchester United", "19538871"),
        ("Newcastle United", "b2b47a98"),
        ("Nottingham Forest", "e4a775cb"),
        ("Southampton", "33c895d4"),
        ("Tottenham Hotspur", "361ca564"),
        ("West Ham United", "7c21e445"),
        ("Wolverhampton Wanderers", "8cec06e1"),
    ]
    .into_iter()
    .map(|(name, id)| ClubTarget::new(name, id))
    .collect()
}

/// Parameters of one collection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub season: Season,
    /// Rows with minutes played at or below this value are never persisted.
    pub min_minutes: u32,
    pub clubs: Vec<ClubTarget>,
    /// Upper bound on in-flight fetches within a stage.
    pub concurrency: usize,
    pub stats_base_url: String,
    pub valuation_base_url: String,
    pub fetch: FetchConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            season: Season::default(),
            min_minutes: 90,
            clubs: default_clubs(),
            concurrency: 2,
            stats_base_url: FBREF_BASE_URL.to_string(),
            valuation_base_url: FOOTBALL_TRANSFERS_BASE_URL.to_string(),
            fetch: FetchConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load from a JSON file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = try_read_to_string(path).ok_or_else(|| CollectorError::Config {
            message: format!("could not read config file {}", path.display()),
        })?;
        let config: RunConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.fetch.validate()?;
        if self.concurrency == 0 {
            return Err(CollectorError::Config {
                message: "concurrency must be at least 1".to_string(),
            });
        }
        if self.clubs.is_empty() {
            return Err(CollectorError::Config {
                message: "no clubs configured".to_string(),
            });
        }
        Ok(())
    }
}

/// Resolve the SQLite path: explicit flag, then `PL_COLLECTOR_DB`, then the
/// platform data directory.
pub fn resolve_database_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Ok(path) = std::env::var(DB_PATH_ENV_VAR) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let base = dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .ok_or_else(|| CollectorError::Config {
            message: "Could not determine data directory".to_string(),
        })?;
    Ok(base.join("pl-collector").join("players.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let cfg = FetchConfig {
            backoff_base_ms: 100,
            backoff_cap_ms: Some(350),
            ..FetchConfig::default()
        };
        assert_eq!(cfg.backoff_for(1), Duration::from_millis(100));
        assert_eq!(cfg.backoff_for(2), Duration::from_millis(200));
        assert_eq!(cfg.backoff_for(3), Duration::from_millis(350));
        assert_eq!(cfg.backoff_for(10), Duration::from_millis(350));
    }

    #[test]
    fn test_backoff_uncapped_saturates() {
        let cfg = FetchConfig {
            backoff_base_ms: u64::MAX / 2,
            backoff_cap_ms: None,
            ..FetchConfig::default()
        };
        assert_eq!(cfg.backoff_for(40), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_fetch_config_validation() {
        let mut cfg = FetchConfig::default();
        assert!(cfg.validate().is_ok());

        cfg.max_attempts = 0;
        assert!(cfg.validate().is_err());

        cfg.max_attempts = 2;
        cfg.min_delay_ms = 10;
        cfg.max_delay_ms = 5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_club_stats_url() {
        let club = ClubTarget::new("Manchester City", "b8fd03ef");
        assert_eq!(
            club.stats_url("https://fbref.com/", Season::new(2024)),
            "https://fbref.com/en/squads/b8fd03ef/2024-2025/Manchester-City-Stats"
        );
    }

    #[test]
    fn test_default_run_config() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.min_minutes, 90);
        assert_eq!(cfg.clubs.len(), 20);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"season": "2023/24", "min_minutes": 200,
                "clubs": [{{"name": "Arsenal", "squad_id": "18bb7c10"}}],
                "fetch": {{"max_attempts": 5}}}}"#
        )
        .unwrap();

        let cfg = RunConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.season, Season::new(2023));
        assert_eq!(cfg.min_minutes, 200);
        assert_eq!(cfg.clubs.len(), 1);
        assert_eq!(cfg.fetch.max_attempts, 5);
        assert_eq!(cfg.fetch.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(cfg.concurrency, 2);
    }

    #[test]
    fn test_load_rejects_empty_club_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"clubs": []}}"#).unwrap();
        assert!(RunConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = RunConfig::load(Some(Path::new("/definitely/not/here.json")));
        assert!(matches!(result, Err(CollectorError::Config { .. })));
    }

    #[test]
    fn test_explicit_database_path_wins() {
        let path = resolve_database_path(Some(PathBuf::from("/tmp/x.db"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/x.db"));
    }
}
