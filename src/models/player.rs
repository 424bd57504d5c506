//! Per-player season statistics.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::Season;

/// Numeric columns kept from FBref's "Standard Stats" table.
///
/// Each metric knows the `data-stat` attribute FBref uses for its cell and the
/// column it is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    MatchesPlayed,
    Starts,
    Goals,
    Assists,
    GoalsAssists,
    NonPenaltyGoals,
    PenaltiesMade,
    PenaltiesAttempted,
    YellowCards,
    RedCards,
    ExpectedGoals,
    NonPenaltyExpectedGoals,
    ExpectedAssists,
    ProgressiveCarries,
    ProgressivePasses,
    ProgressivePassesReceived,
}

impl Metric {
    pub const COUNT: usize = 16;

    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::MatchesPlayed,
        Metric::Starts,
        Metric::Goals,
        Metric::Assists,
        Metric::GoalsAssists,
        Metric::NonPenaltyGoals,
        Metric::PenaltiesMade,
        Metric::PenaltiesAttempted,
        Metric::YellowCards,
        Metric::RedCards,
        Metric::ExpectedGoals,
        Metric::NonPenaltyExpectedGoals,
        Metric::ExpectedAssists,
        Metric::ProgressiveCarries,
        Metric::ProgressivePasses,
        Metric::ProgressivePassesReceived,
    ];

    /// FBref `data-stat` attribute of the cell holding this metric.
    pub fn data_stat(&self) -> &'static str {
        match self {
            Metric::MatchesPlayed => "games",
            Metric::Starts => "games_starts",
            Metric::Goals => "goals",
            Metric::Assists => "assists",
            Metric::GoalsAssists => "goals_assists",
            Metric::NonPenaltyGoals => "goals_pens",
            Metric::PenaltiesMade => "pens_made",
            Metric::PenaltiesAttempted => "pens_att",
            Metric::YellowCards => "cards_yellow",
            Metric::RedCards => "cards_red",
            Metric::ExpectedGoals => "xg",
            Metric::NonPenaltyExpectedGoals => "npxg",
            Metric::ExpectedAssists => "xg_assist",
            Metric::ProgressiveCarries => "progressive_carries",
            Metric::ProgressivePasses => "progressive_passes",
            Metric::ProgressivePassesReceived => "progressive_passes_received",
        }
    }

    /// Column name in `player_stats`.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::MatchesPlayed => "matches_played",
            Metric::Starts => "starts",
            Metric::Goals => "goals",
            Metric::Assists => "assists",
            Metric::GoalsAssists => "goals_assists",
            Metric::NonPenaltyGoals => "non_penalty_goals",
            Metric::PenaltiesMade => "penalties_made",
            Metric::PenaltiesAttempted => "penalties_attempted",
            Metric::YellowCards => "yellow_cards",
            Metric::RedCards => "red_cards",
            Metric::ExpectedGoals => "xg",
            Metric::NonPenaltyExpectedGoals => "npxg",
            Metric::ExpectedAssists => "xag",
            Metric::ProgressiveCarries => "progressive_carries",
            Metric::ProgressivePasses => "progressive_passes",
            Metric::ProgressivePassesReceived => "progressive_passes_received",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Fixed metric set for one player. `None` means "not available", which is
/// distinct from a recorded zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatMetrics {
    values: [Option<f64>; Metric::COUNT],
}

impl StatMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values[metric.index()]
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        self.values[metric.index()] = value;
    }

    /// Builder-style setter, mostly for tests and fixtures.
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, Some(value));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, Option<f64>)> + '_ {
        Metric::ALL.iter().map(move |m| (*m, self.get(*m)))
    }

    pub fn available_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

impl Serialize for StatMetrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Metric::COUNT))?;
        for (metric, value) in self.iter() {
            map.serialize_entry(metric.column(), &value)?;
        }
        map.end()
    }
}

/// One player's statistics for one club and season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStatRecord {
    /// Spelling as published by the statistics source.
    pub player: String,
    pub club: String,
    pub season: Season,
    pub position: Option<String>,
    pub nation: Option<String>,
    pub age: Option<u8>,
    pub minutes: u32,
    pub metrics: StatMetrics,
}

impl PlayerStatRecord {
    pub fn new(player: impl Into<String>, club: impl Into<String>, season: Season, minutes: u32) -> Self {
        Self {
            player: player.into(),
            club: club.into(),
            season,
            position: None,
            nation: None,
            age: None,
            minutes,
            metrics: StatMetrics::new(),
        }
    }

    pub fn with_metric(mut self, metric: Metric, value: f64) -> Self {
        self.metrics.set(metric, Some(value));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_index_matches_all_order() {
        for (i, metric) in Metric::ALL.iter().enumerate() {
            assert_eq!(metric.index(), i);
        }
    }

    #[test]
    fn test_metric_columns_are_unique() {
        let mut cols: Vec<_> = Metric::ALL.iter().map(|m| m.column()).collect();
        cols.sort();
        cols.dedup();
        assert_eq!(cols.len(), Metric::COUNT);
    }

    #[test]
    fn test_zero_is_not_missing() {
        let metrics = StatMetrics::new().with(Metric::Goals, 0.0);
        assert_eq!(metrics.get(Metric::Goals), Some(0.0));
        assert_eq!(metrics.get(Metric::Assists), None);
        assert_eq!(metrics.available_count(), 1);
    }

    #[test]
    fn test_metrics_serialize_as_column_map() {
        let metrics = StatMetrics::new().with(Metric::ExpectedGoals, 31.2);
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["xg"], 31.2);
        assert!(json["goals"].is_null());
        assert_eq!(json.as_object().unwrap().len(), Metric::COUNT);
    }
}
