use serde::Deserialize;

use super::de;

/// Per-player performance figures. The same block appears in bootstrap
/// season totals, per-match history and past-season history.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MatchStats {
    pub minutes: i32,
    pub goals_scored: i32,
    pub assists: i32,
    pub clean_sheets: i32,
    pub goals_conceded: i32,
    pub own_goals: i32,
    pub penalties_saved: i32,
    pub penalties_missed: i32,
    pub yellow_cards: i32,
    pub red_cards: i32,
    pub saves: i32,
    pub bonus: i32,
    pub bps: i32,
    #[serde(default)]
    pub starts: i32,

    #[serde(deserialize_with = "de::decimal")]
    pub influence: f64,
    #[serde(deserialize_with = "de::decimal")]
    pub creativity: f64,
    #[serde(deserialize_with = "de::decimal")]
    pub threat: f64,
    #[serde(deserialize_with = "de::decimal")]
    pub ict_index: f64,

    // Expected stats only exist from 2022/23 onwards.
    #[serde(default, deserialize_with = "de::decimal")]
    pub expected_goals: f64,
    #[serde(default, deserialize_with = "de::decimal")]
    pub expected_assists: f64,
    #[serde(default, deserialize_with = "de::decimal")]
    pub expected_goal_involvements: f64,
    #[serde(default, deserialize_with = "de::decimal")]
    pub expected_goals_conceded: f64,
}

impl MatchStats {
    pub const COUNT_COLUMNS: [&'static str; 14] = [
        "minutes",
        "goals_scored",
        "assists",
        "clean_sheets",
        "goals_conceded",
        "own_goals",
        "penalties_saved",
        "penalties_missed",
        "yellow_cards",
        "red_cards",
        "saves",
        "bonus",
        "bps",
        "starts",
    ];

    pub const DECIMAL_COLUMNS: [&'static str; 8] = [
        "influence",
        "creativity",
        "threat",
        "ict_index",
        "expected_goals",
        "expected_assists",
        "expected_goal_involvements",
        "expected_goals_conceded",
    ];

    /// Values in [`Self::COUNT_COLUMNS`] order.
    pub fn counts(&self) -> [i32; 14] {
        [
            self.minutes,
            self.goals_scored,
            self.assists,
            self.clean_sheets,
            self.goals_conceded,
            self.own_goals,
            self.penalties_saved,
            self.penalties_missed,
            self.yellow_cards,
            self.red_cards,
            self.saves,
            self.bonus,
            self.bps,
            self.starts,
        ]
    }

    /// Values in [`Self::DECIMAL_COLUMNS`] order.
    pub fn decimals(&self) -> [f64; 8] {
        [
            self.influence,
            self.creativity,
            self.threat,
            self.ict_index,
            self.expected_goals,
            self.expected_assists,
            self.expected_goal_involvements,
            self.expected_goals_conceded,
        ]
    }
}
