use batch_pipeline::Keyed;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::de;
use super::stats::MatchStats;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerBootstrapMessage {
    pub player: PlayerBootstrap,
    pub season_id: i32,
}

impl Keyed for PlayerBootstrapMessage {
    type Key = (i32, i32);

    fn key(&self) -> (i32, i32) {
        (self.player.id, self.season_id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerBootstrap {
    pub id: i32,
    pub code: i32,
    pub first_name: String,
    pub second_name: String,
    pub web_name: String,
    #[serde(rename = "team")]
    pub team_id: i32,
    pub team_code: i32,
    pub element_type: i32,
    pub status: String,

    pub now_cost: i32,
    pub total_points: i32,
    pub event_points: i32,
    #[serde(deserialize_with = "de::decimal")]
    pub points_per_game: f64,
    #[serde(deserialize_with = "de::decimal")]
    pub form: f64,
    #[serde(deserialize_with = "de::decimal")]
    pub selected_by_percent: f64,

    #[serde(flatten)]
    pub stats: MatchStats,
}

/// All matches a player has played so far this season.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerHistoryMessage {
    pub player_id: i32,
    pub season_id: i32,
    #[serde(default)]
    pub history: Vec<PlayerHistory>,
}

impl Keyed for PlayerHistoryMessage {
    type Key = (i32, i32);

    fn key(&self) -> (i32, i32) {
        (self.player_id, self.season_id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerHistory {
    #[serde(rename = "fixture")]
    pub fixture_id: i32,
    #[serde(rename = "opponent_team")]
    pub opponent_team_id: i32,
    pub round: i32,
    #[serde(default, deserialize_with = "de::optional_timestamp")]
    pub kickoff_time: Option<DateTime<Utc>>,
    pub was_home: bool,
    pub team_h_score: Option<i32>,
    pub team_a_score: Option<i32>,
    #[serde(default)]
    pub modified: bool,

    pub total_points: i32,
    pub value: i32,
    pub transfers_balance: i32,
    pub selected: i32,
    pub transfers_in: i32,
    pub transfers_out: i32,

    #[serde(flatten)]
    pub stats: MatchStats,
}

/// Totals for every previous season a player appeared in. Keyed by the
/// player code, which is stable across seasons.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerPastMessage {
    pub player_code: i32,
    #[serde(default)]
    pub past_history: Vec<PlayerPastHistory>,
}

impl Keyed for PlayerPastMessage {
    type Key = i32;

    fn key(&self) -> i32 {
        self.player_code
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerPastHistory {
    pub season_name: String,
    pub start_cost: i32,
    pub end_cost: i32,
    pub total_points: i32,

    #[serde(flatten)]
    pub stats: MatchStats,
}
