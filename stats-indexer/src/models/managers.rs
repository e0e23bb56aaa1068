use batch_pipeline::Keyed;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::de;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntryHistoryMessage {
    pub entry_history: EntryHistory,
    pub entry_id: i32,
    pub season_id: i32,
}

impl Keyed for EntryHistoryMessage {
    type Key = (i32, i32);

    fn key(&self) -> (i32, i32) {
        (self.entry_id, self.season_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntryHistory {
    #[serde(default)]
    pub current: Vec<EntryGameweek>,
    #[serde(default)]
    pub past: Vec<EntryPastSeason>,
    #[serde(default)]
    pub chips: Vec<EntryChip>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntryGameweek {
    pub event: i32,
    pub points: i32,
    pub total_points: i32,
    pub rank: Option<i32>,
    pub rank_sort: Option<i32>,
    pub overall_rank: Option<i32>,
    pub percentile_rank: Option<i32>,
    pub bank: i32,
    // tenths of a million
    pub value: i32,
    pub event_transfers: i32,
    pub event_transfers_cost: i32,
    pub points_on_bench: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntryPastSeason {
    pub season_name: String,
    pub total_points: i32,
    pub rank: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntryChip {
    pub name: String,
    #[serde(default, deserialize_with = "de::optional_timestamp")]
    pub time: Option<DateTime<Utc>>,
    pub event: i32,
}
