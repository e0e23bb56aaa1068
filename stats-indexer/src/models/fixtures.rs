use batch_pipeline::Keyed;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::de;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FixtureMessage {
    pub fixture: Fixture,
    pub season_id: i32,
}

impl Keyed for FixtureMessage {
    type Key = (i32, i32);

    fn key(&self) -> (i32, i32) {
        (self.fixture.id, self.season_id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Fixture {
    pub id: i32,
    pub code: i32,
    // null until the fixture is scheduled into a gameweek
    pub event: Option<i32>,
    pub finished: bool,
    #[serde(default)]
    pub finished_provisional: bool,
    #[serde(default, deserialize_with = "de::optional_timestamp")]
    pub kickoff_time: Option<DateTime<Utc>>,
    pub minutes: i32,
    pub provisional_start_time: bool,
    #[serde(default)]
    pub started: Option<bool>,
    pub team_a: i32,
    pub team_a_score: Option<i32>,
    pub team_h: i32,
    pub team_h_score: Option<i32>,
    #[serde(default)]
    pub stats: Vec<FixtureStat>,
    pub team_h_difficulty: i32,
    pub team_a_difficulty: i32,
    pub pulse_id: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FixtureStat {
    pub identifier: String,
    #[serde(default)]
    pub a: Vec<StatElement>,
    #[serde(default)]
    pub h: Vec<StatElement>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatElement {
    pub value: i32,
    pub element: i32,
}
