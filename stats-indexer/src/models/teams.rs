use batch_pipeline::Keyed;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TeamMessage {
    pub team: Team,
    pub season_id: i32,
}

impl Keyed for TeamMessage {
    type Key = (i32, i32);

    fn key(&self) -> (i32, i32) {
        (self.team.id, self.season_id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Team {
    pub id: i32,
    pub code: i32,
    pub name: String,
    pub short_name: String,

    pub strength: i32,
    pub form: Option<String>,
    pub position: i32,
    pub points: i32,
    pub played: i32,
    pub win: i32,
    pub draw: i32,
    pub loss: i32,

    pub team_division: Option<i32>,
    #[serde(default)]
    pub unavailable: bool,
    pub pulse_id: i32,

    pub strength_overall_home: i32,
    pub strength_overall_away: i32,
    pub strength_attack_home: i32,
    pub strength_attack_away: i32,
    pub strength_defence_home: i32,
    pub strength_defence_away: i32,
}
