use batch_pipeline::Keyed;
use serde::Deserialize;

/// Season-to-date statistics for one team in one league, as served by the
/// Sofascore team statistics endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TeamOverallStatsMessage {
    pub team_id: i32,
    pub league_id: i32,
    pub season_id: i32,
    pub statistics: TeamOverallStats,
}

impl Keyed for TeamOverallStatsMessage {
    type Key = (i32, i32, i32);

    fn key(&self) -> (i32, i32, i32) {
        (self.team_id, self.league_id, self.season_id)
    }
}

// Any figure the source leaves out reads as zero.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TeamOverallStats {
    pub matches: i32,
    pub awarded_matches: i32,

    pub goals_scored: i32,
    pub goals_conceded: i32,
    pub own_goals: i32,
    pub assists: i32,
    pub shots: i32,
    pub shots_on_target: i32,
    pub shots_off_target: i32,
    pub penalty_goals: i32,
    pub penalties_taken: i32,
    pub free_kick_goals: i32,
    #[serde(rename = "goalsFromInsideTheBox")]
    pub goals_from_inside_box: i32,
    #[serde(rename = "goalsFromOutsideTheBox")]
    pub goals_from_outside_box: i32,
    pub headed_goals: i32,
    pub big_chances: i32,
    pub big_chances_created: i32,
    pub big_chances_missed: i32,
    #[serde(rename = "hitWoodwork")]
    pub hit_woodwork: i32,
    pub successful_dribbles: i32,
    pub corners: i32,
    pub fast_breaks: i32,
    pub total_passes: i32,
    pub accurate_passes: i32,
    pub total_long_balls: i32,
    pub accurate_long_balls: i32,
    pub total_crosses: i32,
    pub accurate_crosses: i32,

    pub clean_sheets: i32,
    pub tackles: i32,
    pub interceptions: i32,
    pub saves: i32,
    pub clearances: i32,
    pub errors_leading_to_goal: i32,
    pub penalty_goals_conceded: i32,
    pub total_duels: i32,
    pub duels_won: i32,
    pub possession_lost: i32,
    pub offsides: i32,
    pub fouls: i32,
    pub yellow_cards: i32,
    pub red_cards: i32,

    pub average_ball_possession: f64,
    pub accurate_passes_percentage: f64,
    pub accurate_long_balls_percentage: f64,
    pub accurate_crosses_percentage: f64,
    pub duels_won_percentage: f64,
    pub avg_rating: f64,
}

impl TeamOverallStats {
    pub const COUNT_COLUMNS: [&'static str; 42] = [
        "matches",
        "awarded_matches",
        "goals_scored",
        "goals_conceded",
        "own_goals",
        "assists",
        "shots",
        "shots_on_target",
        "shots_off_target",
        "penalty_goals",
        "penalties_taken",
        "free_kick_goals",
        "goals_from_inside_box",
        "goals_from_outside_box",
        "headed_goals",
        "big_chances",
        "big_chances_created",
        "big_chances_missed",
        "hit_woodwork",
        "successful_dribbles",
        "corners",
        "fast_breaks",
        "total_passes",
        "accurate_passes",
        "total_long_balls",
        "accurate_long_balls",
        "total_crosses",
        "accurate_crosses",
        "clean_sheets",
        "tackles",
        "interceptions",
        "saves",
        "clearances",
        "errors_leading_to_goal",
        "penalty_goals_conceded",
        "total_duels",
        "duels_won",
        "possession_lost",
        "offsides",
        "fouls",
        "yellow_cards",
        "red_cards",
    ];

    pub const RATE_COLUMNS: [&'static str; 6] = [
        "average_ball_possession",
        "accurate_passes_percentage",
        "accurate_long_balls_percentage",
        "accurate_crosses_percentage",
        "duels_won_percentage",
        "avg_rating",
    ];

    /// Values in [`Self::COUNT_COLUMNS`] order.
    pub fn counts(&self) -> [i32; 42] {
        [
            self.matches,
            self.awarded_matches,
            self.goals_scored,
            self.goals_conceded,
            self.own_goals,
            self.assists,
            self.shots,
            self.shots_on_target,
            self.shots_off_target,
            self.penalty_goals,
            self.penalties_taken,
            self.free_kick_goals,
            self.goals_from_inside_box,
            self.goals_from_outside_box,
            self.headed_goals,
            self.big_chances,
            self.big_chances_created,
            self.big_chances_missed,
            self.hit_woodwork,
            self.successful_dribbles,
            self.corners,
            self.fast_breaks,
            self.total_passes,
            self.accurate_passes,
            self.total_long_balls,
            self.accurate_long_balls,
            self.total_crosses,
            self.accurate_crosses,
            self.clean_sheets,
            self.tackles,
            self.interceptions,
            self.saves,
            self.clearances,
            self.errors_leading_to_goal,
            self.penalty_goals_conceded,
            self.total_duels,
            self.duels_won,
            self.possession_lost,
            self.offsides,
            self.fouls,
            self.yellow_cards,
            self.red_cards,
        ]
    }

    /// Values in [`Self::RATE_COLUMNS`] order.
    pub fn rates(&self) -> [f64; 6] {
        [
            self.average_ball_possession,
            self.accurate_passes_percentage,
            self.accurate_long_balls_percentage,
            self.accurate_crosses_percentage,
            self.duels_won_percentage,
            self.avg_rating,
        ]
    }
}
