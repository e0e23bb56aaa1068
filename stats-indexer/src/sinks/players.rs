use async_trait::async_trait;
use batch_pipeline::{RecordWriter, Sink};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::unnest::{
    last_per_key, record_upserted, stat_columns, upsert_statement, Column, StatColumns,
};
use crate::models::{PlayerBootstrapMessage, PlayerHistoryMessage, PlayerPastMessage};

const PLAYERS: &str = "players";
const PLAYER_GAMEWEEK_STATS: &str = "player_gameweek_stats";
const PLAYER_PAST_SEASONS: &str = "player_past_seasons";

const PLAYER_COLUMNS: &[Column] = &[
    ("player_id", "int"),
    ("season_id", "int"),
    ("player_code", "int"),
    ("first_name", "text"),
    ("second_name", "text"),
    ("web_name", "text"),
    ("team_id", "int"),
    ("team_code", "int"),
    ("element_type_id", "int"),
    ("status", "text"),
    ("now_cost", "int"),
    ("total_points", "int"),
    ("event_points", "int"),
    ("points_per_game", "float8"),
    ("form", "float8"),
    ("selected_by_percent", "float8"),
];

const GAMEWEEK_COLUMNS: &[Column] = &[
    ("player_id", "int"),
    ("fixture_id", "int"),
    ("season_id", "int"),
    ("event", "int"),
    ("opponent_team_id", "int"),
    ("kickoff_time", "timestamptz"),
    ("was_home", "bool"),
    ("team_h_score", "int"),
    ("team_a_score", "int"),
    ("modified", "bool"),
    ("total_points", "int"),
    ("value", "int"),
    ("transfers_balance", "int"),
    ("selected", "int"),
    ("transfers_in", "int"),
    ("transfers_out", "int"),
];

const PAST_SEASON_COLUMNS: &[Column] = &[
    ("player_code", "int"),
    ("season_name", "text"),
    ("start_cost", "int"),
    ("end_cost", "int"),
    ("total_points", "int"),
];

fn with_stats(columns: &[Column]) -> Vec<Column> {
    let mut all = columns.to_vec();
    all.extend(stat_columns());
    all
}

/// Upserts the season snapshot of each player from the bootstrap feed.
pub struct PlayerSink {
    pool: PgPool,
    sql: String,
}

impl PlayerSink {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            sql: upsert_statement(
                PLAYERS,
                &with_stats(PLAYER_COLUMNS),
                &["player_id", "season_id"],
            ),
        }
    }
}

#[derive(Debug, Default)]
struct PlayerColumns {
    player_id: Vec<i32>,
    season_id: Vec<i32>,
    code: Vec<i32>,
    first_name: Vec<String>,
    second_name: Vec<String>,
    web_name: Vec<String>,
    team_id: Vec<i32>,
    team_code: Vec<i32>,
    element_type: Vec<i32>,
    status: Vec<String>,
    now_cost: Vec<i32>,
    total_points: Vec<i32>,
    event_points: Vec<i32>,
    points_per_game: Vec<f64>,
    form: Vec<f64>,
    selected_by_percent: Vec<f64>,
    stats: StatColumns,
}

impl PlayerColumns {
    fn from_batch(batch: Vec<PlayerBootstrapMessage>) -> Self {
        let mut columns = Self::default();
        for PlayerBootstrapMessage { player, season_id } in batch {
            columns.stats.push(&player.stats);
            columns.player_id.push(player.id);
            columns.season_id.push(season_id);
            columns.code.push(player.code);
            columns.first_name.push(player.first_name);
            columns.second_name.push(player.second_name);
            columns.web_name.push(player.web_name);
            columns.team_id.push(player.team_id);
            columns.team_code.push(player.team_code);
            columns.element_type.push(player.element_type);
            columns.status.push(player.status);
            columns.now_cost.push(player.now_cost);
            columns.total_points.push(player.total_points);
            columns.event_points.push(player.event_points);
            columns.points_per_game.push(player.points_per_game);
            columns.form.push(player.form);
            columns.selected_by_percent.push(player.selected_by_percent);
        }
        columns
    }
}

#[async_trait]
impl Sink<PlayerBootstrapMessage> for PlayerSink {
    type Error = sqlx::Error;

    async fn write_batch(&self, items: Vec<PlayerBootstrapMessage>) -> Result<(), sqlx::Error> {
        let rows = items.len();
        let columns = PlayerColumns::from_batch(items);

        let query = sqlx::query(&self.sql)
            .bind(columns.player_id)
            .bind(columns.season_id)
            .bind(columns.code)
            .bind(columns.first_name)
            .bind(columns.second_name)
            .bind(columns.web_name)
            .bind(columns.team_id)
            .bind(columns.team_code)
            .bind(columns.element_type)
            .bind(columns.status)
            .bind(columns.now_cost)
            .bind(columns.total_points)
            .bind(columns.event_points)
            .bind(columns.points_per_game)
            .bind(columns.form)
            .bind(columns.selected_by_percent);
        let query = columns.stats.bind(query);

        let mut tx = self.pool.begin().await?;
        query.execute(&mut *tx).await?;
        tx.commit().await?;

        record_upserted(PLAYERS, rows);
        Ok(())
    }
}

/// Writes one player's match history per call. A player whose history fails
/// to write does not hold back the rest of the batch.
pub struct PlayerHistoryWriter {
    pool: PgPool,
    sql: String,
}

impl PlayerHistoryWriter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            sql: upsert_statement(
                PLAYER_GAMEWEEK_STATS,
                &with_stats(GAMEWEEK_COLUMNS),
                &["player_id", "fixture_id", "season_id"],
            ),
        }
    }
}

#[derive(Debug, Default)]
struct GameweekColumns {
    player_id: Vec<i32>,
    fixture_id: Vec<i32>,
    season_id: Vec<i32>,
    event: Vec<i32>,
    opponent_team_id: Vec<i32>,
    kickoff_time: Vec<Option<DateTime<Utc>>>,
    was_home: Vec<bool>,
    team_h_score: Vec<Option<i32>>,
    team_a_score: Vec<Option<i32>>,
    modified: Vec<bool>,
    total_points: Vec<i32>,
    value: Vec<i32>,
    transfers_balance: Vec<i32>,
    selected: Vec<i32>,
    transfers_in: Vec<i32>,
    transfers_out: Vec<i32>,
    stats: StatColumns,
}

impl GameweekColumns {
    fn from_message(message: PlayerHistoryMessage) -> Self {
        let PlayerHistoryMessage {
            player_id,
            season_id,
            history,
        } = message;

        let mut columns = Self::default();
        for h in last_per_key(history, |h| h.fixture_id) {
            columns.stats.push(&h.stats);
            columns.player_id.push(player_id);
            columns.fixture_id.push(h.fixture_id);
            columns.season_id.push(season_id);
            columns.event.push(h.round);
            columns.opponent_team_id.push(h.opponent_team_id);
            columns.kickoff_time.push(h.kickoff_time);
            columns.was_home.push(h.was_home);
            columns.team_h_score.push(h.team_h_score);
            columns.team_a_score.push(h.team_a_score);
            columns.modified.push(h.modified);
            columns.total_points.push(h.total_points);
            columns.value.push(h.value);
            columns.transfers_balance.push(h.transfers_balance);
            columns.selected.push(h.selected);
            columns.transfers_in.push(h.transfers_in);
            columns.transfers_out.push(h.transfers_out);
        }
        columns
    }

    fn len(&self) -> usize {
        self.player_id.len()
    }
}

#[async_trait]
impl RecordWriter<PlayerHistoryMessage> for PlayerHistoryWriter {
    type Error = sqlx::Error;

    async fn write_record(&self, record: PlayerHistoryMessage) -> Result<(), sqlx::Error> {
        let columns = GameweekColumns::from_message(record);
        let rows = columns.len();
        if rows == 0 {
            return Ok(());
        }

        let query = sqlx::query(&self.sql)
            .bind(columns.player_id)
            .bind(columns.fixture_id)
            .bind(columns.season_id)
            .bind(columns.event)
            .bind(columns.opponent_team_id)
            .bind(columns.kickoff_time)
            .bind(columns.was_home)
            .bind(columns.team_h_score)
            .bind(columns.team_a_score)
            .bind(columns.modified)
            .bind(columns.total_points)
            .bind(columns.value)
            .bind(columns.transfers_balance)
            .bind(columns.selected)
            .bind(columns.transfers_in)
            .bind(columns.transfers_out);
        columns.stats.bind(query).execute(&self.pool).await?;

        record_upserted(PLAYER_GAMEWEEK_STATS, rows);
        Ok(())
    }
}

/// Writes one player's past-season totals per call.
pub struct PlayerPastWriter {
    pool: PgPool,
    sql: String,
}

impl PlayerPastWriter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            sql: upsert_statement(
                PLAYER_PAST_SEASONS,
                &with_stats(PAST_SEASON_COLUMNS),
                &["player_code", "season_name"],
            ),
        }
    }
}

#[derive(Debug, Default)]
struct PastSeasonColumns {
    player_code: Vec<i32>,
    season_name: Vec<String>,
    start_cost: Vec<i32>,
    end_cost: Vec<i32>,
    total_points: Vec<i32>,
    stats: StatColumns,
}

impl PastSeasonColumns {
    fn from_message(message: PlayerPastMessage) -> Self {
        let player_code = message.player_code;

        let mut columns = Self::default();
        for season in last_per_key(message.past_history, |s| s.season_name.clone()) {
            columns.stats.push(&season.stats);
            columns.player_code.push(player_code);
            columns.season_name.push(season.season_name);
            columns.start_cost.push(season.start_cost);
            columns.end_cost.push(season.end_cost);
            columns.total_points.push(season.total_points);
        }
        columns
    }

    fn len(&self) -> usize {
        self.player_code.len()
    }
}

#[async_trait]
impl RecordWriter<PlayerPastMessage> for PlayerPastWriter {
    type Error = sqlx::Error;

    async fn write_record(&self, record: PlayerPastMessage) -> Result<(), sqlx::Error> {
        let columns = PastSeasonColumns::from_message(record);
        let rows = columns.len();
        if rows == 0 {
            return Ok(());
        }

        let query = sqlx::query(&self.sql)
            .bind(columns.player_code)
            .bind(columns.season_name)
            .bind(columns.start_cost)
            .bind(columns.end_cost)
            .bind(columns.total_points);
        columns.stats.bind(query).execute(&self.pool).await?;

        record_upserted(PLAYER_PAST_SEASONS, rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchStats, PlayerHistory, PlayerPastHistory};

    fn match_row(fixture_id: i32, total_points: i32) -> PlayerHistory {
        PlayerHistory {
            fixture_id,
            opponent_team_id: 7,
            round: fixture_id,
            kickoff_time: None,
            was_home: true,
            team_h_score: Some(1),
            team_a_score: Some(1),
            modified: false,
            total_points,
            value: 100,
            transfers_balance: 0,
            selected: 5000,
            transfers_in: 0,
            transfers_out: 0,
            stats: MatchStats {
                minutes: 90,
                ..Default::default()
            },
        }
    }

    #[test]
    fn statements_append_stat_columns() {
        let columns = with_stats(GAMEWEEK_COLUMNS);
        assert_eq!(columns.len(), GAMEWEEK_COLUMNS.len() + 22);

        let sql = upsert_statement(
            PLAYER_GAMEWEEK_STATS,
            &columns,
            &["player_id", "fixture_id", "season_id"],
        );
        assert!(sql.contains("$38::float8[]"));
        assert!(sql.contains("bps = EXCLUDED.bps"));
    }

    #[test]
    fn gameweek_rows_carry_message_ids() {
        let columns = GameweekColumns::from_message(PlayerHistoryMessage {
            player_id: 351,
            season_id: 3,
            history: vec![match_row(1, 2), match_row(2, 9), match_row(1, 3)],
        });

        assert_eq!(columns.len(), 2);
        assert!(columns.player_id.iter().all(|id| *id == 351));
        assert!(columns.season_id.iter().all(|id| *id == 3));

        let mut points: Vec<(i32, i32)> = columns
            .fixture_id
            .iter()
            .copied()
            .zip(columns.total_points.iter().copied())
            .collect();
        points.sort();
        assert_eq!(points, vec![(1, 3), (2, 9)]);
    }

    #[test]
    fn empty_history_has_no_rows() {
        let columns = GameweekColumns::from_message(PlayerHistoryMessage {
            player_id: 1,
            season_id: 3,
            history: vec![],
        });
        assert_eq!(columns.len(), 0);
    }

    #[test]
    fn past_seasons_keyed_by_name() {
        let season = |name: &str, points| PlayerPastHistory {
            season_name: name.to_string(),
            start_cost: 55,
            end_cost: 60,
            total_points: points,
            stats: MatchStats::default(),
        };
        let columns = PastSeasonColumns::from_message(PlayerPastMessage {
            player_code: 223340,
            past_history: vec![season("2021/22", 100), season("2022/23", 180)],
        });

        assert_eq!(columns.len(), 2);
        assert_eq!(columns.player_code, vec![223340, 223340]);
    }
}
