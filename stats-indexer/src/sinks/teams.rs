use async_trait::async_trait;
use batch_pipeline::Sink;
use sqlx::PgPool;

use super::unnest::{record_upserted, upsert_statement, Column};
use crate::models::TeamMessage;

const TEAMS: &str = "teams";

const TEAM_COLUMNS: &[Column] = &[
    ("team_id", "int"),
    ("season_id", "int"),
    ("team_code", "int"),
    ("name", "text"),
    ("short_name", "text"),
    ("strength", "int"),
    ("form", "text"),
    ("position", "int"),
    ("points", "int"),
    ("played", "int"),
    ("win", "int"),
    ("draw", "int"),
    ("loss", "int"),
    ("team_division", "int"),
    ("unavailable", "bool"),
    ("pulse_id", "int"),
    ("strength_overall_home", "int"),
    ("strength_overall_away", "int"),
    ("strength_attack_home", "int"),
    ("strength_attack_away", "int"),
    ("strength_defence_home", "int"),
    ("strength_defence_away", "int"),
];

pub struct TeamSink {
    pool: PgPool,
    sql: String,
}

impl TeamSink {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            sql: upsert_statement(TEAMS, TEAM_COLUMNS, &["team_id", "season_id"]),
        }
    }
}

#[derive(Debug, Default)]
struct TeamColumns {
    team_id: Vec<i32>,
    season_id: Vec<i32>,
    code: Vec<i32>,
    name: Vec<String>,
    short_name: Vec<String>,
    strength: Vec<i32>,
    form: Vec<Option<String>>,
    position: Vec<i32>,
    points: Vec<i32>,
    played: Vec<i32>,
    win: Vec<i32>,
    draw: Vec<i32>,
    loss: Vec<i32>,
    team_division: Vec<Option<i32>>,
    unavailable: Vec<bool>,
    pulse_id: Vec<i32>,
    // overall, attack, defence; home then away
    strengths: [Vec<i32>; 6],
}

impl TeamColumns {
    fn from_batch(batch: Vec<TeamMessage>) -> Self {
        let mut columns = Self::default();
        for TeamMessage { team, season_id } in batch {
            columns.team_id.push(team.id);
            columns.season_id.push(season_id);
            columns.code.push(team.code);
            columns.name.push(team.name);
            columns.short_name.push(team.short_name);
            columns.strength.push(team.strength);
            columns.form.push(team.form);
            columns.position.push(team.position);
            columns.points.push(team.points);
            columns.played.push(team.played);
            columns.win.push(team.win);
            columns.draw.push(team.draw);
            columns.loss.push(team.loss);
            columns.team_division.push(team.team_division);
            columns.unavailable.push(team.unavailable);
            columns.pulse_id.push(team.pulse_id);

            let strengths = [
                team.strength_overall_home,
                team.strength_overall_away,
                team.strength_attack_home,
                team.strength_attack_away,
                team.strength_defence_home,
                team.strength_defence_away,
            ];
            for (column, value) in columns.strengths.iter_mut().zip(strengths) {
                column.push(value);
            }
        }
        columns
    }
}

#[async_trait]
impl Sink<TeamMessage> for TeamSink {
    type Error = sqlx::Error;

    async fn write_batch(&self, items: Vec<TeamMessage>) -> Result<(), sqlx::Error> {
        let rows = items.len();
        let columns = TeamColumns::from_batch(items);

        let mut query = sqlx::query(&self.sql)
            .bind(columns.team_id)
            .bind(columns.season_id)
            .bind(columns.code)
            .bind(columns.name)
            .bind(columns.short_name)
            .bind(columns.strength)
            .bind(columns.form)
            .bind(columns.position)
            .bind(columns.points)
            .bind(columns.played)
            .bind(columns.win)
            .bind(columns.draw)
            .bind(columns.loss)
            .bind(columns.team_division)
            .bind(columns.unavailable)
            .bind(columns.pulse_id);
        for column in columns.strengths {
            query = query.bind(column);
        }

        let mut tx = self.pool.begin().await?;
        query.execute(&mut *tx).await?;
        tx.commit().await?;

        record_upserted(TEAMS, rows);
        Ok(())
    }
}
