use async_trait::async_trait;
use batch_pipeline::Sink;
use sqlx::PgPool;

use super::unnest::{record_upserted, upsert_statement, Column};
use crate::models::{TeamOverallStats, TeamOverallStatsMessage};

const TEAM_OVERALL_STATS: &str = "team_overall_stats";

const KEY_COLUMNS: &[Column] = &[("team_id", "int"), ("league_id", "int"), ("season_id", "int")];

fn columns() -> Vec<Column> {
    KEY_COLUMNS
        .iter()
        .copied()
        .chain(TeamOverallStats::COUNT_COLUMNS.iter().map(|name| (*name, "int")))
        .chain(TeamOverallStats::RATE_COLUMNS.iter().map(|name| (*name, "float8")))
        .collect()
}

/// Upserts season team statistics, one row per team, league and season.
pub struct TeamStatsSink {
    pool: PgPool,
    sql: String,
}

impl TeamStatsSink {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            sql: upsert_statement(
                TEAM_OVERALL_STATS,
                &columns(),
                &["team_id", "league_id", "season_id"],
            ),
        }
    }
}

#[derive(Debug)]
struct TeamStatsColumns {
    team_id: Vec<i32>,
    league_id: Vec<i32>,
    season_id: Vec<i32>,
    counts: [Vec<i32>; 42],
    rates: [Vec<f64>; 6],
}

impl TeamStatsColumns {
    fn from_batch(batch: &[TeamOverallStatsMessage]) -> Self {
        // Arrays this long have no Default impl.
        let mut columns = Self {
            team_id: Vec::with_capacity(batch.len()),
            league_id: Vec::with_capacity(batch.len()),
            season_id: Vec::with_capacity(batch.len()),
            counts: std::array::from_fn(|_| Vec::with_capacity(batch.len())),
            rates: std::array::from_fn(|_| Vec::with_capacity(batch.len())),
        };
        for message in batch {
            columns.team_id.push(message.team_id);
            columns.league_id.push(message.league_id);
            columns.season_id.push(message.season_id);
            for (column, value) in columns.counts.iter_mut().zip(message.statistics.counts()) {
                column.push(value);
            }
            for (column, value) in columns.rates.iter_mut().zip(message.statistics.rates()) {
                column.push(value);
            }
        }
        columns
    }
}

#[async_trait]
impl Sink<TeamOverallStatsMessage> for TeamStatsSink {
    type Error = sqlx::Error;

    async fn write_batch(&self, items: Vec<TeamOverallStatsMessage>) -> Result<(), sqlx::Error> {
        let columns = TeamStatsColumns::from_batch(&items);

        let mut query = sqlx::query(&self.sql)
            .bind(columns.team_id)
            .bind(columns.league_id)
            .bind(columns.season_id);
        for column in columns.counts {
            query = query.bind(column);
        }
        for column in columns.rates {
            query = query.bind(column);
        }

        let mut tx = self.pool.begin().await?;
        query.execute(&mut *tx).await?;
        tx.commit().await?;

        record_upserted(TEAM_OVERALL_STATS, items.len());
        Ok(())
    }
}
