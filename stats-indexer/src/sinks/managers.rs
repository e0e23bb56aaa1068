use async_trait::async_trait;
use batch_pipeline::Sink;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::unnest::{last_per_key, record_upserted, upsert_statement, Column};
use crate::models::EntryHistoryMessage;

const GAMEWEEK_HISTORY: &str = "manager_gameweek_history";
const SEASON_HISTORY: &str = "manager_season_history";
const CHIPS: &str = "manager_chips";

const GAMEWEEK_COLUMNS: &[Column] = &[
    ("manager_id", "int"),
    ("season_id", "int"),
    ("event", "int"),
    ("points", "int"),
    ("total_points", "int"),
    ("rank", "int"),
    ("rank_sort", "int"),
    ("overall_rank", "int"),
    ("percentile_rank", "int"),
    ("bank", "int"),
    ("value", "int"),
    ("event_transfers", "int"),
    ("event_transfers_cost", "int"),
    ("points_on_bench", "int"),
];

const SEASON_COLUMNS: &[Column] = &[
    ("manager_id", "int"),
    ("season_name", "text"),
    ("total_points", "int"),
    ("rank", "int"),
];

const CHIP_COLUMNS: &[Column] = &[
    ("manager_id", "int"),
    ("season_id", "int"),
    ("event", "int"),
    ("chip_name", "text"),
    ("time", "timestamptz"),
];

/// Upserts a manager's gameweek history, past seasons and chip usage. All
/// three tables are written in the same transaction.
pub struct ManagerHistorySink {
    pool: PgPool,
    gameweeks_sql: String,
    seasons_sql: String,
    chips_sql: String,
}

impl ManagerHistorySink {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            gameweeks_sql: upsert_statement(
                GAMEWEEK_HISTORY,
                GAMEWEEK_COLUMNS,
                &["manager_id", "season_id", "event"],
            ),
            seasons_sql: upsert_statement(
                SEASON_HISTORY,
                SEASON_COLUMNS,
                &["manager_id", "season_name"],
            ),
            chips_sql: upsert_statement(
                CHIPS,
                CHIP_COLUMNS,
                &["manager_id", "season_id", "event", "chip_name"],
            ),
        }
    }
}

#[derive(Debug, Default)]
struct GameweekColumns {
    manager_id: Vec<i32>,
    season_id: Vec<i32>,
    event: Vec<i32>,
    points: Vec<i32>,
    total_points: Vec<i32>,
    // rank, rank_sort, overall_rank, percentile_rank
    ranks: [Vec<Option<i32>>; 4],
    bank: Vec<i32>,
    value: Vec<i32>,
    event_transfers: Vec<i32>,
    event_transfers_cost: Vec<i32>,
    points_on_bench: Vec<i32>,
}

#[derive(Debug, Default)]
struct SeasonColumns {
    manager_id: Vec<i32>,
    season_name: Vec<String>,
    total_points: Vec<i32>,
    rank: Vec<Option<i32>>,
}

#[derive(Debug, Default)]
struct ChipColumns {
    manager_id: Vec<i32>,
    season_id: Vec<i32>,
    event: Vec<i32>,
    name: Vec<String>,
    time: Vec<Option<DateTime<Utc>>>,
}

#[derive(Debug, Default)]
struct ManagerRows {
    gameweeks: GameweekColumns,
    seasons: SeasonColumns,
    chips: ChipColumns,
}

impl ManagerRows {
    fn from_batch(batch: Vec<EntryHistoryMessage>) -> Self {
        let mut rows = Self::default();
        for message in batch {
            let (manager_id, season_id) = (message.entry_id, message.season_id);
            let history = message.entry_history;

            let gameweeks = &mut rows.gameweeks;
            for gw in last_per_key(history.current, |gw| gw.event) {
                gameweeks.manager_id.push(manager_id);
                gameweeks.season_id.push(season_id);
                gameweeks.event.push(gw.event);
                gameweeks.points.push(gw.points);
                gameweeks.total_points.push(gw.total_points);
                let ranks = [gw.rank, gw.rank_sort, gw.overall_rank, gw.percentile_rank];
                for (column, value) in gameweeks.ranks.iter_mut().zip(ranks) {
                    column.push(value);
                }
                gameweeks.bank.push(gw.bank);
                gameweeks.value.push(gw.value);
                gameweeks.event_transfers.push(gw.event_transfers);
                gameweeks.event_transfers_cost.push(gw.event_transfers_cost);
                gameweeks.points_on_bench.push(gw.points_on_bench);
            }

            // Past seasons are not tied to the message's season, so the same
            // manager can repeat them across messages.
            let seasons = &mut rows.seasons;
            for past in history.past {
                seasons.manager_id.push(manager_id);
                seasons.season_name.push(past.season_name);
                seasons.total_points.push(past.total_points);
                seasons.rank.push(past.rank);
            }

            let chips = &mut rows.chips;
            for chip in last_per_key(history.chips, |c| (c.event, c.name.clone())) {
                chips.manager_id.push(manager_id);
                chips.season_id.push(season_id);
                chips.event.push(chip.event);
                chips.name.push(chip.name);
                chips.time.push(chip.time);
            }
        }
        rows.seasons = rows.seasons.deduplicated();
        rows
    }
}

impl SeasonColumns {
    fn deduplicated(self) -> Self {
        let rows = self
            .manager_id
            .into_iter()
            .zip(self.season_name)
            .zip(self.total_points.into_iter().zip(self.rank));

        let mut columns = Self::default();
        for ((manager_id, season_name), (total_points, rank)) in
            last_per_key(rows, |((manager_id, season_name), _)| {
                (*manager_id, season_name.clone())
            })
        {
            columns.manager_id.push(manager_id);
            columns.season_name.push(season_name);
            columns.total_points.push(total_points);
            columns.rank.push(rank);
        }
        columns
    }
}

#[async_trait]
impl Sink<EntryHistoryMessage> for ManagerHistorySink {
    type Error = sqlx::Error;

    async fn write_batch(&self, items: Vec<EntryHistoryMessage>) -> Result<(), sqlx::Error> {
        let ManagerRows {
            gameweeks,
            seasons,
            chips,
        } = ManagerRows::from_batch(items);
        let counts = (
            gameweeks.manager_id.len(),
            seasons.manager_id.len(),
            chips.manager_id.len(),
        );

        let mut tx = self.pool.begin().await?;

        if counts.0 > 0 {
            let mut query = sqlx::query(&self.gameweeks_sql)
                .bind(gameweeks.manager_id)
                .bind(gameweeks.season_id)
                .bind(gameweeks.event)
                .bind(gameweeks.points)
                .bind(gameweeks.total_points);
            for column in gameweeks.ranks {
                query = query.bind(column);
            }
            query
                .bind(gameweeks.bank)
                .bind(gameweeks.value)
                .bind(gameweeks.event_transfers)
                .bind(gameweeks.event_transfers_cost)
                .bind(gameweeks.points_on_bench)
                .execute(&mut *tx)
                .await?;
        }

        if counts.1 > 0 {
            sqlx::query(&self.seasons_sql)
                .bind(seasons.manager_id)
                .bind(seasons.season_name)
                .bind(seasons.total_points)
                .bind(seasons.rank)
                .execute(&mut *tx)
                .await?;
        }

        if counts.2 > 0 {
            sqlx::query(&self.chips_sql)
                .bind(chips.manager_id)
                .bind(chips.season_id)
                .bind(chips.event)
                .bind(chips.name)
                .bind(chips.time)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        record_upserted(GAMEWEEK_HISTORY, counts.0);
        record_upserted(SEASON_HISTORY, counts.1);
        record_upserted(CHIPS, counts.2);
        Ok(())
    }
}
