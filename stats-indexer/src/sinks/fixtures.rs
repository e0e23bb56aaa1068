use async_trait::async_trait;
use batch_pipeline::Sink;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::unnest::{last_per_key, record_upserted, upsert_statement, Column};
use crate::models::FixtureMessage;

const FIXTURES: &str = "fixtures";
const FIXTURE_STATS: &str = "fixture_stats";

const FIXTURE_COLUMNS: &[Column] = &[
    ("fixture_id", "int"),
    ("season_id", "int"),
    ("fixture_code", "int"),
    ("event", "int"),
    ("team_h", "int"),
    ("team_a", "int"),
    ("kickoff_time", "timestamptz"),
    ("team_h_score", "int"),
    ("team_a_score", "int"),
    ("finished", "bool"),
    ("finished_provisional", "bool"),
    ("started", "bool"),
    ("minutes", "int"),
    ("provisional_start_time", "bool"),
    ("team_h_difficulty", "int"),
    ("team_a_difficulty", "int"),
    ("pulse_id", "int"),
];

const FIXTURE_STAT_COLUMNS: &[Column] = &[
    ("fixture_id", "int"),
    ("season_id", "int"),
    ("player_id", "int"),
    ("identifier", "text"),
    ("value", "int"),
];

/// Upserts fixtures and their per-player stat lines in one transaction.
pub struct FixtureSink {
    pool: PgPool,
    fixtures_sql: String,
    stats_sql: String,
}

impl FixtureSink {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            fixtures_sql: upsert_statement(FIXTURES, FIXTURE_COLUMNS, &["fixture_id", "season_id"]),
            stats_sql: upsert_statement(
                FIXTURE_STATS,
                FIXTURE_STAT_COLUMNS,
                &["fixture_id", "season_id", "player_id", "identifier"],
            ),
        }
    }
}

#[derive(Debug, Default)]
struct FixtureColumns {
    fixture_id: Vec<i32>,
    season_id: Vec<i32>,
    code: Vec<i32>,
    event: Vec<Option<i32>>,
    team_h: Vec<i32>,
    team_a: Vec<i32>,
    kickoff_time: Vec<Option<DateTime<Utc>>>,
    team_h_score: Vec<Option<i32>>,
    team_a_score: Vec<Option<i32>>,
    finished: Vec<bool>,
    finished_provisional: Vec<bool>,
    started: Vec<Option<bool>>,
    minutes: Vec<i32>,
    provisional_start_time: Vec<bool>,
    team_h_difficulty: Vec<i32>,
    team_a_difficulty: Vec<i32>,
    pulse_id: Vec<i32>,
}

impl FixtureColumns {
    fn from_batch(batch: &[FixtureMessage]) -> Self {
        let mut columns = Self::default();
        for message in batch {
            let f = &message.fixture;
            columns.fixture_id.push(f.id);
            columns.season_id.push(message.season_id);
            columns.code.push(f.code);
            columns.event.push(f.event);
            columns.team_h.push(f.team_h);
            columns.team_a.push(f.team_a);
            columns.kickoff_time.push(f.kickoff_time);
            columns.team_h_score.push(f.team_h_score);
            columns.team_a_score.push(f.team_a_score);
            columns.finished.push(f.finished);
            columns.finished_provisional.push(f.finished_provisional);
            columns.started.push(f.started);
            columns.minutes.push(f.minutes);
            columns.provisional_start_time.push(f.provisional_start_time);
            columns.team_h_difficulty.push(f.team_h_difficulty);
            columns.team_a_difficulty.push(f.team_a_difficulty);
            columns.pulse_id.push(f.pulse_id);
        }
        columns
    }

    fn len(&self) -> usize {
        self.fixture_id.len()
    }
}

#[derive(Debug, Default)]
struct FixtureStatColumns {
    fixture_id: Vec<i32>,
    season_id: Vec<i32>,
    player_id: Vec<i32>,
    identifier: Vec<String>,
    value: Vec<i32>,
}

impl FixtureStatColumns {
    // Home and away lines are stored alike; the player id tells them apart.
    fn from_batch(batch: &[FixtureMessage]) -> Self {
        let rows = batch.iter().flat_map(|message| {
            message.fixture.stats.iter().flat_map(move |stat| {
                stat.h.iter().chain(stat.a.iter()).map(move |line| {
                    (
                        message.fixture.id,
                        message.season_id,
                        line.element,
                        stat.identifier.as_str(),
                        line.value,
                    )
                })
            })
        });

        let mut columns = Self::default();
        for (fixture_id, season_id, player_id, identifier, value) in
            last_per_key(rows, |r| (r.0, r.1, r.2, r.3))
        {
            columns.fixture_id.push(fixture_id);
            columns.season_id.push(season_id);
            columns.player_id.push(player_id);
            columns.identifier.push(identifier.to_string());
            columns.value.push(value);
        }
        columns
    }

    fn len(&self) -> usize {
        self.fixture_id.len()
    }
}

#[async_trait]
impl Sink<FixtureMessage> for FixtureSink {
    type Error = sqlx::Error;

    async fn write_batch(&self, items: Vec<FixtureMessage>) -> Result<(), sqlx::Error> {
        let fixtures = FixtureColumns::from_batch(&items);
        let stats = FixtureStatColumns::from_batch(&items);
        let (fixture_rows, stat_rows) = (fixtures.len(), stats.len());

        let mut tx = self.pool.begin().await?;

        sqlx::query(&self.fixtures_sql)
            .bind(fixtures.fixture_id)
            .bind(fixtures.season_id)
            .bind(fixtures.code)
            .bind(fixtures.event)
            .bind(fixtures.team_h)
            .bind(fixtures.team_a)
            .bind(fixtures.kickoff_time)
            .bind(fixtures.team_h_score)
            .bind(fixtures.team_a_score)
            .bind(fixtures.finished)
            .bind(fixtures.finished_provisional)
            .bind(fixtures.started)
            .bind(fixtures.minutes)
            .bind(fixtures.provisional_start_time)
            .bind(fixtures.team_h_difficulty)
            .bind(fixtures.team_a_difficulty)
            .bind(fixtures.pulse_id)
            .execute(&mut *tx)
            .await?;

        if stat_rows > 0 {
            sqlx::query(&self.stats_sql)
                .bind(stats.fixture_id)
                .bind(stats.season_id)
                .bind(stats.player_id)
                .bind(stats.identifier)
                .bind(stats.value)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        record_upserted(FIXTURES, fixture_rows);
        record_upserted(FIXTURE_STATS, stat_rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fixture, FixtureStat, StatElement};

    fn fixture(id: i32, stats: Vec<FixtureStat>) -> FixtureMessage {
        FixtureMessage {
            season_id: 3,
            fixture: Fixture {
                id,
                code: 1000 + id,
                event: Some(1),
                finished: true,
                finished_provisional: true,
                kickoff_time: None,
                minutes: 90,
                provisional_start_time: false,
                started: Some(true),
                team_a: 1,
                team_a_score: Some(0),
                team_h: 2,
                team_h_score: Some(2),
                stats,
                team_h_difficulty: 2,
                team_a_difficulty: 4,
                pulse_id: 1,
            },
        }
    }

    fn line(element: i32, value: i32) -> StatElement {
        StatElement { value, element }
    }

    #[test]
    fn one_row_per_fixture() {
        let columns = FixtureColumns::from_batch(&[fixture(1, vec![]), fixture(2, vec![])]);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns.code, vec![1001, 1002]);
        assert_eq!(columns.team_h_score, vec![Some(2), Some(2)]);
    }

    #[test]
    fn stats_flatten_home_and_away() {
        let stats = vec![
            FixtureStat {
                identifier: "goals_scored".to_string(),
                h: vec![line(10, 1), line(11, 1)],
                a: vec![],
            },
            FixtureStat {
                identifier: "bps".to_string(),
                h: vec![line(10, 30)],
                a: vec![line(20, 12)],
            },
        ];
        let columns = FixtureStatColumns::from_batch(&[fixture(1, stats), fixture(2, vec![])]);

        assert_eq!(columns.len(), 4);
        assert!(columns.fixture_id.iter().all(|id| *id == 1));
        let mut bps: Vec<(i32, i32)> = columns
            .identifier
            .iter()
            .zip(columns.player_id.iter().zip(columns.value.iter()))
            .filter(|(identifier, _)| identifier.as_str() == "bps")
            .map(|(_, (player, value))| (*player, *value))
            .collect();
        bps.sort();
        assert_eq!(bps, vec![(10, 30), (20, 12)]);
    }

    #[test]
    fn repeated_stat_lines_collapse() {
        let stats = vec![FixtureStat {
            identifier: "saves".to_string(),
            h: vec![line(1, 3)],
            a: vec![line(1, 4)],
        }];
        let columns = FixtureStatColumns::from_batch(&[fixture(5, stats)]);

        assert_eq!(columns.len(), 1);
        assert_eq!(columns.value, vec![4]);
    }

    #[test]
    fn statements_target_natural_keys() {
        let stats_sql = upsert_statement(
            FIXTURE_STATS,
            FIXTURE_STAT_COLUMNS,
            &["fixture_id", "season_id", "player_id", "identifier"],
        );
        assert!(stats_sql.contains("ON CONFLICT (fixture_id, season_id, player_id, identifier)"));
        assert!(stats_sql.contains("value = EXCLUDED.value"));
        assert!(!stats_sql.contains("identifier = EXCLUDED"));
    }
}
