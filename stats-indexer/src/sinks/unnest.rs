use std::hash::Hash;

use batch_pipeline::BatchAccumulator;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

use crate::metrics_consts::ROWS_UPSERTED;
use crate::models::MatchStats;

pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Column name and Postgres element type, in bind order.
pub type Column = (&'static str, &'static str);

pub fn stat_columns() -> Vec<Column> {
    MatchStats::COUNT_COLUMNS
        .iter()
        .map(|name| (*name, "int"))
        .chain(MatchStats::DECIMAL_COLUMNS.iter().map(|name| (*name, "float8")))
        .collect()
}

/// Builds a single-statement bulk upsert: every column is bound as one array
/// and expanded with UNNEST. Columns outside the conflict target are
/// overwritten on conflict.
pub fn upsert_statement(table: &str, columns: &[Column], conflict: &[&str]) -> String {
    let names = columns
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");

    let params = columns
        .iter()
        .enumerate()
        .map(|(i, (_, pg_type))| format!("${}::{}[]", i + 1, pg_type))
        .collect::<Vec<_>>()
        .join(", ");

    let updates = columns
        .iter()
        .filter(|(name, _)| !conflict.contains(name))
        .map(|(name, _)| format!("{name} = EXCLUDED.{name}"))
        .chain(std::iter::once("updated_at = CURRENT_TIMESTAMP".to_string()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {table} ({names}) SELECT * FROM UNNEST({params}) \
         ON CONFLICT ({}) DO UPDATE SET {updates}",
        conflict.join(", ")
    )
}

/// Postgres refuses to touch the same row twice in one upsert, so child rows
/// are collapsed to the last one per conflict key first.
pub fn last_per_key<R, K, F>(rows: impl IntoIterator<Item = R>, key_of: F) -> Vec<R>
where
    K: Eq + Hash,
    F: Fn(&R) -> K,
{
    let mut unique = BatchAccumulator::new(key_of);
    for row in rows {
        unique.add(row);
    }
    unique.drain()
}

/// Column arrays for a [`MatchStats`] block, bound after a table's own columns.
#[derive(Debug, Default)]
pub struct StatColumns {
    counts: [Vec<i32>; 14],
    decimals: [Vec<f64>; 8],
}

impl StatColumns {
    pub fn push(&mut self, stats: &MatchStats) {
        for (column, value) in self.counts.iter_mut().zip(stats.counts()) {
            column.push(value);
        }
        for (column, value) in self.decimals.iter_mut().zip(stats.decimals()) {
            column.push(value);
        }
    }

    pub fn bind(self, mut query: PgQuery<'_>) -> PgQuery<'_> {
        for column in self.counts {
            query = query.bind(column);
        }
        for column in self.decimals {
            query = query.bind(column);
        }
        query
    }
}

pub fn record_upserted(table: &'static str, rows: usize) {
    metrics::counter!(ROWS_UPSERTED, &[("table", table)]).increment(rows as u64);
}
