pub const ROWS_UPSERTED: &str = "stats_indexer_rows_upserted";
pub const PIPELINES_RUNNING: &str = "stats_indexer_pipelines_running";
