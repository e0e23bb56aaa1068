pub const RECORDS_RECEIVED: &str = "batch_pipeline_records_received";
pub const DECODE_FAILURES: &str = "batch_pipeline_decode_failures";
pub const STREAM_ERRORS: &str = "batch_pipeline_stream_errors";
pub const RECORDS_SUPERSEDED: &str = "batch_pipeline_records_superseded";
pub const BATCH_FLUSHES: &str = "batch_pipeline_flushes";
pub const RECORDS_FLUSHED: &str = "batch_pipeline_records_flushed";
pub const SINK_FAILURES: &str = "batch_pipeline_sink_failures";
pub const RECORDS_LOST: &str = "batch_pipeline_records_lost";
pub const FLUSH_DURATION_MS: &str = "batch_pipeline_flush_duration_ms";
pub const PENDING_RECORDS: &str = "batch_pipeline_pending_records";
