use batch_pipeline::ConfigError;
use rdkafka::error::KafkaError;
use thiserror::Error;

/// Failures that stop the service from starting. Once pipelines are running,
/// errors are logged and counted instead of being returned.
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("failed to read configuration: {0}")]
    Env(#[from] envconfig::Error),
    #[error("invalid pipeline configuration: {0}")]
    Pipeline(#[from] ConfigError),
    #[error("no topics configured, nothing to index")]
    NoTopics,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("failed to create kafka consumer: {0}")]
    Kafka(#[from] KafkaError),
    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
