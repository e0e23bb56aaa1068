use std::fmt;

use batch_pipeline::{JsonDecoder, Keyed, PerRecord, Pipeline, PipelineConfig, PipelineStats, Sink};
use common_kafka::config::{ConsumerConfig, KafkaConfig};
use common_kafka::kafka_consumer::SingleTopicConsumer;
use serde::de::DeserializeOwned;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::IndexerError;
use crate::models::{
    EntryHistoryMessage, FixtureMessage, PlayerBootstrapMessage, PlayerHistoryMessage,
    PlayerPastMessage, TeamMessage, TeamOverallStatsMessage,
};
use crate::sinks::{
    FixtureSink, ManagerHistorySink, PlayerHistoryWriter, PlayerPastWriter, PlayerSink, TeamSink,
    TeamStatsSink,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Fixtures,
    Teams,
    PlayerBootstrap,
    PlayerStats,
    PlayerMatchStats,
    PlayerPastHistory,
    ManagerHistory,
    TeamOverallStats,
}

impl RecordType {
    /// Used as the pipeline name in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Fixtures => "fixtures",
            RecordType::Teams => "teams",
            RecordType::PlayerBootstrap => "player_bootstrap",
            RecordType::PlayerStats => "player_stats",
            RecordType::PlayerMatchStats => "player_match_stats",
            RecordType::PlayerPastHistory => "player_past_history",
            RecordType::ManagerHistory => "manager_history",
            RecordType::TeamOverallStats => "team_overall_stats",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record type bound to the topic it is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub record_type: RecordType,
    pub topic: String,
    pub group: String,
}

/// Subscribes to the route's topic and starts its pipeline on a new task.
/// The task resolves to the pipeline's statistics once `shutdown` has been
/// cancelled and the final batch has been flushed.
pub fn spawn_pipeline(
    route: &Route,
    config: PipelineConfig,
    kafka: &KafkaConfig,
    pool: PgPool,
    shutdown: CancellationToken,
) -> Result<JoinHandle<PipelineStats>, IndexerError> {
    let consumer = SingleTopicConsumer::new(
        kafka,
        ConsumerConfig::new(route.group.clone(), route.topic.clone()),
    )?;

    info!(
        pipeline = %route.record_type,
        topic = consumer.topic(),
        group = %route.group,
        "subscribed to topic"
    );

    let name = route.record_type.as_str();
    let handle = match route.record_type {
        RecordType::Fixtures => start::<FixtureMessage, _>(
            name,
            config,
            &consumer,
            FixtureSink::new(pool),
            shutdown,
        ),
        RecordType::Teams => {
            start::<TeamMessage, _>(name, config, &consumer, TeamSink::new(pool), shutdown)
        }
        // Both feeds carry the same player snapshot.
        RecordType::PlayerBootstrap | RecordType::PlayerStats => {
            start::<PlayerBootstrapMessage, _>(
                name,
                config,
                &consumer,
                PlayerSink::new(pool),
                shutdown,
            )
        }
        RecordType::PlayerMatchStats => start::<PlayerHistoryMessage, _>(
            name,
            config,
            &consumer,
            PerRecord::new(PlayerHistoryWriter::new(pool)),
            shutdown,
        ),
        RecordType::PlayerPastHistory => start::<PlayerPastMessage, _>(
            name,
            config,
            &consumer,
            PerRecord::new(PlayerPastWriter::new(pool)),
            shutdown,
        ),
        RecordType::ManagerHistory => start::<EntryHistoryMessage, _>(
            name,
            config,
            &consumer,
            ManagerHistorySink::new(pool),
            shutdown,
        ),
        RecordType::TeamOverallStats => start::<TeamOverallStatsMessage, _>(
            name,
            config,
            &consumer,
            TeamStatsSink::new(pool),
            shutdown,
        ),
    };

    Ok(handle)
}

fn start<T, S>(
    name: &'static str,
    config: PipelineConfig,
    consumer: &SingleTopicConsumer,
    sink: S,
    shutdown: CancellationToken,
) -> JoinHandle<PipelineStats>
where
    T: DeserializeOwned + Keyed + Send + 'static,
    T::Key: 'static,
    S: Sink<T> + 'static,
{
    Pipeline::keyed(name, config, JsonDecoder::<T>::new(), sink).spawn(consumer, shutdown)
}
