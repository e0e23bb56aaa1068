use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct KafkaConfig {
    #[envconfig(default = "localhost:9092")]
    pub kafka_hosts: String,

    #[envconfig(default = "false")]
    pub kafka_tls: bool,

    // earliest, latest
    #[envconfig(default = "earliest")]
    pub kafka_consumer_offset_reset: String,

    // Offsets are stored by the reader once a message is handed to the
    // pipeline, and committed by librdkafka on this interval.
    #[envconfig(default = "5000")]
    pub kafka_consumer_auto_commit_interval_ms: i32,

    #[envconfig(default = "10000")]
    pub kafka_consumer_channel_capacity: usize,

    #[envconfig(default = "100")]
    pub kafka_error_channel_capacity: usize,
}

/// Per-topic consumer settings. Several consumers share one [`KafkaConfig`],
/// so these are not read from the environment directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumerConfig {
    pub group: String,
    pub topic: String,
}

impl ConsumerConfig {
    pub fn new(group: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            topic: topic.into(),
        }
    }
}
