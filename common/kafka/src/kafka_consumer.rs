use std::sync::Arc;

use batch_pipeline::stream::{channel, StreamSender};
use batch_pipeline::{Message, StreamError, StreamSource, Subscription};
use bytes::Bytes;
use rdkafka::{
    consumer::{Consumer, StreamConsumer},
    error::KafkaError,
    ClientConfig, Message as _,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{ConsumerConfig, KafkaConfig};

/// A consumer bound to one topic and one consumer group. Subscribing spawns a
/// reader task that forwards messages and errors into the pipeline channels.
#[derive(Clone)]
pub struct SingleTopicConsumer {
    inner: Arc<Inner>,
    message_capacity: usize,
    error_capacity: usize,
}

struct Inner {
    consumer: StreamConsumer,
    topic: String,
}

pub fn client_config(kafka: &KafkaConfig, consumer: &ConsumerConfig) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    client_config
        .set("bootstrap.servers", &kafka.kafka_hosts)
        .set("statistics.interval.ms", "10000")
        .set("group.id", &consumer.group)
        .set("auto.offset.reset", &kafka.kafka_consumer_offset_reset)
        .set("enable.auto.commit", "true")
        .set(
            "auto.commit.interval.ms",
            kafka.kafka_consumer_auto_commit_interval_ms.to_string(),
        )
        .set("enable.auto.offset.store", "false");

    if kafka.kafka_tls {
        client_config
            .set("security.protocol", "ssl")
            .set("enable.ssl.certificate.verification", "false");
    };

    client_config
}

impl SingleTopicConsumer {
    pub fn new(kafka: &KafkaConfig, consumer: ConsumerConfig) -> Result<Self, KafkaError> {
        let stream_consumer: StreamConsumer = client_config(kafka, &consumer).create()?;
        stream_consumer.subscribe(&[consumer.topic.as_str()])?;

        let inner = Inner {
            consumer: stream_consumer,
            topic: consumer.topic,
        };
        Ok(Self {
            inner: Arc::new(inner),
            message_capacity: kafka.kafka_consumer_channel_capacity,
            error_capacity: kafka.kafka_error_channel_capacity,
        })
    }

    pub fn topic(&self) -> &str {
        &self.inner.topic
    }
}

impl StreamSource for SingleTopicConsumer {
    fn subscribe(&self, shutdown: CancellationToken) -> Subscription {
        let (tx, subscription) = channel(self.message_capacity, self.error_capacity);
        tokio::spawn(forward(self.inner.clone(), tx, shutdown));
        subscription
    }
}

// Runs until cancelled or until the pipeline drops its end. Returning drops
// the sender, which closes both channels.
async fn forward(inner: Arc<Inner>, tx: StreamSender, shutdown: CancellationToken) {
    info!(topic = %inner.topic, "kafka reader started");

    loop {
        let received = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            received = inner.consumer.recv() => received,
        };

        let (payload, key, partition, offset) = match received {
            Ok(message) => (
                message.payload().map(Bytes::copy_from_slice),
                message.key().map(Bytes::copy_from_slice),
                message.partition(),
                message.offset(),
            ),
            Err(e) => {
                report(&tx, &inner.topic, StreamError::transport(e));
                continue;
            }
        };

        match payload {
            Some(payload) => {
                let message = Message { payload, key };
                let sent = tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    sent = tx.send(message) => sent,
                };
                if sent.is_err() {
                    break;
                }
            }
            None => report(
                &tx,
                &inner.topic,
                StreamError::EmptyMessage { partition, offset },
            ),
        }

        if let Err(e) = inner
            .consumer
            .store_offset(&inner.topic, partition, offset)
        {
            report(&tx, &inner.topic, StreamError::transport(e));
        }
    }

    info!(topic = %inner.topic, "kafka reader stopped");
}

fn report(tx: &StreamSender, topic: &str, error: StreamError) {
    if !tx.report_error(error) {
        warn!(topic, "error channel full, dropping stream error");
    }
}
