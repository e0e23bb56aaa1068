use std::fmt::Debug;
use std::hash::Hash;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::accumulator::{BatchAccumulator, Keyed};
use crate::config::PipelineConfig;
use crate::decoder::Decoder;
use crate::metrics_consts::{
    BATCH_FLUSHES, DECODE_FAILURES, FLUSH_DURATION_MS, PENDING_RECORDS, RECORDS_FLUSHED,
    RECORDS_LOST, RECORDS_RECEIVED, RECORDS_SUPERSEDED, SINK_FAILURES, STREAM_ERRORS,
};
use crate::sink::Sink;
use crate::stream::{Message, StreamError, StreamSource, Subscription};
use crate::trigger::{FlushPolicy, FlushTrigger};

const PAYLOAD_PREVIEW_BYTES: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Running,
    Draining,
    Stopped,
}

/// Counters for a single pipeline run, returned when the run ends.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineStats {
    pub received: u64,
    pub decode_failures: u64,
    pub stream_errors: u64,
    pub superseded: u64,
    /// Sink calls made, whether or not they succeeded.
    pub flushes: u64,
    pub records_flushed: u64,
    pub sink_failures: u64,
    pub records_lost: u64,
}

/// Consumes one subscription, deduplicates records by key and hands batches
/// to the sink on size, timer or shutdown.
///
/// All events are handled one at a time by the run loop, and a sink call is
/// awaited before the next event is looked at. A slow sink therefore stalls
/// consumption instead of growing the batch.
pub struct Pipeline<D, S, K, F>
where
    D: Decoder,
{
    name: String,
    config: PipelineConfig,
    policy: FlushPolicy,
    decoder: D,
    sink: S,
    accumulator: BatchAccumulator<K, D::Record, F>,
    state: PipelineState,
    stats: PipelineStats,
    labels: [(&'static str, String); 1],
}

impl<D, S, K, F> Pipeline<D, S, K, F>
where
    D: Decoder,
    S: Sink<D::Record>,
    K: Eq + Hash,
    F: Fn(&D::Record) -> K,
{
    pub fn new(
        name: impl Into<String>,
        config: PipelineConfig,
        decoder: D,
        sink: S,
        key_of: F,
    ) -> Self {
        let name = name.into();
        Self {
            labels: [("pipeline", name.clone())],
            name,
            policy: FlushPolicy::new(&config),
            accumulator: BatchAccumulator::with_capacity(key_of, config.batch_size()),
            config,
            decoder,
            sink,
            state: PipelineState::Running,
            stats: PipelineStats::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn pending(&self) -> usize {
        self.accumulator.size()
    }

    /// Runs until `shutdown` is cancelled, then flushes whatever is pending
    /// and stops. Nothing is read from the subscription once cancellation has
    /// been observed.
    pub async fn run(
        mut self,
        mut subscription: Subscription,
        shutdown: CancellationToken,
    ) -> PipelineStats {
        info!(
            pipeline = %self.name,
            batch_size = self.config.batch_size(),
            flush_interval_ms = self.config.flush_interval().as_millis() as u64,
            "starting pipeline"
        );

        let period = self.config.flush_interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut messages_open = true;
        let mut errors_open = true;

        while self.state == PipelineState::Running {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    self.state = PipelineState::Draining;
                }
                _ = ticker.tick() => {
                    if let Some(trigger) = self.policy.on_tick(self.accumulator.size()) {
                        self.flush(trigger).await;
                    }
                }
                message = subscription.messages.recv(), if messages_open => match message {
                    Some(message) => self.handle_message(message).await,
                    None => {
                        warn!(
                            pipeline = %self.name,
                            "message channel closed, waiting for shutdown"
                        );
                        messages_open = false;
                    }
                },
                stream_error = subscription.errors.recv(), if errors_open => match stream_error {
                    Some(stream_error) => self.handle_stream_error(stream_error),
                    None => errors_open = false,
                },
            }
        }

        if let Some(trigger) = self.policy.on_shutdown(self.accumulator.size()) {
            self.flush(trigger).await;
        }
        self.state = PipelineState::Stopped;

        info!(
            pipeline = %self.name,
            received = self.stats.received,
            decode_failures = self.stats.decode_failures,
            stream_errors = self.stats.stream_errors,
            superseded = self.stats.superseded,
            flushes = self.stats.flushes,
            records_flushed = self.stats.records_flushed,
            sink_failures = self.stats.sink_failures,
            records_lost = self.stats.records_lost,
            "pipeline stopped"
        );

        self.stats
    }

    async fn handle_message(&mut self, message: Message) {
        self.stats.received += 1;
        metrics::counter!(RECORDS_RECEIVED, &self.labels).increment(1);

        let record = match self.decoder.decode(&message.payload) {
            Ok(record) => record,
            Err(e) => {
                self.stats.decode_failures += 1;
                metrics::counter!(DECODE_FAILURES, &self.labels).increment(1);
                warn!(
                    pipeline = %self.name,
                    error = %e,
                    payload = %e.payload_preview(PAYLOAD_PREVIEW_BYTES),
                    "dropping message that failed to decode"
                );
                return;
            }
        };

        if self.accumulator.add(record).is_some() {
            self.stats.superseded += 1;
            metrics::counter!(RECORDS_SUPERSEDED, &self.labels).increment(1);
        }
        metrics::gauge!(PENDING_RECORDS, &self.labels).set(self.accumulator.size() as f64);

        if let Some(trigger) = self.policy.after_add(self.accumulator.size()) {
            self.flush(trigger).await;
        }
    }

    fn handle_stream_error(&mut self, stream_error: StreamError) {
        self.stats.stream_errors += 1;
        metrics::counter!(STREAM_ERRORS, &self.labels).increment(1);
        error!(pipeline = %self.name, error = %stream_error, "error reading from stream");
    }

    async fn flush(&mut self, trigger: FlushTrigger) {
        let batch = self.accumulator.drain();
        let records = batch.len() as u64;
        let labels = [
            ("pipeline", self.name.clone()),
            ("trigger", trigger.as_str().to_string()),
        ];

        self.stats.flushes += 1;
        metrics::counter!(BATCH_FLUSHES, &labels).increment(1);
        metrics::gauge!(PENDING_RECORDS, &self.labels).set(0.0);

        let started = Instant::now();
        let result = self.sink.write_batch(batch).await;
        metrics::histogram!(FLUSH_DURATION_MS, &labels)
            .record(started.elapsed().as_millis() as f64);

        match result {
            Ok(()) => {
                self.stats.records_flushed += records;
                metrics::counter!(RECORDS_FLUSHED, &labels).increment(records);
                debug!(pipeline = %self.name, %trigger, records, "flushed batch");
            }
            Err(e) => {
                self.stats.sink_failures += 1;
                self.stats.records_lost += records;
                metrics::counter!(SINK_FAILURES, &labels).increment(1);
                metrics::counter!(RECORDS_LOST, &labels).increment(records);
                error!(
                    pipeline = %self.name,
                    %trigger,
                    records,
                    error = %e,
                    "failed to write batch, records dropped"
                );
            }
        }
    }
}

impl<D, S> Pipeline<D, S, <D::Record as Keyed>::Key, fn(&D::Record) -> <D::Record as Keyed>::Key>
where
    D: Decoder,
    D::Record: Keyed,
    S: Sink<D::Record>,
{
    /// Builds a pipeline that deduplicates on the record's natural key.
    pub fn keyed(name: impl Into<String>, config: PipelineConfig, decoder: D, sink: S) -> Self {
        Self::new(name, config, decoder, sink, <D::Record as Keyed>::key)
    }
}

impl<D, S, K, F> Pipeline<D, S, K, F>
where
    D: Decoder + 'static,
    D::Record: 'static,
    S: Sink<D::Record> + 'static,
    K: Eq + Hash + Debug + Send + 'static,
    F: Fn(&D::Record) -> K + Send + 'static,
{
    /// Subscribes to `source` and runs the pipeline on its own task.
    pub fn spawn<Src: StreamSource>(
        self,
        source: &Src,
        shutdown: CancellationToken,
    ) -> JoinHandle<PipelineStats> {
        let subscription = source.subscribe(shutdown.clone());
        tokio::spawn(self.run(subscription, shutdown))
    }
}
