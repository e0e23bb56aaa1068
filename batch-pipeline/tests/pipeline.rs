use std::io;
use std::time::Duration;

use batch_pipeline::stream::channel;
use batch_pipeline::test_utils::RecordingSink;
use batch_pipeline::{
    JsonDecoder, Keyed, Message, Pipeline, PipelineConfig, PipelineStats, StreamError,
    StreamSender,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Stat {
    id: u32,
    value: i64,
}

impl Keyed for Stat {
    type Key = u32;

    fn key(&self) -> u32 {
        self.id
    }
}

fn message(id: u32, value: i64) -> Message {
    Message::new(serde_json::to_vec(&Stat { id, value }).unwrap())
}

struct Harness {
    tx: StreamSender,
    sink: RecordingSink<Stat>,
    shutdown: CancellationToken,
    handle: JoinHandle<PipelineStats>,
    started: Instant,
}

impl Harness {
    fn start(batch_size: usize, flush_interval: Duration) -> Self {
        Self::start_with(
            batch_size,
            flush_interval,
            RecordingSink::new(),
            CancellationToken::new(),
        )
    }

    fn start_with(
        batch_size: usize,
        flush_interval: Duration,
        sink: RecordingSink<Stat>,
        shutdown: CancellationToken,
    ) -> Self {
        let (tx, subscription) = channel(64, 8);
        let config = PipelineConfig::new(batch_size, flush_interval).unwrap();
        let pipeline = Pipeline::keyed("stats", config, JsonDecoder::<Stat>::new(), sink.clone());
        let started = Instant::now();
        let handle = tokio::spawn(pipeline.run(subscription, shutdown.clone()));

        Self {
            tx,
            sink,
            shutdown,
            handle,
            started,
        }
    }

    async fn send(&self, id: u32, value: i64) {
        self.tx.send(message(id, value)).await.unwrap();
    }

    async fn stop(self) -> (RecordingSink<Stat>, PipelineStats) {
        self.shutdown.cancel();
        let stats = self.handle.await.unwrap();
        (self.sink, stats)
    }
}

fn sorted(mut batch: Vec<Stat>) -> Vec<Stat> {
    batch.sort_by_key(|s| s.id);
    batch
}

#[tokio::test(start_paused = true)]
async fn duplicate_keys_collapse_into_one_size_flush() {
    let harness = Harness::start(3, Duration::from_secs(1));

    harness.send(1, 10).await;
    harness.send(2, 20).await;
    harness.send(1, 11).await;
    harness.send(3, 30).await;
    sleep(Duration::from_millis(50)).await;

    let batches = harness.sink.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(
        sorted(batches[0].clone()),
        vec![
            Stat { id: 1, value: 11 },
            Stat { id: 2, value: 20 },
            Stat { id: 3, value: 30 },
        ]
    );

    // The clock is paused, so a flush made as the third key arrived carries
    // the start time exactly.
    assert_eq!(harness.sink.call_times(), vec![harness.started]);

    let (sink, stats) = harness.stop().await;
    assert_eq!(sink.call_count(), 1);
    assert_eq!(stats.received, 4);
    assert_eq!(stats.superseded, 1);
    assert_eq!(stats.records_flushed, 3);
}

#[tokio::test(start_paused = true)]
async fn timer_flushes_partial_batch_once() {
    let harness = Harness::start(100, Duration::from_millis(200));

    harness.send(10, 1).await;
    harness.send(20, 2).await;
    sleep(Duration::from_millis(250)).await;

    let times = harness.sink.call_times();
    assert_eq!(times.len(), 1);
    let elapsed = times[0] - harness.started;
    assert!(elapsed >= Duration::from_millis(200), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(250), "{elapsed:?}");
    assert_eq!(harness.sink.batches()[0].len(), 2);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(harness.sink.call_count(), 1);

    let (_, stats) = harness.stop().await;
    assert_eq!(stats.flushes, 1);
}

#[tokio::test(start_paused = true)]
async fn malformed_payload_is_skipped() {
    let harness = Harness::start(100, Duration::from_millis(100));

    harness
        .tx
        .send(Message::new(&b"{not json"[..]))
        .await
        .unwrap();
    harness.send(5, 50).await;
    sleep(Duration::from_millis(150)).await;

    assert_eq!(harness.sink.batches(), vec![vec![Stat { id: 5, value: 50 }]]);

    let (_, stats) = harness.stop().await;
    assert_eq!(stats.received, 2);
    assert_eq!(stats.decode_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn records_around_a_malformed_payload_are_kept() {
    let harness = Harness::start(100, Duration::from_millis(100));

    harness.send(1, 10).await;
    harness
        .tx
        .send(Message::new(&b"\x00\x01garbage"[..]))
        .await
        .unwrap();
    harness.send(2, 20).await;
    sleep(Duration::from_millis(150)).await;

    let batches = harness.sink.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(
        sorted(batches[0].clone()),
        vec![Stat { id: 1, value: 10 }, Stat { id: 2, value: 20 }]
    );

    let (_, stats) = harness.stop().await;
    assert_eq!(stats.received, 3);
    assert_eq!(stats.decode_failures, 1);
    assert_eq!(stats.records_flushed, 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_drains_pending_records() {
    let harness = Harness::start(100, Duration::from_secs(10));

    harness.send(7, 70).await;
    sleep(Duration::from_millis(1)).await;
    assert_eq!(harness.sink.call_count(), 0);

    let (sink, stats) = harness.stop().await;
    assert_eq!(sink.batches(), vec![vec![Stat { id: 7, value: 70 }]]);
    assert_eq!(stats.flushes, 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_with_nothing_pending_skips_sink() {
    let harness = Harness::start(10, Duration::from_millis(100));
    sleep(Duration::from_millis(10)).await;

    let (sink, stats) = harness.stop().await;
    assert_eq!(sink.call_count(), 0);
    assert_eq!(stats, PipelineStats::default());
}

#[tokio::test(start_paused = true)]
async fn ticks_on_empty_batch_do_nothing() {
    let harness = Harness::start(10, Duration::from_millis(100));

    sleep(Duration::from_millis(550)).await;
    assert_eq!(harness.sink.call_count(), 0);

    harness.send(1, 1).await;
    sleep(Duration::from_millis(500)).await;
    assert_eq!(harness.sink.call_count(), 1);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn size_flush_leaves_remainder_for_shutdown() {
    let harness = Harness::start(3, Duration::from_secs(60));

    for id in 1..=5 {
        harness.send(id, 0).await;
    }
    sleep(Duration::from_millis(1)).await;
    assert_eq!(harness.sink.call_count(), 1);
    assert_eq!(harness.sink.batches()[0].len(), 3);

    let (sink, stats) = harness.stop().await;
    let batches = sink.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[1].len(), 2);
    assert_eq!(stats.records_flushed, 5);
}

#[tokio::test(start_paused = true)]
async fn no_key_appears_twice_in_a_batch() {
    let harness = Harness::start(4, Duration::from_secs(60));

    for value in 0..20 {
        harness.send((value % 6) as u32, value).await;
    }
    sleep(Duration::from_millis(1)).await;

    let (sink, stats) = harness.stop().await;
    for batch in sink.batches() {
        let mut ids: Vec<u32> = batch.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), batch.len());
    }
    assert_eq!(stats.received, 20);
}

#[tokio::test(start_paused = true)]
async fn failed_batch_is_dropped_and_pipeline_stops() {
    let sink = RecordingSink::new();
    sink.set_failing(true);
    let harness = Harness::start_with(100, Duration::from_secs(60), sink, CancellationToken::new());

    harness.send(1, 1).await;
    sleep(Duration::from_millis(1)).await;

    let (sink, stats) = harness.stop().await;
    assert_eq!(sink.call_count(), 1);
    assert_eq!(stats.sink_failures, 1);
    assert_eq!(stats.records_lost, 1);
    assert_eq!(stats.records_flushed, 0);
}

#[tokio::test(start_paused = true)]
async fn failing_sink_does_not_stop_consumption() {
    let sink = RecordingSink::new();
    sink.set_failing(true);
    let harness = Harness::start_with(1, Duration::from_secs(60), sink, CancellationToken::new());

    harness.send(1, 1).await;
    harness.send(2, 2).await;
    sleep(Duration::from_millis(1)).await;

    let (sink, stats) = harness.stop().await;
    assert_eq!(sink.call_count(), 2);
    assert_eq!(stats.sink_failures, 2);
}

#[tokio::test(start_paused = true)]
async fn nothing_is_read_after_cancellation() {
    let (tx, subscription) = channel(8, 1);
    tx.send(message(1, 1)).await.unwrap();
    tx.send(message(2, 2)).await.unwrap();

    let sink = RecordingSink::<Stat>::new();
    let config = PipelineConfig::new(1, Duration::from_millis(10)).unwrap();
    let pipeline = Pipeline::keyed("stats", config, JsonDecoder::<Stat>::new(), sink.clone());
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let stats = pipeline.run(subscription, shutdown).await;

    assert_eq!(stats.received, 0);
    assert_eq!(sink.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_sink_holds_back_the_next_batch() {
    let sink = RecordingSink::with_latency(Duration::from_millis(500));
    let harness = Harness::start_with(
        1,
        Duration::from_millis(100),
        sink,
        CancellationToken::new(),
    );

    harness.send(1, 1).await;
    harness.send(2, 2).await;
    sleep(Duration::from_millis(1200)).await;

    let times = harness.sink.call_times();
    assert_eq!(times.len(), 2);
    assert!(times[1] - times[0] >= Duration::from_millis(500));

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stream_errors_are_counted_and_ignored() {
    let harness = Harness::start(100, Duration::from_millis(100));

    assert!(harness
        .tx
        .report_error(StreamError::transport(io::Error::other("broker down"))));
    harness.send(3, 3).await;
    sleep(Duration::from_millis(150)).await;

    assert_eq!(harness.sink.call_count(), 1);

    let (_, stats) = harness.stop().await;
    assert_eq!(stats.stream_errors, 1);
}

#[tokio::test(start_paused = true)]
async fn closed_stream_still_flushes_on_timer() {
    let harness = Harness::start(100, Duration::from_millis(100));

    harness.send(4, 4).await;
    let Harness {
        tx,
        sink,
        shutdown,
        handle,
        ..
    } = harness;
    drop(tx);
    sleep(Duration::from_millis(150)).await;

    assert_eq!(sink.call_count(), 1);
    assert!(!handle.is_finished());

    shutdown.cancel();
    let stats = handle.await.unwrap();
    assert_eq!(stats.records_flushed, 1);
}
