use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::accumulator::Keyed;

/// Destination for flushed batches. A call either stores the whole batch or
/// fails as a unit; the pipeline does not retry failed batches.
#[async_trait]
pub trait Sink<T>: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn write_batch(&self, items: Vec<T>) -> Result<(), Self::Error>;
}

/// Writes a single record. Used for stores where one bad row must not take
/// down the rest of the batch.
#[async_trait]
pub trait RecordWriter<T>: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn write_record(&self, record: T) -> Result<(), Self::Error>;
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("{failed} of {total} records failed to write")]
pub struct PartialWriteError {
    pub failed: usize,
    pub total: usize,
}

/// Adapts a [`RecordWriter`] into a [`Sink`] by writing records one at a time.
/// Every record is attempted; the batch reports failure if any record failed.
pub struct PerRecord<W> {
    writer: W,
}

impl<W> PerRecord<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}

#[async_trait]
impl<T, W> Sink<T> for PerRecord<W>
where
    T: Keyed + Send + 'static,
    W: RecordWriter<T>,
{
    type Error = PartialWriteError;

    async fn write_batch(&self, items: Vec<T>) -> Result<(), PartialWriteError> {
        let total = items.len();
        let mut failed = 0;

        for record in items {
            let key = record.key();
            if let Err(e) = self.writer.write_record(record).await {
                failed += 1;
                warn!(key = ?key, error = %e, "failed to write record");
            }
        }

        if failed == 0 {
            Ok(())
        } else {
            Err(PartialWriteError { failed, total })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct Fixture {
        id: u32,
    }

    impl Keyed for Fixture {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }
    }

    #[derive(Error, Debug)]
    #[error("row rejected")]
    struct Rejected;

    #[derive(Default)]
    struct RejectOdd {
        written: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl RecordWriter<Fixture> for RejectOdd {
        type Error = Rejected;

        async fn write_record(&self, record: Fixture) -> Result<(), Rejected> {
            if record.id % 2 == 1 {
                return Err(Rejected);
            }
            self.written.lock().unwrap().push(record.id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn attempts_every_record() {
        let sink = PerRecord::new(RejectOdd::default());
        let batch = (1..=4).map(|id| Fixture { id }).collect();

        let err = sink.write_batch(batch).await.unwrap_err();

        assert_eq!(err, PartialWriteError { failed: 2, total: 4 });
        assert_eq!(*sink.writer().written.lock().unwrap(), vec![2, 4]);
    }

    #[tokio::test]
    async fn succeeds_when_all_records_written() {
        let sink = PerRecord::new(RejectOdd::default());
        let batch = vec![Fixture { id: 2 }, Fixture { id: 6 }];

        sink.write_batch(batch).await.unwrap();
        assert_eq!(sink.writer().written.lock().unwrap().len(), 2);
    }
}
