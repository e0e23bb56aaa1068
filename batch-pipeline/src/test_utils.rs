use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;

use crate::sink::Sink;

#[derive(Error, Debug)]
#[error("injected sink failure")]
pub struct InjectedFailure;

struct Inner<T> {
    calls: Mutex<Vec<(Instant, Vec<T>)>>,
    failing: AtomicBool,
    latency: Option<Duration>,
}

/// A sink that remembers every batch it was called with, and when. Clones
/// share the same recording, so a test can keep one while the pipeline owns
/// another.
pub struct RecordingSink<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RecordingSink<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for RecordingSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecordingSink<T> {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Every call sleeps for `latency` before returning.
    pub fn with_latency(latency: Duration) -> Self {
        Self::build(Some(latency))
    }

    fn build(latency: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Inner {
                calls: Mutex::new(Vec::new()),
                failing: AtomicBool::new(false),
                latency,
            }),
        }
    }

    /// Calls made while failing are still recorded.
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.inner.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.inner
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(at, _)| *at)
            .collect()
    }
}

impl<T: Clone> RecordingSink<T> {
    pub fn batches(&self) -> Vec<Vec<T>> {
        self.inner
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, batch)| batch.clone())
            .collect()
    }
}

#[async_trait]
impl<T> Sink<T> for RecordingSink<T>
where
    T: Send + 'static,
{
    type Error = InjectedFailure;

    async fn write_batch(&self, items: Vec<T>) -> Result<(), InjectedFailure> {
        self.inner
            .calls
            .lock()
            .unwrap()
            .push((Instant::now(), items));

        if let Some(latency) = self.inner.latency {
            tokio::time::sleep(latency).await;
        }

        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(InjectedFailure);
        }
        Ok(())
    }
}
