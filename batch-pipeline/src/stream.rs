use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// One message read from an upstream stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub payload: Bytes,
    pub key: Option<Bytes>,
}

impl Message {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<Bytes>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// A transport-level failure reported by a stream source. These are reported
/// and never stop a pipeline.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("message without payload at partition {partition} offset {offset}")]
    EmptyMessage { partition: i32, offset: i64 },
}

impl StreamError {
    pub fn transport(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        StreamError::Transport(Box::new(error))
    }
}

/// The receiving ends of a subscription. The source closes both channels once
/// it observes cancellation.
pub struct Subscription {
    pub messages: mpsc::Receiver<Message>,
    pub errors: mpsc::Receiver<StreamError>,
}

/// Anything that can be subscribed to for a stream of messages and errors.
pub trait StreamSource {
    fn subscribe(&self, shutdown: CancellationToken) -> Subscription;
}

/// The producing ends of a subscription, for sources and tests.
#[derive(Clone)]
pub struct StreamSender {
    messages: mpsc::Sender<Message>,
    errors: mpsc::Sender<StreamError>,
}

impl StreamSender {
    /// Waits for room in the message channel.
    pub async fn send(&self, message: Message) -> Result<(), mpsc::error::SendError<Message>> {
        self.messages.send(message).await
    }

    /// Errors are never allowed to block the source. Returns false when the
    /// error was dropped because the channel was full or closed.
    pub fn report_error(&self, error: StreamError) -> bool {
        self.errors.try_send(error).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.messages.is_closed()
    }
}

pub fn channel(message_capacity: usize, error_capacity: usize) -> (StreamSender, Subscription) {
    let (message_tx, message_rx) = mpsc::channel(message_capacity);
    let (error_tx, error_rx) = mpsc::channel(error_capacity);

    (
        StreamSender {
            messages: message_tx,
            errors: error_tx,
        },
        Subscription {
            messages: message_rx,
            errors: error_rx,
        },
    )
}
