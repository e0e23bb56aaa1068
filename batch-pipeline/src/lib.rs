//! Generic stream-to-store batching: decode messages, keep the latest record
//! per key, and hand batches to a sink on size, timer or shutdown.

pub mod accumulator;
pub mod config;
pub mod decoder;
pub mod metrics_consts;
pub mod pipeline;
pub mod sink;
pub mod stream;
pub mod test_utils;
pub mod trigger;

pub use accumulator::{BatchAccumulator, Keyed};
pub use config::{ConfigError, PipelineConfig};
pub use decoder::{DecodeError, Decoder, JsonDecoder};
pub use pipeline::{Pipeline, PipelineState, PipelineStats};
pub use sink::{PartialWriteError, PerRecord, RecordWriter, Sink};
pub use stream::{Message, StreamError, StreamSender, StreamSource, Subscription};
pub use trigger::{FlushPolicy, FlushTrigger};
