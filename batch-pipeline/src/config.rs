use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("batch size must be greater than zero")]
    ZeroBatchSize,
    #[error("flush interval must be greater than zero")]
    ZeroFlushInterval,
}

/// Flush thresholds for a single pipeline. Fixed for the lifetime of the
/// pipeline once it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    batch_size: usize,
    flush_interval: Duration,
}

impl PipelineConfig {
    pub fn new(batch_size: usize, flush_interval: Duration) -> Result<Self, ConfigError> {
        if batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if flush_interval.is_zero() {
            return Err(ConfigError::ZeroFlushInterval);
        }

        Ok(Self {
            batch_size,
            flush_interval,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }
}
