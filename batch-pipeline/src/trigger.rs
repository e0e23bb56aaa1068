use std::fmt;

use crate::config::PipelineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlushTrigger {
    SizeThreshold,
    TimerTick,
    ShutdownDrain,
}

impl FlushTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlushTrigger::SizeThreshold => "size",
            FlushTrigger::TimerTick => "timer",
            FlushTrigger::ShutdownDrain => "shutdown",
        }
    }
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether the pending batch should be handed to the sink.
#[derive(Debug, Clone, Copy)]
pub struct FlushPolicy {
    batch_size: usize,
}

impl FlushPolicy {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            batch_size: config.batch_size(),
        }
    }

    pub fn after_add(&self, pending: usize) -> Option<FlushTrigger> {
        (pending >= self.batch_size).then_some(FlushTrigger::SizeThreshold)
    }

    // Ticks on an empty batch are no-ops.
    pub fn on_tick(&self, pending: usize) -> Option<FlushTrigger> {
        (pending > 0).then_some(FlushTrigger::TimerTick)
    }

    pub fn on_shutdown(&self, pending: usize) -> Option<FlushTrigger> {
        (pending > 0).then_some(FlushTrigger::ShutdownDrain)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn policy(batch_size: usize) -> FlushPolicy {
        FlushPolicy::new(&PipelineConfig::new(batch_size, Duration::from_secs(1)).unwrap())
    }

    #[test]
    fn size_threshold_fires_at_batch_size() {
        let policy = policy(3);
        assert_eq!(policy.after_add(2), None);
        assert_eq!(policy.after_add(3), Some(FlushTrigger::SizeThreshold));
    }

    #[test]
    fn batch_size_one_flushes_every_record() {
        assert_eq!(policy(1).after_add(1), Some(FlushTrigger::SizeThreshold));
    }

    #[test]
    fn empty_batch_never_flushes() {
        let policy = policy(3);
        assert_eq!(policy.on_tick(0), None);
        assert_eq!(policy.on_shutdown(0), None);
        assert_eq!(policy.on_tick(1), Some(FlushTrigger::TimerTick));
        assert_eq!(policy.on_shutdown(1), Some(FlushTrigger::ShutdownDrain));
    }
}
