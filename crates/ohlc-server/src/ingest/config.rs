//! Pipeline sizing

use serde::{Deserialize, Serialize};

use super::queue::DEFAULT_QUEUE_CAPACITY;

pub const DEFAULT_WORKER_COUNT: usize = 4;
pub const DEFAULT_BATCH_SIZE: usize = 5_000;

pub const MAX_WORKER_COUNT: usize = 256;
pub const MAX_BATCH_SIZE: usize = 100_000;
pub const MAX_QUEUE_CAPACITY: usize = 1_000_000;

/// Worker pool and queue dimensions for one ingestion run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Concurrent batch writers (default: 4)
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Records per sink call (default: 5000)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Records buffered between reader and workers (default: 10000)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_worker_count() -> usize {
    DEFAULT_WORKER_COUNT
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            batch_size: default_batch_size(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl PipelineConfig {
    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Reject sizes that would stall, never flush, or exhaust memory.
    pub fn validate(&self) -> Result<(), String> {
        check_range("worker count", self.worker_count, MAX_WORKER_COUNT)?;
        check_range("batch size", self.batch_size, MAX_BATCH_SIZE)?;
        check_range("queue capacity", self.queue_capacity, MAX_QUEUE_CAPACITY)
    }
}

fn check_range(name: &str, value: usize, max: usize) -> Result<(), String> {
    if value == 0 {
        return Err(format!("{name} must be greater than 0"));
    }
    if value > max {
        return Err(format!("{name} must be at most {max}, got {value}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.batch_size, 5_000);
        assert_eq!(config.queue_capacity, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        let base = PipelineConfig::default();
        assert!(base.with_workers(0).validate().is_err());
        assert!(base.with_batch_size(0).validate().is_err());
        assert!(base.with_queue_capacity(0).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_values() {
        let base = PipelineConfig::default();
        assert!(base.with_workers(MAX_WORKER_COUNT + 1).validate().is_err());
        assert!(base.with_batch_size(usize::MAX).validate().is_err());
        assert!(base.with_queue_capacity(usize::MAX).validate().is_err());

        let at_limits = base
            .with_workers(MAX_WORKER_COUNT)
            .with_batch_size(MAX_BATCH_SIZE)
            .with_queue_capacity(MAX_QUEUE_CAPACITY);
        assert!(at_limits.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"batch_size": 10}"#).unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.worker_count, DEFAULT_WORKER_COUNT);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }
}
