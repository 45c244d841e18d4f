use std::time::Duration;

/// Configuration for the dispatcher.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of jobs admitted into the queue at the same time.
    pub pool_size: usize,
    /// Pause between dispatch cycles.
    pub poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pool_size: 10,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl SchedulerConfig {
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size,
            ..Default::default()
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
