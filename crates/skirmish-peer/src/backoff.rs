use std::time::Duration;

/// Shortest wait before retrying the relay.
pub const MIN_RETRY_DELAY: Duration = Duration::from_millis(250);
/// Longest wait between retries.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Capped exponential retry delay.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    min: Duration,
    max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(MIN_RETRY_DELAY, MAX_RETRY_DELAY)
    }
}

impl Backoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            current: min,
            min,
            max: max.max(min),
        }
    }

    /// Delay for this attempt; the next one waits twice as long.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    /// Call after a successful connection.
    pub fn reset(&mut self) {
        self.current = self.min;
    }
}
