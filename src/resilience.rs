//! Reconnect backoff policy for replication channels.
//!
//! Every channel owns one [`RetryConfig`] and consults it between connect
//! attempts. There is no attempt cap: a channel keeps cycling
//! `Connecting -> Retrying` until its `close()` is called, so the policy only
//! shapes how fast those cycles happen, never whether they stop.

use std::time::Duration;

// =============================================================================
// Retry Configuration
// =============================================================================

/// Backoff configuration for channel reconnects.
///
/// # Default Backoff Schedule
///
/// With the default values (500ms initial, factor 2.0, 30s cap):
///
/// | Attempt | Delay |
/// |---------|-------|
/// | 1 | 500ms |
/// | 2 | 1s |
/// | 3 | 2s |
/// | 4 | 4s |
/// | 5 | 8s |
/// | 6 | 16s |
/// | 7+ | 30s (capped) |
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay before the first reconnect attempt.
    pub initial_delay: Duration,

    /// Upper bound on the computed delay.
    pub max_delay: Duration,

    /// Multiplier applied per failed attempt (>= 1.0 in sane configs).
    pub backoff_factor: f64,

    /// Budget for a single connect attempt; an attempt still pending after
    /// this long counts as failed.
    pub connect_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    /// Fast schedule for tests.
    ///
    /// | Attempt | Delay |
    /// |---------|-------|
    /// | 1 | 10ms |
    /// | 2 | 20ms |
    /// | 3 | 40ms |
    /// | 4+ | 50ms (capped) |
    pub fn testing() -> Self {
        Self {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            backoff_factor: 2.0,
            connect_timeout: Duration::from_millis(100), // Fast timeout for tests
        }
    }

    /// Calculate delay for a given attempt number (1-indexed).
    ///
    /// Channels retry indefinitely, so `attempt` grows without bound during a
    /// long outage; the computation saturates at `max_delay` instead of
    /// overflowing the f64 power.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return std::cmp::min(self.initial_delay, self.max_delay);
        }

        let exponent = std::cmp::min(attempt - 1, i32::MAX as usize) as i32;
        let multiplier = self.backoff_factor.powi(exponent);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;

        if !delay_secs.is_finite()
            || delay_secs < 0.0
            || delay_secs >= self.max_delay.as_secs_f64()
        {
            return self.max_delay;
        }

        std::cmp::min(Duration::from_secs_f64(delay_secs), self.max_delay)
    }
}
