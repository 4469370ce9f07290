//! Fuzz target for retry backoff arithmetic.
//!
//! This tests that `delay_for_attempt` never panics and never exceeds the
//! configured maximum, even for hostile factors (NaN, negative, huge) and
//! arbitrary attempt numbers.

#![no_main]

use libfuzzer_sys::fuzz_target;
use replication_topology::resilience::RetryConfig;
use std::time::Duration;

fuzz_target!(|data: (u64, u64, f64, usize)| {
    let (initial_ms, max_ms, factor, attempt) = data;

    let config = RetryConfig {
        initial_delay: Duration::from_millis(initial_ms),
        max_delay: Duration::from_millis(max_ms),
        backoff_factor: factor,
        connect_timeout: Duration::from_secs(5),
    };

    // Should never panic
    let delay = config.delay_for_attempt(attempt);
    assert!(delay <= config.max_delay);
});
