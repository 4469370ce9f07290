//! Shared test utilities for integration and chaos tests.
//!
//! This module provides:
//! - Mock channels and a recording channel factory
//! - Mock transports with scripted connect behavior
//! - A polling helper for asserting on background-task effects

pub mod mocks;

pub use mocks::*;

use std::time::Duration;

/// Poll `check` until it returns true or `timeout` elapses.
///
/// The reconcile loop and channel tasks run in the background, so most
/// assertions are "eventually" assertions.
#[allow(dead_code)] // Not every test binary polls
pub async fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !check() {
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not reached within {:?}", timeout);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
