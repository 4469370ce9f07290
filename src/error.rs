// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error types for the topology manager.
//!
//! Only two failure classes ever surface to callers: the membership stream
//! terminating with an error, and self-identity resolution failing at
//! startup. Per-peer connection failures never appear here at all; they are
//! absorbed by the owning channel's retry loop and show up only as the
//! channel sitting in `Retrying`, plus metrics.
//!
//! # Error Categories
//!
//! | Error Type | Retryable | Description |
//! |------------|-----------|-------------|
//! | `Discovery` | No | Membership stream terminated with an error |
//! | `Identity` | Yes | Self-identity resolution failed at startup |
//! | `InvalidAddress` | No | Peer address string did not parse |
//! | `Config` | No | Configuration invalid |
//! | `InvalidState` | No | Manager state machine violation |
//!
//! # Retry Behavior
//!
//! Use [`TopologyError::is_retryable()`] to determine if an operation should
//! be retried. `Identity` is retryable because a transient resolver outage at
//! startup is recoverable by calling `connect()` again; `Discovery` is not,
//! because this manager instance can no longer know the true cluster
//! topology. Recovery from a discovery failure belongs to a supervising
//! layer, not to this crate.

use crate::identity::ResolveError;
use thiserror::Error;

/// Result type alias for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Errors that can occur while managing the replication topology.
///
/// Use [`is_retryable()`](Self::is_retryable) to check if the operation
/// should be retried.
#[derive(Error, Debug)]
pub enum TopologyError {
    /// The membership stream terminated with an error.
    ///
    /// Fatal for this manager instance: without discovery the true peer set
    /// is unknown, so all channels are torn down rather than kept against a
    /// stale view. Not retryable here.
    #[error("Membership stream failed: {reason}")]
    Discovery { reason: String },

    /// Self-identity resolution failed.
    ///
    /// Reported from `connect()`; no channels are created. Retryable, since
    /// the resolver may only be transiently unavailable.
    #[error("Self identity resolution failed: {0}")]
    Identity(#[from] ResolveError),

    /// A peer address string did not parse as `host:port`.
    ///
    /// Occurs when loading advertised addresses from configuration.
    /// Not retryable - fix the configuration and restart.
    #[error("Invalid peer address '{value}': {reason}")]
    InvalidAddress { value: String, reason: String },

    /// Invalid or missing configuration.
    ///
    /// Not retryable - fix the configuration and restart.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Manager state machine violation.
    ///
    /// Occurs when an operation is attempted in the wrong state
    /// (e.g., calling `connect()` on an already-running manager).
    /// Not retryable - indicates a bug in the caller.
    #[error("Invalid state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },
}

impl TopologyError {
    /// Create a discovery-stream failure.
    pub fn discovery(reason: impl Into<String>) -> Self {
        Self::Discovery {
            reason: reason.into(),
        }
    }

    /// Create an address parse error.
    pub fn invalid_address(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a state machine violation error.
    pub fn invalid_state(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::InvalidState {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Discovery { .. } => false, // Topology unknown, supervisor's problem
            Self::Identity(_) => true,       // Resolver may recover
            Self::InvalidAddress { .. } => false,
            Self::Config(_) => false,
            Self::InvalidState { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_retryable_discovery() {
        let err = TopologyError::discovery("subscription dropped");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("subscription dropped"));
    }

    #[test]
    fn test_is_retryable_identity() {
        let err = TopologyError::Identity(ResolveError("resolver unavailable".to_string()));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("resolver unavailable"));
    }

    #[test]
    fn test_identity_from_resolve_error() {
        let err: TopologyError = ResolveError("timed out".to_string()).into();
        assert!(matches!(err, TopologyError::Identity(_)));
    }

    #[test]
    fn test_not_retryable_invalid_address() {
        let err = TopologyError::invalid_address("host1", "expected host:port");
        assert!(!err.is_retryable());
        let msg = err.to_string();
        assert!(msg.contains("host1"));
        assert!(msg.contains("expected host:port"));
    }

    #[test]
    fn test_not_retryable_config() {
        let err = TopologyError::Config("empty advertise list".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_not_retryable_invalid_state() {
        let err = TopologyError::invalid_state("Created", "Running");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("Created"));
        assert!(err.to_string().contains("Running"));
    }

    #[test]
    fn test_discovery_error_formatting() {
        let err = TopologyError::discovery("stream reset by source");
        let msg = err.to_string();
        assert!(msg.contains("Membership stream failed"));
        assert!(msg.contains("stream reset by source"));
    }
}
