//! Metrics for observability.
//!
//! Exports Prometheus-compatible metrics for:
//! - Topology size (active channel count)
//! - Channel lifecycle (created/closed, connect outcomes, retries)
//! - Membership stream activity and anomalies
//! - Manager state
//!
//! # Metric Naming Convention
//!
//! All metrics are prefixed with `topology_` and follow Prometheus conventions:
//! - Counters end in `_total`
//! - Gauges represent current state
//!
//! Recording is fire-and-forget: a missing or failing recorder never affects
//! replication behavior.
//!
//! # Usage
//!
//! ```rust,no_run
//! use replication_topology::metrics;
//!
//! // In the reconciler after applying an Add
//! metrics::record_notification("add");
//! metrics::set_active_channels(3);
//! ```

use metrics::{counter, gauge};

/// Gauge for the number of channels currently tracked in the topology.
pub fn set_active_channels(count: usize) {
    gauge!("topology_active_channels").set(count as f64);
}

/// Record a channel being created for a peer.
pub fn record_channel_created(peer: &str) {
    counter!("topology_channels_created_total", "peer" => peer.to_string()).increment(1);
}

/// Record a channel finishing teardown.
pub fn record_channel_closed(peer: &str) {
    counter!("topology_channels_closed_total", "peer" => peer.to_string()).increment(1);
}

/// Record a connect attempt outcome for a peer.
pub fn record_connect(peer: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("topology_connects_total", "peer" => peer.to_string(), "status" => status).increment(1);
}

/// Record a channel scheduling a reconnect.
pub fn record_retry(peer: &str) {
    counter!("topology_retries_total", "peer" => peer.to_string()).increment(1);
}

/// Record a membership notification by kind ("add" / "delete").
pub fn record_notification(kind: &str) {
    counter!("topology_notifications_total", "kind" => kind.to_string()).increment(1);
}

/// Record an Add for an address that is already tracked.
pub fn record_duplicate_add(peer: &str) {
    counter!("topology_duplicate_adds_total", "peer" => peer.to_string()).increment(1);
}

/// Record an Add dropped because it matched a self address.
pub fn record_self_excluded() {
    counter!("topology_self_excluded_total").increment(1);
}

/// Record the membership stream terminating with an error.
pub fn record_stream_failure() {
    counter!("topology_stream_failures_total").increment(1);
}

/// Gauge for manager state.
pub fn set_manager_state(state: &str) {
    // Encode state as numeric for alerting (0=created, 2=running, etc.)
    let value = match state {
        "Created" => 0.0,
        "Resolving" => 1.0,
        "Running" => 2.0,
        "ShuttingDown" => 3.0,
        "Stopped" => 4.0,
        "Failed" => 5.0,
        _ => -1.0,
    };
    gauge!("topology_manager_state").set(value);
}
