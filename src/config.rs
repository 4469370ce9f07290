//! Configuration for the topology manager.
//!
//! This module defines all configuration types needed to run the topology
//! manager. Configuration is passed to
//! [`TopologyManager::new()`](crate::TopologyManager::new) and can be
//! constructed programmatically or deserialized from YAML/JSON.
//!
//! # Quick Start
//!
//! ```rust
//! use replication_topology::config::TopologyConfig;
//!
//! let mut config = TopologyConfig::default();
//! config.node.advertise_addresses = vec!["write-1.cluster.local:7021".into()];
//! assert!(config.validate().is_ok());
//! ```
//!
//! # Configuration Structure
//!
//! ```text
//! TopologyConfig
//! ├── node: NodeConfig
//! │   └── advertise_addresses      # This node's own addresses (self-exclusion)
//! ├── channel: ChannelConfig       # Per-peer connect/retry behavior
//! └── shutdown: ShutdownConfig     # Drain timeout for graceful stop
//! ```
//!
//! # YAML Example
//!
//! ```yaml
//! node:
//!   advertise_addresses:
//!     - "write-1.cluster.local:7021"
//!     - "10.20.0.5:7021"
//!
//! channel:
//!   initial_delay: "500ms"
//!   max_delay: "30s"
//!   backoff_factor: 2.0
//!   connect_timeout: "5s"
//!
//! shutdown:
//!   drain_timeout: "10s"
//! ```

use crate::address::PeerAddress;
use crate::error::{Result, TopologyError};
use crate::resilience::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// Top-level config: passed to TopologyManager::new()
// ═══════════════════════════════════════════════════════════════════════════════

/// The top-level config object passed to `TopologyManager::new()`.
///
/// # Fields
///
/// - `node`: The local node's advertised addresses, used for self-exclusion.
/// - `channel`: Connect/retry tuning applied to every replication channel.
/// - `shutdown`: How long `shutdown()` waits for the reconciliation task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            channel: ChannelConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

impl TopologyConfig {
    /// Create a config with tight timings for tests.
    pub fn for_testing() -> Self {
        Self {
            node: NodeConfig::default(),
            channel: ChannelConfig::for_testing(),
            shutdown: ShutdownConfig {
                drain_timeout: "1s".to_string(),
            },
        }
    }

    /// Check the config for values the lenient accessors would otherwise
    /// paper over with defaults.
    pub fn validate(&self) -> Result<()> {
        if self.channel.backoff_factor < 1.0 {
            return Err(TopologyError::Config(format!(
                "channel.backoff_factor must be >= 1.0, got {}",
                self.channel.backoff_factor
            )));
        }
        for (field, value) in [
            ("channel.initial_delay", &self.channel.initial_delay),
            ("channel.max_delay", &self.channel.max_delay),
            ("channel.connect_timeout", &self.channel.connect_timeout),
            ("shutdown.drain_timeout", &self.shutdown.drain_timeout),
        ] {
            humantime::parse_duration(value)
                .map_err(|e| TopologyError::Config(format!("{}: {}", field, e)))?;
        }
        self.node.self_addresses()?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NodeConfig: the local node's own identity
// ═══════════════════════════════════════════════════════════════════════════════

/// The local node's advertised addresses.
///
/// These feed the default self-identity resolver: an incoming `Add` matching
/// any of them is dropped instead of opening a channel to ourselves. Multiple
/// entries cover nodes reachable on more than one interface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Addresses this node is known by, as `"host:port"` strings.
    #[serde(default)]
    pub advertise_addresses: Vec<String>,
}

impl NodeConfig {
    /// Parse the advertised addresses.
    pub fn self_addresses(&self) -> Result<Vec<PeerAddress>> {
        self.advertise_addresses
            .iter()
            .map(|s| s.parse::<PeerAddress>())
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ChannelConfig: per-peer connect and retry behavior
// ═══════════════════════════════════════════════════════════════════════════════

/// Connect/retry tuning applied to every replication channel.
///
/// Durations are humantime strings (`"500ms"`, `"30s"`). Channels retry
/// forever; there is deliberately no attempt cap here, since giving up on a
/// peer is only ever triggered by a membership `Delete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Delay before the first reconnect attempt.
    #[serde(default = "default_initial_delay")]
    pub initial_delay: String,

    /// Upper bound on the backoff delay.
    #[serde(default = "default_max_delay")]
    pub max_delay: String,

    /// Multiplier applied to the delay after each failed attempt.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// How long a single connect attempt may take before it counts as failed.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: String,
}

fn default_initial_delay() -> String {
    "500ms".to_string()
}

fn default_max_delay() -> String {
    "30s".to_string()
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_connect_timeout() -> String {
    "5s".to_string()
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_factor: default_backoff_factor(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl ChannelConfig {
    /// Tight timings for tests.
    pub fn for_testing() -> Self {
        Self {
            initial_delay: "10ms".to_string(),
            max_delay: "50ms".to_string(),
            backoff_factor: 2.0,
            connect_timeout: "100ms".to_string(),
        }
    }

    /// Parse `initial_delay`, falling back to the default on bad input.
    pub fn initial_delay_duration(&self) -> Duration {
        humantime::parse_duration(&self.initial_delay).unwrap_or(Duration::from_millis(500))
    }

    /// Parse `max_delay`, falling back to the default on bad input.
    pub fn max_delay_duration(&self) -> Duration {
        humantime::parse_duration(&self.max_delay).unwrap_or(Duration::from_secs(30))
    }

    /// Parse `connect_timeout`, falling back to the default on bad input.
    pub fn connect_timeout_duration(&self) -> Duration {
        humantime::parse_duration(&self.connect_timeout).unwrap_or(Duration::from_secs(5))
    }

    /// Convert into the runtime retry policy handed to each channel.
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            initial_delay: self.initial_delay_duration(),
            max_delay: self.max_delay_duration(),
            backoff_factor: self.backoff_factor,
            connect_timeout: self.connect_timeout_duration(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ShutdownConfig: graceful stop behavior
// ═══════════════════════════════════════════════════════════════════════════════

/// Graceful shutdown tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// How long `shutdown()` waits for the reconciliation task to exit
    /// before giving up with a warning.
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout: String,
}

fn default_drain_timeout() -> String {
    "10s".to_string()
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout: default_drain_timeout(),
        }
    }
}

impl ShutdownConfig {
    /// Parse `drain_timeout`, falling back to the default on bad input.
    pub fn drain_timeout_duration(&self) -> Duration {
        humantime::parse_duration(&self.drain_timeout).unwrap_or(Duration::from_secs(10))
    }
}
