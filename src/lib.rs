//! # Replication Topology
//!
//! Peer-replication topology management for a service-registry write cluster.
//! The manager consumes the registry's own membership stream and keeps exactly
//! one replication channel open to every other write node.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                           replication-topology                           │
//! │                                                                          │
//! │  ┌──────────────────┐    ┌─────────────────────┐    ┌─────────────────┐  │
//! │  │ Membership deltas│───►│ Reconciliation loop │───►│ Channel per peer│  │
//! │  │ (Add / Delete)   │    │ (self-exclusion,    │    │ (autonomous     │  │
//! │  └──────────────────┘    │  owns the peer map) │    │  connect/retry) │  │
//! │                          └─────────────────────┘    └────────┬────────┘  │
//! │                                                              ▼           │
//! │                                             ┌─────────────────────────┐  │
//! │                                             │ PeerTransport (session  │  │
//! │                                             │ to each registry peer)  │  │
//! │                                             └─────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Connect**: resolve the local node's own addresses, then start the
//!    reconciliation loop
//! 2. **Reconcile**: every `Add` opens a channel (unless it names this node),
//!    every `Delete` closes one
//! 3. **Shutdown**: close every channel and drain the loop
//!
//! ## Usage
//!
//! ```rust,no_run
//! use replication_topology::{
//!     ChangeNotification, MembershipEvent, NoOpTransport, PeerAddress, TopologyConfig,
//!     TopologyManager,
//! };
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> replication_topology::Result<()> {
//!     let mut config = TopologyConfig::default();
//!     config.node.advertise_addresses = vec!["write-1.cluster.local:7021".into()];
//!
//!     let (events_tx, events_rx) = mpsc::channel(64);
//!     let mut manager =
//!         TopologyManager::with_transport(config, events_rx, Arc::new(NoOpTransport))?;
//!     manager.connect().await?;
//!
//!     // Deltas normally come from the registry's interest subscription
//!     let peer: PeerAddress = "write-2.cluster.local:7021".parse()?;
//!     events_tx
//!         .send(MembershipEvent::Changed(ChangeNotification::Add(peer)))
//!         .await
//!         .ok();
//!
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod address;
pub mod channel;
pub mod config;
pub mod error;
pub mod identity;
pub mod membership;
pub mod metrics;
pub mod reconciler;
pub mod resilience;
pub mod transport;

// Re-exports for convenience
pub use address::PeerAddress;
pub use channel::{
    ChannelFactory, ChannelState, ReplicationChannel, RetryingChannel, RetryingChannelFactory,
};
pub use config::{ChannelConfig, NodeConfig, ShutdownConfig, TopologyConfig};
pub use error::{Result, TopologyError};
pub use identity::{ConfigResolver, SelfExclusion, SelfResolver};
pub use membership::{ChangeNotification, MembershipEvent};
pub use reconciler::{TopologyManager, TopologyState};
pub use resilience::RetryConfig;
pub use transport::{NoOpTransport, PeerTransport, ReplicationSession};
