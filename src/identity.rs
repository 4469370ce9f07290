// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Self-identity resolution and self-exclusion.
//!
//! A node must never open a replication channel to itself. The
//! [`SelfResolver`] seam produces the local node's own address set exactly
//! once, asynchronously, at `connect()` time; the result is cached in a
//! [`SelfExclusion`] set and consulted synchronously for every incoming Add.
//!
//! The crate ships [`ConfigResolver`], which reads the advertised addresses
//! from configuration. Deployments that learn their identity elsewhere (a
//! coordination service, instance metadata) implement the trait themselves:
//!
//! ```rust,no_run
//! use replication_topology::address::PeerAddress;
//! use replication_topology::identity::{BoxFuture, ResolveError, SelfResolver};
//!
//! struct MetadataResolver;
//!
//! impl SelfResolver for MetadataResolver {
//!     fn resolve(&self) -> BoxFuture<'_, Vec<PeerAddress>> {
//!         Box::pin(async move {
//!             let addr = "write-1.cluster.local:7021"
//!                 .parse::<PeerAddress>()
//!                 .map_err(|e| ResolveError(e.to_string()))?;
//!             Ok(vec![addr])
//!         })
//!     }
//! }
//! ```

use crate::address::PeerAddress;
use crate::config::NodeConfig;
use crate::error::Result;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

/// Result type for identity resolution.
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Type alias for boxed async futures (reduces trait signature complexity).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = ResolveResult<T>> + Send + 'a>>;

/// Simplified error for identity resolution.
#[derive(Debug, Clone)]
pub struct ResolveError(pub String);

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ResolveError {}

/// One-shot asynchronous resolution of the local node's own addresses.
///
/// `resolve()` is awaited once per manager lifetime. Liveness is the
/// resolver's problem: a resolver that never completes stalls `connect()`,
/// which callers bound with their own timeout if they need to.
pub trait SelfResolver: Send + Sync + 'static {
    /// Produce the set of addresses identifying the local node.
    fn resolve(&self) -> BoxFuture<'_, Vec<PeerAddress>>;
}

/// Resolver backed by the `node.advertise_addresses` config section.
///
/// Resolves immediately; a node configured with an empty list excludes
/// nothing, which is correct for single-interface test setups where the
/// discovery source already omits the local node.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    addresses: Vec<PeerAddress>,
}

impl ConfigResolver {
    pub fn new(addresses: Vec<PeerAddress>) -> Self {
        Self { addresses }
    }

    /// Parse the advertised addresses out of the node config.
    pub fn from_config(config: &NodeConfig) -> Result<Self> {
        Ok(Self::new(config.self_addresses()?))
    }
}

impl SelfResolver for ConfigResolver {
    fn resolve(&self) -> BoxFuture<'_, Vec<PeerAddress>> {
        let addresses = self.addresses.clone();
        Box::pin(async move { Ok(addresses) })
    }
}

/// Cached self-address set, tested synchronously per Add notification.
#[derive(Debug)]
pub struct SelfExclusion {
    addresses: HashSet<PeerAddress>,
}

impl SelfExclusion {
    pub fn new(addresses: Vec<PeerAddress>) -> Self {
        Self {
            addresses: addresses.into_iter().collect(),
        }
    }

    /// True if `addr` matches any resolved self address.
    pub fn is_self(&self, addr: &PeerAddress) -> bool {
        self.addresses.contains(addr)
    }

    /// Number of distinct self addresses.
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}
