// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Transport integration traits.
//!
//! The wire protocol a channel speaks to a remote peer is an external
//! collaborator's concern. This module defines the seam: a [`PeerTransport`]
//! dials one peer and yields a [`ReplicationSession`] whose `run()` future
//! lives as long as the connection. The retrying channel drives that future
//! and treats its completion, with or without an error, as a dropped
//! connection to re-establish.
//!
//! # Example
//!
//! ```rust,no_run
//! use replication_topology::address::PeerAddress;
//! use replication_topology::transport::{
//!     BoxFuture, PeerTransport, ReplicationSession, TransportError,
//! };
//!
//! struct TcpTransport;
//! struct TcpSession { /* framed connection, registry handle, ... */ }
//!
//! impl ReplicationSession for TcpSession {
//!     fn run(&mut self) -> BoxFuture<'_, ()> {
//!         Box::pin(async move {
//!             // Stream registry updates until the peer hangs up.
//!             Err(TransportError("connection reset".to_string()))
//!         })
//!     }
//! }
//!
//! impl PeerTransport for TcpTransport {
//!     fn connect(&self, addr: &PeerAddress) -> BoxFuture<'_, Box<dyn ReplicationSession>> {
//!         let addr = addr.clone();
//!         Box::pin(async move {
//!             let _ = addr;
//!             Ok(Box::new(TcpSession {}) as Box<dyn ReplicationSession>)
//!         })
//!     }
//! }
//! ```

use crate::address::PeerAddress;
use std::future::Future;
use std::pin::Pin;

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Type alias for boxed async futures (reduces trait signature complexity).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// Simplified error for transport operations.
#[derive(Debug, Clone)]
pub struct TransportError(pub String);

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TransportError {}

/// An established replication conversation with one peer.
pub trait ReplicationSession: Send {
    /// Drive the session until the connection ends.
    ///
    /// Resolving, with `Ok` or `Err`, means the connection is gone; the
    /// owning channel decides whether to reconnect.
    fn run(&mut self) -> BoxFuture<'_, ()>;
}

/// Dials peers on behalf of replication channels.
///
/// `connect` must be cancel-safe: the channel races it against its close
/// signal and a connect timeout, and drops the future when either fires.
pub trait PeerTransport: Send + Sync + 'static {
    fn connect(&self, addr: &PeerAddress) -> BoxFuture<'_, Box<dyn ReplicationSession>>;
}

/// A no-op implementation for testing/standalone mode.
///
/// Connects instantly; sessions idle until the channel cancels them.
#[derive(Clone)]
pub struct NoOpTransport;

struct NoOpSession;

impl ReplicationSession for NoOpSession {
    fn run(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(std::future::pending())
    }
}

impl PeerTransport for NoOpTransport {
    fn connect(&self, addr: &PeerAddress) -> BoxFuture<'_, Box<dyn ReplicationSession>> {
        tracing::debug!(peer = %addr, "NoOp: would connect");
        Box::pin(async move { Ok(Box::new(NoOpSession) as Box<dyn ReplicationSession>) })
    }
}
